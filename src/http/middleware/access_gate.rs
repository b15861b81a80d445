//! Access Gate Middleware.
//! Applies CORS headers for listed origins and admits only local peers.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{rejection::ExtensionRejection, ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{debug, warn};

use crate::observability::metrics;
use crate::security::{render_peer, AccessGate, GateState, Verdict};

pub async fn access_gate_middleware(
    State(gate): State<AccessGate>,
    conn: Result<ConnectInfo<SocketAddr>, ExtensionRejection>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // 1. Read the two inputs. A non-ASCII Origin is treated as absent.
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    // Without connection info there is no peer, and no peer is rejected.
    let peer = conn.ok().map(|ConnectInfo(addr)| render_peer(addr));

    // 2. Decide.
    let decision = gate.evaluate(origin, peer.as_deref());
    tracing::trace!(
        state = %GateState::CorsEvaluated,
        cors = decision.cors.is_some(),
        "Origin evaluated"
    );
    metrics::record_decision(decision.verdict, decision.cors.is_some());

    // 3. Forward or reject. CORS headers go on either response.
    let mut response = match decision.verdict {
        Verdict::Forward => {
            debug!(
                peer = peer.as_deref().unwrap_or("-"),
                origin = origin.unwrap_or("-"),
                cors = decision.cors.is_some(),
                state = %GateState::Forwarded,
                "Request admitted"
            );
            next.run(req).await
        }
        Verdict::Reject => {
            warn!(
                peer = peer.as_deref().unwrap_or("-"),
                origin = origin.unwrap_or("-"),
                cors = decision.cors.is_some(),
                state = %GateState::Rejected,
                "Non-local request rejected"
            );
            forbidden(gate.denial_message())
        }
    };

    if let Some(cors) = &decision.cors {
        cors.apply(response.headers_mut());
    }
    response
}

fn forbidden(message: &str) -> Response {
    let mut response = (StatusCode::FORBIDDEN, message.to_owned()).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Wrap `router` so the gate runs before every other layer and route.
///
/// Must be the last layer applied; anything layered afterwards would run
/// ahead of the gate.
pub fn gate_router(router: Router, gate: AccessGate) -> Router {
    router.layer(middleware::from_fn_with_state(gate, access_gate_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::connect_info::MockConnectInfo,
        http::header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        routing::any,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::security::{AllowedOrigins, LocalPeerAddresses};

    const LISTED: &str = "http://localhost:3000";

    fn gate() -> AccessGate {
        AccessGate::new(
            AllowedOrigins::parse("http://localhost:3000,http://localhost:4200"),
            LocalPeerAddresses::new("127.0.0.1", "0:0:0:0:0:0:0:1"),
            "Access denied",
        )
    }

    /// Router whose only route counts how often it is reached.
    fn app(hits: Arc<AtomicUsize>) -> Router {
        let downstream = Router::new().route(
            "/{*path}",
            any(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::OK, "config")
                }
            }),
        );
        gate_router(downstream, gate())
    }

    fn request(origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/app/default");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(peer: &str, origin: Option<&str>) -> (Response, usize) {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr: SocketAddr = peer.parse().unwrap();
        let response = app(hits.clone())
            .layer(MockConnectInfo(addr))
            .oneshot(request(origin))
            .await
            .unwrap();
        (response, hits.load(Ordering::SeqCst))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_no_cors(response: &Response) {
        for name in [
            ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
        ] {
            assert!(response.headers().get(&name).is_none(), "{} unexpectedly set", name);
        }
    }

    #[tokio::test]
    async fn test_listed_origin_from_localhost() {
        let (response, hits) = send("127.0.0.1:51000", Some(LISTED)).await;

        assert_eq!(hits, 1);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], LISTED);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET,POST,PUT,DELETE,OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(body_text(response).await, "config");
    }

    #[tokio::test]
    async fn test_no_origin_from_localhost() {
        let (response, hits) = send("127.0.0.1:51001", None).await;
        assert_eq!(hits, 1);
        assert_eq!(response.status(), StatusCode::OK);
        assert_no_cors(&response);
    }

    #[tokio::test]
    async fn test_unlisted_origin_from_localhost() {
        let (response, hits) = send("127.0.0.1:51002", Some("http://evil.example")).await;
        assert_eq!(hits, 1);
        assert_eq!(response.status(), StatusCode::OK);
        assert_no_cors(&response);
    }

    #[tokio::test]
    async fn test_listed_origin_from_remote_peer() {
        let (response, hits) = send("192.168.1.1:51003", Some(LISTED)).await;

        // Same request from loopback is admitted, so the address is the cause.
        let (local, local_hits) = send("127.0.0.1:51003", Some(LISTED)).await;
        assert_eq!(local.status(), StatusCode::OK);
        assert_eq!(local_hits, 1);

        assert_eq!(hits, 0);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], LISTED);
        assert_eq!(body_text(response).await, "Access denied");
    }

    #[tokio::test]
    async fn test_ipv6_loopback_forwarded() {
        for origin in [None, Some(LISTED), Some("http://evil.example")] {
            let (response, hits) = send("[::1]:51004", origin).await;
            assert_eq!(hits, 1);
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_remote_peer_without_origin() {
        let (response, hits) = send("10.1.2.3:51005", None).await;
        let (local, local_hits) = send("127.0.0.1:51005", None).await;
        assert_eq!(local.status(), StatusCode::OK);
        assert_eq!(local_hits, 1);

        assert_eq!(hits, 0);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_no_cors(&response);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_compressed_ipv6_literal_never_matches() {
        let gate = AccessGate::new(
            AllowedOrigins::parse(LISTED),
            LocalPeerAddresses::new("127.0.0.1", "::1"),
            "Access denied",
        );
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let downstream = Router::new().route(
            "/{*path}",
            any(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "config"
                }
            }),
        );
        let response = gate_router(downstream, gate)
            .layer(MockConnectInfo("[::1]:51008".parse::<SocketAddr>().unwrap()))
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_connect_info_rejected() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(hits.clone()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gate_headers_replace_downstream_cors() {
        let downstream = Router::new().route(
            "/{*path}",
            any(|| async { ([(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], "config") }),
        );
        let response = gate_router(downstream, gate())
            .layer(MockConnectInfo("127.0.0.1:51006".parse::<SocketAddr>().unwrap()))
            .oneshot(request(Some(LISTED)))
            .await
            .unwrap();

        let values: Vec<_> = response
            .headers()
            .get_all(ACCESS_CONTROL_ALLOW_ORIGIN)
            .iter()
            .collect();
        assert_eq!(values, vec![LISTED]);
    }
}
