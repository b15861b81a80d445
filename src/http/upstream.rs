//! Forwarding of admitted requests to the configuration service.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream authority
//! - Stream method, headers and body through unchanged, except `Host`
//! - Map upstream failures to 502 and upstream timeouts to 504

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {0:?}")]
    InvalidUrl(String),
}

/// Shared state of the forwarding handler.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout: Duration,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let invalid = || UpstreamError::InvalidUrl(config.url.clone());
        let url = Url::parse(&config.url).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|_| invalid())?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            authority,
            timeout,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Target URI for an inbound request URI.
    fn target(&self, uri: &Uri) -> Uri {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        parts.path_and_query = Some(path_and_query);
        Uri::from_parts(parts).unwrap_or_else(|_| uri.clone())
    }
}

/// Catch-all handler: every admitted request goes to the configuration service.
pub async fn forward_handler(State(upstream): State<Upstream>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (mut parts, body) = request.into_parts();
    parts.uri = upstream.target(&parts.uri);
    parts.headers.remove(header::HOST);
    let outbound = Request::from_parts(parts, body);

    tracing::debug!(method = %method, path = %path, upstream = %upstream.authority, "Forwarding request");

    match tokio::time::timeout(upstream.timeout, upstream.client.request(outbound)).await {
        Ok(Ok(response)) => {
            metrics::record_upstream(response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream error");
            metrics::record_upstream_error("request");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
        Err(_) => {
            tracing::error!(method = %method, path = %path, timeout = ?upstream.timeout, "Upstream timed out");
            metrics::record_upstream_error("timeout");
            (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out").into_response()
        }
    }
}
