//! The access gate: origin matching followed by peer authentication.
//!
//! # Lifecycle of a request
//! ```text
//! Received → CorsEvaluated → Forwarded | Rejected
//! ```
//! Every request is evaluated exactly once. The decision depends only on
//! the immutable policy and the request's own `Origin` and peer address.

use std::fmt;
use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::config::schema::AppConfig;
use crate::security::origin::{AllowedOrigins, CorsHeaders};
use crate::security::peer::LocalPeerAddresses;

/// Where a request is in the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Received,
    CorsEvaluated,
    Forwarded,
    Rejected,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateState::Received => "received",
            GateState::CorsEvaluated => "cors_evaluated",
            GateState::Forwarded => "forwarded",
            GateState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Outcome of peer authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Reject,
}

impl Verdict {
    /// Terminal gate state for this verdict.
    pub fn state(self) -> GateState {
        match self {
            Verdict::Forward => GateState::Forwarded,
            Verdict::Reject => GateState::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Forward => "forward",
            Verdict::Reject => "reject",
        }
    }
}

/// Everything the gate decided about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Headers to put on the response, whatever the verdict.
    pub cors: Option<CorsHeaders>,
    pub verdict: Verdict,
}

#[derive(Debug)]
struct Policy {
    origins: AllowedOrigins,
    localhost: LocalPeerAddresses,
    denial_message: String,
}

/// Immutable access policy shared by all in-flight requests.
///
/// Cloning is cheap; clones share the same policy.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: Arc<Policy>,
}

impl AccessGate {
    pub fn new(
        origins: AllowedOrigins,
        localhost: LocalPeerAddresses,
        denial_message: impl Into<String>,
    ) -> Self {
        Self {
            policy: Arc::new(Policy {
                origins,
                localhost,
                denial_message: denial_message.into(),
            }),
        }
    }

    /// Build the gate from the `[app]` table.
    pub fn from_config(app: &AppConfig) -> Self {
        let SecurityConfig { localhost, error } = &app.security;
        Self::new(
            AllowedOrigins::parse(&app.allowed.origins),
            LocalPeerAddresses::new(localhost.ipv4.clone(), localhost.ipv6.clone()),
            error.message.clone(),
        )
    }

    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.policy.origins
    }

    pub fn localhost(&self) -> &LocalPeerAddresses {
        &self.policy.localhost
    }

    /// Body of every rejection.
    pub fn denial_message(&self) -> &str {
        &self.policy.denial_message
    }

    /// Decide CORS headers and admission for one request.
    ///
    /// Origin matching always runs first and never short-circuits; a
    /// request can be granted CORS headers and still be rejected.
    pub fn evaluate(&self, origin: Option<&str>, peer: Option<&str>) -> GateDecision {
        let cors = self.policy.origins.match_origin(origin);

        let verdict = if self.policy.localhost.is_local(peer) {
            Verdict::Forward
        } else {
            Verdict::Reject
        };

        GateDecision { cors, verdict }
    }
}
