//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject an access policy the gate cannot enforce meaningfully
//! - Validate addresses, the upstream URL and timeout ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GateConfig;
use crate::security::origin::AllowedOrigins;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("app.allowed.origins lists no origins")]
    NoAllowedOrigins,

    #[error("app.security.localhost.{0} is empty")]
    EmptyLocalhost(&'static str),

    #[error("app.security.error.message is empty")]
    EmptyDenialMessage,

    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url {value:?} is invalid: {reason}")]
    InvalidUpstream { value: String, reason: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.upstream_secs ({upstream}) must be less than timeouts.request_secs ({request})")]
    UpstreamTimeoutTooLong { upstream: u64, request: u64 },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if AllowedOrigins::parse(&config.app.allowed.origins).is_empty() {
        errors.push(ValidationError::NoAllowedOrigins);
    }

    let localhost = &config.app.security.localhost;
    if localhost.ipv4.is_empty() {
        errors.push(ValidationError::EmptyLocalhost("ipv4"));
    }
    if localhost.ipv6.is_empty() {
        errors.push(ValidationError::EmptyLocalhost("ipv6"));
    }

    if config.app.security.error.message.is_empty() {
        errors.push(ValidationError::EmptyDenialMessage);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Err(reason) = check_upstream(&config.upstream.url) {
        errors.push(ValidationError::InvalidUpstream {
            value: config.upstream.url.clone(),
            reason,
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    // Otherwise the request timeout answers 408 before the upstream 504 can.
    let timeouts = &config.timeouts;
    if timeouts.upstream_secs > 0 && timeouts.upstream_secs >= timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeoutTooLong {
            upstream: timeouts.upstream_secs,
            request: timeouts.request_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The upstream must be a plain `http://host[:port]` base.
fn check_upstream(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() {
        return Err("must not carry a path or query".to_string());
    }
    Ok(())
}
