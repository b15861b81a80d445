//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.
//!
//! The `[app]` table mirrors the dotted property names used by the
//! configuration service this gate fronts, so that
//! `allowed.origins = "..."` inside `[app]` lands in
//! [`AppConfig::allowed`].

use serde::{Deserialize, Serialize};

/// Root configuration for the access gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The configuration service admitted requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Access policy: allowed origins, localhost addresses, denial message.
    pub app: AppConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
        }
    }
}

/// Downstream configuration service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, scheme and authority only (e.g., "http://127.0.0.1:8889").
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8889".to_string(),
        }
    }
}

/// The `[app]` table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub allowed: AllowedConfig,
    pub security: SecurityConfig,
}

/// `app.allowed.*`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AllowedConfig {
    /// Comma-separated list of exact origin strings.
    pub origins: String,
}

/// `app.security.*`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    pub localhost: LocalhostConfig,
    pub error: ErrorConfig,
}

/// `app.security.localhost.*`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalhostConfig {
    /// Accepted IPv4 loopback literal.
    pub ipv4: String,

    /// Accepted IPv6 loopback literal, compared verbatim.
    pub ipv6: String,
}

impl Default for LocalhostConfig {
    fn default() -> Self {
        Self {
            ipv4: "127.0.0.1".to_string(),
            ipv6: "0:0:0:0:0:0:0:1".to_string(),
        }
    }
}

/// `app.security.error.*`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Body of every 403 the gate produces.
    pub message: String,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            message: "Only local requests are allowed".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for an admitted request/response in seconds.
    pub request_secs: u64,

    /// Time allowed for the upstream exchange in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
