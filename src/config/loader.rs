//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values, applied in this order.
pub const ENV_ALLOWED_ORIGINS: &str = "APP_ALLOWED_ORIGINS";
pub const ENV_LOCALHOST_IPV4: &str = "APP_SECURITY_LOCALHOST_IPV4";
pub const ENV_LOCALHOST_IPV6: &str = "APP_SECURITY_LOCALHOST_IPV6";
pub const ENV_ERROR_MESSAGE: &str = "APP_SECURITY_ERROR_MESSAGE";
pub const ENV_BIND: &str = "CONFIG_GATE_BIND";
pub const ENV_UPSTREAM: &str = "CONFIG_GATE_UPSTREAM";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated configuration plus the environment keys that changed it.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: GateConfig,
    /// Reported by the caller once logging is up.
    pub overridden: Vec<&'static str>,
}

/// Load, override from the process environment and `bind`, and validate.
///
/// Without a path the built-in defaults are the starting point, so a gate can
/// be configured purely through environment variables. `bind` (the command
/// line) wins over both file and environment.
pub fn load_config(path: Option<&Path>, bind: Option<String>) -> Result<LoadedConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => GateConfig::default(),
    };
    finalize(config, |key| std::env::var(key).ok(), bind)
}

/// Apply overrides in precedence order, then validate the result.
pub fn finalize<F>(
    mut config: GateConfig,
    lookup: F,
    bind: Option<String>,
) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let overridden = apply_overrides(&mut config, lookup);
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(LoadedConfig { config, overridden })
}

fn parse_file(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment-style overrides through `lookup`, returning the keys used.
pub fn apply_overrides<F>(config: &mut GateConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let security = &mut config.app.security;
    let targets: [(&'static str, &mut String); 6] = [
        (ENV_ALLOWED_ORIGINS, &mut config.app.allowed.origins),
        (ENV_LOCALHOST_IPV4, &mut security.localhost.ipv4),
        (ENV_LOCALHOST_IPV6, &mut security.localhost.ipv6),
        (ENV_ERROR_MESSAGE, &mut security.error.message),
        (ENV_BIND, &mut config.listener.bind_address),
        (ENV_UPSTREAM, &mut config.upstream.url),
    ];

    let mut overridden = Vec::new();
    for (key, slot) in targets {
        if let Some(value) = lookup(key) {
            *slot = value;
            overridden.push(key);
        }
    }
    overridden
}
