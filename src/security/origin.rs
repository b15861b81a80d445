//! Origin matching and CORS header injection.
//!
//! The policy is origin reflection: a request whose `Origin` is listed gets
//! that exact value echoed in `Access-Control-Allow-Origin`, never `*`,
//! because credentials are allowed. Anything else gets no CORS headers at
//! all and is otherwise left alone.

use std::collections::HashSet;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue};

/// Separator of the `allowed.origins` setting.
pub const ORIGINS_DELIMITER: char = ',';

pub const CORS_METHODS_VALUE: &str = "GET,POST,PUT,DELETE,OPTIONS";
pub const CORS_HEADERS_VALUE: &str = "*";
pub const CORS_CREDENTIALS_VALUE: &str = "true";

/// Immutable set of origins that receive CORS headers.
///
/// Membership is exact, case-sensitive string equality. No trimming,
/// wildcard or scheme/host normalization is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: HashSet<String>,
}

impl AllowedOrigins {
    /// Build the set from the comma-separated setting. Empty segments are dropped.
    pub fn parse(raw: &str) -> Self {
        let origins = raw
            .split(ORIGINS_DELIMITER)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { origins }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Decide whether a request with this `Origin` gets CORS headers.
    pub fn match_origin(&self, origin: Option<&str>) -> Option<CorsHeaders> {
        let origin = origin?;
        if !self.contains(origin) {
            return None;
        }
        // Listed origins came from config and may not be valid header bytes.
        let allow_origin = HeaderValue::from_str(origin).ok()?;
        Some(CorsHeaders { allow_origin })
    }
}

/// The four response headers granted to a listed origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
}

impl CorsHeaders {
    /// The echoed origin.
    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    /// Set all four headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_METHODS_VALUE),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_HEADERS_VALUE),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static(CORS_CREDENTIALS_VALUE),
        );
    }
}
