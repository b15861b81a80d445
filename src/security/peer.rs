//! Peer authentication against the configured loopback literals.

use std::fmt::Write;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// The two accepted peer address strings.
///
/// Comparison is verbatim: `::1` and `0:0:0:0:0:0:0:1` are different
/// values here, and nothing is resolved or range-matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPeerAddresses {
    ipv4: String,
    ipv6: String,
}

impl LocalPeerAddresses {
    pub fn new(ipv4: impl Into<String>, ipv6: impl Into<String>) -> Self {
        Self {
            ipv4: ipv4.into(),
            ipv6: ipv6.into(),
        }
    }

    pub fn ipv4(&self) -> &str {
        &self.ipv4
    }

    pub fn ipv6(&self) -> &str {
        &self.ipv6
    }

    /// True iff `peer` equals one of the two configured strings.
    /// An absent or empty peer never matches.
    pub fn is_local(&self, peer: Option<&str>) -> bool {
        match peer {
            Some(peer) if !peer.is_empty() => peer == self.ipv4 || peer == self.ipv6,
            _ => false,
        }
    }
}

/// Render a connection's remote address the way servlet containers report it.
///
/// IPv4 is dotted-quad. IPv6 is eight lowercase hex groups without leading
/// zeros and without `::` compression, so loopback is `0:0:0:0:0:0:0:1`.
/// IPv4-mapped IPv6 peers (dual-stack listeners) render as IPv4.
pub fn render_peer(addr: SocketAddr) -> String {
    match addr.ip().to_canonical() {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => render_ipv6_full(&v6),
    }
}

fn render_ipv6_full(addr: &Ipv6Addr) -> String {
    let mut out = String::with_capacity(39);
    for (i, segment) in addr.segments().iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{:x}", segment);
    }
    out
}
