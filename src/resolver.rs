// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Update request resolution
//!
//! Turns the query parameters and connection metadata of a `/nic/update`
//! request into a validated [`UpdateRequest`]:
//!
//! - `hostname` must appear exactly once, fall under the configured domain
//!   and not be the domain itself; it is normalized to a trailing dot
//! - `myip` / `myip6` are kept only if they are valid IPv4 / IPv6 literals;
//!   anything else is silently dropped
//! - when neither address survives, the address is taken from the first
//!   `X-Forwarded-For` entry, or else from the peer address of the connection

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::http::HeaderMap;
use thiserror::Error;
use tracing::debug;

/// Header consulted for the client address behind a proxy
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Longest hostname accepted, excluding the trailing dot
const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Reasons a request is rejected before any zone work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("missing or invalid hostname")]
    InvalidHostname,

    #[error("no valid ip address")]
    NoAddress,
}

/// A validated address update for one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Fully-qualified hostname with trailing dot
    pub hostname: String,
    pub ip4: Option<Ipv4Addr>,
    pub ip6: Option<Ipv6Addr>,
}

impl UpdateRequest {
    pub fn has_address(&self) -> bool {
        self.ip4.is_some() || self.ip6.is_some()
    }
}

/// Value of a query parameter that occurs exactly once
fn single<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    let mut values = params
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.as_str());

    match (values.next(), values.next()) {
        (Some(value), None) => Some(value),
        _ => None,
    }
}

fn valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate `candidate` against `domain` and return it with a trailing dot
///
/// The hostname must be a strict subdomain of `domain` on a label boundary,
/// so for domain `zig.zag` both `home.zig.zag` and `home.zig.zag.` are
/// accepted while `zig.zag` and `homezig.zag` are not.
pub fn normalize_hostname(candidate: &str, domain: &str) -> Option<String> {
    let host = candidate.trim().strip_suffix('.').unwrap_or(candidate.trim());
    let domain = domain.trim().trim_end_matches('.');

    if domain.is_empty() || host.len() > MAX_HOSTNAME_LEN {
        return None;
    }

    // labels are ASCII from here on, so byte offsets are char boundaries
    if !host.split('.').all(valid_label) {
        return None;
    }

    let prefix_len = host.len().checked_sub(domain.len() + 1)?;
    let (prefix, suffix) = host.split_at(prefix_len);
    if prefix.is_empty()
        || !suffix.starts_with('.')
        || !suffix[1..].eq_ignore_ascii_case(domain)
    {
        return None;
    }

    Some(format!("{}.", host))
}

/// Address of the client from request metadata
///
/// Uses the first `X-Forwarded-For` entry when the header carries one, the
/// connection's peer address otherwise. A blank header or a blank first entry
/// counts as absent. A forwarded entry carrying a port (`198.51.100.7:4711`,
/// `[2001:db8::1]:4711`) has the port stripped.
pub fn client_address(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = match headers.get(FORWARDED_FOR_HEADER) {
        Some(value) => Some(value.to_str().ok()?),
        None => None,
    };

    match forwarded.and_then(|value| value.split(',').next()).map(str::trim) {
        Some(first) if !first.is_empty() => first
            .parse::<IpAddr>()
            .or_else(|_| first.parse::<SocketAddr>().map(|addr| addr.ip()))
            .ok(),
        _ => remote.map(|addr| addr.ip()),
    }
}

/// Resolve an update request
///
/// # Errors
///
/// - [`ResolveError::InvalidHostname`] for a missing, repeated or foreign hostname
/// - [`ResolveError::NoAddress`] when no IPv4 or IPv6 address can be determined
pub fn resolve(
    params: &[(String, String)],
    headers: &HeaderMap,
    remote: Option<SocketAddr>,
    domain: &str,
) -> Result<UpdateRequest, ResolveError> {
    let hostname = single(params, "hostname")
        .and_then(|hostname| normalize_hostname(hostname, domain))
        .ok_or(ResolveError::InvalidHostname)?;

    let mut request = UpdateRequest {
        hostname,
        ip4: single(params, "myip").and_then(|ip| ip.trim().parse().ok()),
        ip6: single(params, "myip6").and_then(|ip| ip.trim().parse().ok()),
    };

    if !request.has_address() {
        debug!("no valid ip address found in URL parameters, falling back on request metadata");
        match client_address(headers, remote) {
            Some(IpAddr::V4(ip)) => request.ip4 = Some(ip),
            Some(IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
                Some(mapped) => request.ip4 = Some(mapped),
                None => request.ip6 = Some(ip),
            },
            None => return Err(ResolveError::NoAddress),
        }
    }

    Ok(request)
}
