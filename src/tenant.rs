//! # Tenant Resolution
//!
//! Strategies that answer "which tenant is this request for?".
//!
//! The access gate asks a [`TenantResolver`] for the expected tenant label
//! and then checks it against the principal's tenant labels. Two strategies
//! ship with the crate:
//!
//! - [`HostSubdomain`]: `oak.example.com` resolves to `oak`
//! - [`FixedTenant`]: one label for the whole deployment
//!
//! Any `Fn(&Parts) -> Option<String>` closure is also a resolver.

use axum::http::{header::HOST, request::Parts};
use std::fmt;

const FORWARDED_HOST: &str = "x-forwarded-host";

/// Derives the expected tenant label for a request
pub trait TenantResolver: Send + Sync {
    /// Returns `None` when no tenant can be derived, which the gate treats
    /// as a denial.
    fn resolve(&self, parts: &Parts) -> Option<String>;
}

impl<F> TenantResolver for F
where
    F: Fn(&Parts) -> Option<String> + Send + Sync,
{
    fn resolve(&self, parts: &Parts) -> Option<String> {
        self(parts)
    }
}

/// Tenant taken from the first label of the request hostname
///
/// The hostname is lower-cased, a leading `www.` is dropped, and the port
/// is ignored: `WWW.Oak.Example.com:8443` resolves to `oak`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSubdomain {
    trust_forwarded_host: bool,
}

impl HostSubdomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer `X-Forwarded-Host` over `Host`. Only enable this behind a
    /// proxy that sets the header itself.
    pub fn trust_forwarded_host(mut self, trust: bool) -> Self {
        self.trust_forwarded_host = trust;
        self
    }

    fn hostname<'a>(&self, parts: &'a Parts) -> Option<&'a str> {
        let forwarded = if self.trust_forwarded_host {
            parts
                .headers
                .get(FORWARDED_HOST)
                .and_then(|value| value.to_str().ok())
                // a proxy chain appends hosts; the client's is first
                .and_then(|value| value.split(',').next())
                .and_then(non_empty)
        } else {
            None
        };

        forwarded
            .or_else(|| {
                parts
                    .headers
                    .get(HOST)
                    .and_then(|value| value.to_str().ok())
                    .and_then(non_empty)
            })
            .or_else(|| parts.uri.host().and_then(non_empty))
    }
}

impl TenantResolver for HostSubdomain {
    fn resolve(&self, parts: &Parts) -> Option<String> {
        self.hostname(parts).and_then(subdomain_of)
    }
}

/// Tenant fixed at construction time, e.g. one deployment per tenant
#[derive(Clone, PartialEq, Eq)]
pub struct FixedTenant(String);

impl FixedTenant {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FixedTenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FixedTenant").field(&self.0).finish()
    }
}

impl TenantResolver for FixedTenant {
    fn resolve(&self, _parts: &Parts) -> Option<String> {
        Some(self.0.clone())
    }
}

/// First dot-delimited label of a host, lower-cased, ignoring `www.` and port
///
/// The host is lower-cased before `www.` is stripped, so an upper-case
/// `WWW.` prefix is dropped too: `WWW.Oak.example.com` resolves to `oak`,
/// not `www`.
///
/// ```
/// use ensure_login::tenant::subdomain_of;
///
/// assert_eq!(subdomain_of("Oak.ABCSalesTracking.com"), Some("oak".to_string()));
/// assert_eq!(subdomain_of("www.pine.example.com:8080"), Some("pine".to_string()));
/// ```
pub fn subdomain_of(host: &str) -> Option<String> {
    let host = strip_port(host.trim()).to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_owned)
}

fn non_empty(host: &str) -> Option<&str> {
    Some(host.trim()).filter(|host| !host.is_empty())
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
