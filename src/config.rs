//! # Configuration Management
//!
//! Server and gate settings, loaded from environment variables
//! ("12-factor app" style).
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `DATABASE_URL`: SQLite session store (default: sqlite:sessions.db?mode=rwc)
//! - `COOKIE_SECURE`: Send the session cookie over HTTPS only (default: true)
//! - `LOGIN_PATH`: Where anonymous users are sent (default: /login)
//! - `SET_RETURN_TO`: Remember the requested path before that (default: true)
//! - `LOGGED_IN_REDIRECT`: Where signed-in users leave login pages for (default: /)
//! - `TENANT_SOURCE`: `host`, `fixed` or `none` (default: host)
//! - `SUBDOMAIN`: The tenant label when `TENANT_SOURCE=fixed`
//! - `TRUST_FORWARDED_HOST`: Read the hostname from `X-Forwarded-Host` (default: false)
//! - `TENANT_DENIAL`: `redirect` or `forbidden` (default: redirect)
//! - `TENANT_DENIAL_REDIRECT`: Target of a `redirect` denial (default: /)

use crate::middleware::ensure_logged_in::{Denial, EnsureLoggedInConfig, DEFAULT_LOGIN_PATH};
use crate::middleware::ensure_logged_out::{EnsureLoggedOutConfig, DEFAULT_HOME_PATH};
use crate::tenant::{FixedTenant, HostSubdomain};
use anyhow::{bail, Context, Result};
use std::env;

/// Where the expected tenant of a request comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantSource {
    /// First label of the request hostname
    Host,
    /// One tenant for the whole deployment
    Fixed(String),
    /// No membership check
    Disabled,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite connection URL for the session store
    /// The "mode=rwc" suffix means: read, write, create if missing
    pub database_url: String,

    /// Secure flag on the session cookie; turn off for plain-HTTP development
    pub cookie_secure: bool,

    pub login_path: String,
    pub set_return_to: bool,
    pub logged_in_redirect: String,
    pub tenant_source: TenantSource,
    pub trust_forwarded_host: bool,
    pub denial: Denial,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite:sessions.db?mode=rwc".to_string(),
            cookie_secure: true,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            set_return_to: true,
            logged_in_redirect: DEFAULT_HOME_PATH.to_string(),
            tenant_source: TenantSource::Host,
            trust_forwarded_host: false,
            denial: Denial::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// A `.env` file is read first when present.
    ///
    /// ## Example .env file
    /// ```text
    /// PORT=8080
    /// COOKIE_SECURE=false
    /// TENANT_SOURCE=fixed
    /// SUBDOMAIN=oak
    /// TENANT_DENIAL=forbidden
    /// ```
    pub fn from_env() -> Result<Self> {
        // missing .env is fine
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?,
            None => defaults.port,
        };

        let tenant_source = match lookup("TENANT_SOURCE").as_deref().map(str::trim) {
            None | Some("host") => TenantSource::Host,
            Some("none") => TenantSource::Disabled,
            Some("fixed") => match lookup("SUBDOMAIN").filter(|s| !s.trim().is_empty()) {
                Some(label) => TenantSource::Fixed(label.trim().to_string()),
                None => bail!("TENANT_SOURCE=fixed requires SUBDOMAIN"),
            },
            Some(other) => bail!("TENANT_SOURCE must be host, fixed or none, got '{other}'"),
        };

        let denial = match lookup("TENANT_DENIAL").as_deref().map(str::trim) {
            None | Some("redirect") => {
                Denial::Redirect(string("TENANT_DENIAL_REDIRECT", "/".to_string()))
            }
            Some("forbidden") => Denial::Forbidden,
            Some(other) => bail!("TENANT_DENIAL must be redirect or forbidden, got '{other}'"),
        };

        Ok(Config {
            host: string("HOST", defaults.host),
            port,
            database_url: string("DATABASE_URL", defaults.database_url),
            cookie_secure: flag(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
            login_path: string("LOGIN_PATH", defaults.login_path),
            set_return_to: flag(&lookup, "SET_RETURN_TO", defaults.set_return_to)?,
            logged_in_redirect: string("LOGGED_IN_REDIRECT", defaults.logged_in_redirect),
            tenant_source,
            trust_forwarded_host: flag(
                &lookup,
                "TRUST_FORWARDED_HOST",
                defaults.trust_forwarded_host,
            )?,
            denial,
        })
    }

    /// Get the socket address to bind the server to, e.g. "127.0.0.1:8080"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Access gate settings for protected routes
    pub fn access_gate(&self) -> EnsureLoggedInConfig {
        let config = EnsureLoggedInConfig::new()
            .redirect_to(self.login_path.clone())
            .set_return_to(self.set_return_to)
            .denial(self.denial.clone());

        match &self.tenant_source {
            TenantSource::Host => config
                .tenant(HostSubdomain::new().trust_forwarded_host(self.trust_forwarded_host)),
            TenantSource::Fixed(label) => config.tenant(FixedTenant::new(label.clone())),
            TenantSource::Disabled => config,
        }
    }

    /// Logged-out gate settings for login routes
    pub fn logout_gate(&self) -> EnsureLoggedOutConfig {
        EnsureLoggedOutConfig::new().redirect_to(self.logged_in_redirect.clone())
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be a boolean, got '{value}'"),
    }
}
