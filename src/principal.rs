//! # Principal and Authentication State
//!
//! The identity types the gates read from each request.
//!
//! - [`Principal`]: the signed-in user, with the tenant labels they may access
//! - [`AuthState`]: the per-request authentication capability, placed in
//!   request extensions by the identity layer
//!
//! Neither gate ever mutates these values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An authenticated user
///
/// Stored in the session as JSON. Older session payloads name the tenant
/// collection `company` or `companies`; both are accepted when reading.
///
/// ## Example JSON
/// ```json
/// {
///   "username": "alice",
///   "tenants": ["oak", "pine"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identifier used in logs
    pub username: String,

    /// Tenant (subdomain) labels this user may access
    ///
    /// A missing or malformed collection deserializes as empty, which
    /// means the user belongs to no tenant.
    #[serde(
        default,
        alias = "company",
        alias = "companies",
        deserialize_with = "lenient_labels"
    )]
    pub tenants: Vec<String>,
}

impl Principal {
    pub fn new<I, S>(username: impl Into<String>, tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            tenants: tenants.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive tenant membership test
    pub fn is_member_of(&self, tenant: &str) -> bool {
        let wanted = tenant.to_lowercase();
        self.tenants
            .iter()
            .map(|label| label.to_lowercase())
            .any(|label| label == wanted)
    }
}

/// Accept only a JSON array of strings; anything else is an empty collection.
fn lenient_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(label) => Some(label),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(labels)
}

/// Authentication capability attached to a request
///
/// A request without this extension is treated exactly like
/// [`AuthState::Anonymous`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::Authenticated(principal) => Some(principal),
            AuthState::Anonymous => None,
        }
    }
}

impl From<Option<Principal>> for AuthState {
    fn from(principal: Option<Principal>) -> Self {
        principal.map_or(AuthState::Anonymous, AuthState::Authenticated)
    }
}
