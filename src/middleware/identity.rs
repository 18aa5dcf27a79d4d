//! Bridge between the session store and the gates.
//!
//! The gates never talk to the session store to decide anything; they read
//! the [`AuthState`] this layer puts in request extensions.

use crate::error::{AppError, AppResult};
use crate::principal::{AuthState, Principal};
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

/// Session key holding the serialized [`Principal`]
pub const USER_KEY: &str = "user";

/// Session key holding the path an anonymous user originally asked for
pub const RETURN_TO_KEY: &str = "returnTo";

/// Publish the request's authentication state
///
/// Use with `axum::middleware::from_fn`, inside the session layer. Store
/// failures are errors; a stored principal that no longer deserializes is
/// dropped from the session and the request continues anonymously.
pub async fn load_identity(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = read_principal(&session).await?;

    request.extensions_mut().insert(AuthState::from(principal));

    Ok(next.run(request).await)
}

async fn read_principal(session: &Session) -> AppResult<Option<Principal>> {
    let Some(value) = session.get_value(USER_KEY).await? else {
        return Ok(None);
    };

    match serde_json::from_value::<Principal>(value) {
        Ok(principal) => Ok(Some(principal)),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable principal from session");
            session.remove_value(USER_KEY).await?;
            Ok(None)
        }
    }
}

/// Mark the session as signed in for `principal`
///
/// The session id is cycled first so a pre-login id cannot be reused.
pub async fn sign_in(session: &Session, principal: &Principal) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_KEY, principal).await?;

    tracing::debug!(username = %principal.username, "Signed in");
    Ok(())
}

/// Drop all session data, including the principal
pub async fn sign_out(session: &Session) -> AppResult<()> {
    session.flush().await?;
    Ok(())
}

/// Remove and return the recorded return path, if any
pub async fn take_return_to(session: &Session) -> AppResult<Option<String>> {
    Ok(session.remove::<String>(RETURN_TO_KEY).await?)
}
