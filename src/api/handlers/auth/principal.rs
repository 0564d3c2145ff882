//! Authenticated principal extraction.
//!
//! Flow Overview: read the session cookie, validate the session, resolve it to
//! a user, and return a principal that the todo handlers can use for ownership
//! checks.

use axum::http::HeaderMap;
use tracing::warn;

use super::{flow, session::extract_session_token};
use crate::{store::Store, Error};

/// Authenticated user context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

/// Resolve the session cookie into a principal.
///
/// # Errors
/// `Unauthorized` for a missing, unknown or expired session and for a session
/// whose user no longer exists; `Storage` on database failure.
pub async fn require_auth(headers: &HeaderMap, store: &Store) -> Result<Principal, Error> {
    let token = extract_session_token(headers).ok_or(Error::Unauthorized)?;
    let session = flow::validate(store, &token).await?;

    match flow::resolve_user(store, &session).await {
        Ok(user) => Ok(Principal {
            user_id: user.id,
            name: user.name,
            email: user.email,
        }),
        Err(Error::NotFound(_)) => {
            warn!(session_id = session.id, "Session refers to a missing user");
            Err(Error::Unauthorized)
        }
        Err(err) => Err(err),
    }
}
