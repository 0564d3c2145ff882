//! Auth flow: signup, login, session validation, user resolution and logout.
//!
//! Flow Overview:
//! 1) Signup normalizes the email and stores an Argon2id digest of the password.
//! 2) Login verifies the digest and creates a fresh session row with an expiry.
//! 3) Every authenticated request validates the cookie token and resolves the
//!    owning user.
//! 4) Logout deletes the session row; it never fails the request.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use super::utils::{normalize_email, valid_email};
use crate::{
    store::{
        password::verify_password,
        sessions,
        users::{self, CreateOutcome},
        Session, Store, User,
    },
    Error,
};

/// Create a user account.
///
/// # Errors
/// `MalformedRequest` for an invalid email or empty password, `Conflict` when
/// the email is taken, `Storage` otherwise.
pub(crate) async fn signup(
    store: &Store,
    name: &str,
    email: &str,
    password: &SecretString,
) -> Result<User, Error> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(Error::MalformedRequest("Invalid email".to_string()));
    }
    if password.expose_secret().is_empty() {
        return Err(Error::MalformedRequest("Password is required".to_string()));
    }

    match users::create(store, name.trim(), &email, password).await? {
        CreateOutcome::Created(user) => {
            info!(user_id = user.id, "User created");
            Ok(user)
        }
        CreateOutcome::Conflict => Err(Error::Conflict("user")),
    }
}

/// Check credentials and open a new session lasting `ttl_seconds`.
///
/// # Errors
/// `InvalidCredentials` for an unknown email or a wrong password, `Storage`
/// otherwise.
pub(crate) async fn login(
    store: &Store,
    email: &str,
    password: &SecretString,
    ttl_seconds: i64,
) -> Result<(User, Session), Error> {
    let email = normalize_email(email);
    let Some(user) = users::find_by_email(store, &email).await? else {
        debug!("Login attempt for unknown email");
        return Err(Error::InvalidCredentials);
    };

    if !verify_password(password, &user.password) {
        debug!(user_id = user.id, "Password mismatch");
        return Err(Error::InvalidCredentials);
    }

    let session = sessions::create(store, &user, ttl_seconds).await?;
    info!(user_id = user.id, session_id = session.id, "Session created");
    Ok((user, session))
}

/// Resolve a cookie token into an active session.
///
/// # Errors
/// `Unauthorized` when no unexpired session holds `token`, `Storage` otherwise.
pub(crate) async fn validate(store: &Store, token: &str) -> Result<Session, Error> {
    let now = Utc::now().timestamp();
    match sessions::find_active(store, token, now).await? {
        Some(session) if session.is_active(now) => Ok(session),
        _ => Err(Error::Unauthorized),
    }
}

/// Fetch the user owning `session`.
///
/// # Errors
/// `NotFound` when the user no longer exists, `Storage` otherwise.
pub(crate) async fn resolve_user(store: &Store, session: &Session) -> Result<User, Error> {
    users::find_by_id(store, session.user_id)
        .await?
        .ok_or(Error::NotFound("user"))
}

/// Delete the session holding `token`, if any.
pub(crate) async fn logout(store: &Store, token: &str) {
    match sessions::delete_by_token(store, token).await {
        Ok(true) => info!("Session deleted"),
        Ok(false) => debug!("Logout for unknown session"),
        Err(err) => error!("Failed to delete session: {err:#}"),
    }
}
