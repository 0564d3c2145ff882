//! Session store: one row per successful login, keyed by a random token.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{is_unique_violation, query_span, users::User, Store};

#[derive(Clone)]
pub struct Session {
    pub id: i64,
    /// Opaque token carried by the session cookie.
    pub token: String,
    pub email: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Session {
    /// A decoded row only counts when it has a real primary key and has not
    /// expired yet.
    #[must_use]
    pub const fn is_active(&self, now_unix: i64) -> bool {
        self.id != 0 && self.expires_at > now_unix
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("token", &"***")
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn session_from_row(row: &SqliteRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        id: row.try_get("id")?,
        token: row.try_get("uuid")?,
        email: row.try_get("email")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

/// Create a session for `user` that expires `ttl_seconds` from now.
///
/// # Errors
/// Returns an error if the insert fails or no unique token could be drawn.
pub async fn create(store: &Store, user: &User, ttl_seconds: i64) -> Result<Session> {
    let query = r"
        INSERT INTO sessions (uuid, email, user_id, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, uuid, email, user_id, created_at, expires_at
    ";

    // A uuid v4 collision is practically impossible, but the column is UNIQUE
    // so a clash must not surface as a server error.
    for _ in 0..3 {
        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(Uuid::new_v4().to_string())
            .bind(&user.email)
            .bind(user.id)
            .bind(now)
            .bind(now.timestamp().saturating_add(ttl_seconds))
            .fetch_one(store.pool())
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(row) => return session_from_row(&row).context("failed to decode session"),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Look up an unexpired session by token.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_active(store: &Store, token: &str, now_unix: i64) -> Result<Option<Session>> {
    let query = r"
        SELECT id, uuid, email, user_id, created_at, expires_at
        FROM sessions
        WHERE uuid = ? AND expires_at > ?
        LIMIT 1
    ";
    let row = sqlx::query(query)
        .bind(token)
        .bind(now_unix)
        .fetch_optional(store.pool())
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup session")?;

    row.as_ref()
        .map(session_from_row)
        .transpose()
        .context("failed to decode session")
}

/// Delete the session holding `token`. Deleting an unknown token is not an
/// error; the return value tells whether a row was removed.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete_by_token(store: &Store, token: &str) -> Result<bool> {
    let query = "DELETE FROM sessions WHERE uuid = ?";
    let result = sqlx::query(query)
        .bind(token)
        .execute(store.pool())
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete session")?;

    Ok(result.rows_affected() > 0)
}

/// Remove every session that expired at or before `now_unix`.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn purge_expired(store: &Store, now_unix: i64) -> Result<u64> {
    let query = "DELETE FROM sessions WHERE expires_at <= ?";
    let result = sqlx::query(query)
        .bind(now_unix)
        .execute(store.pool())
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to purge expired sessions")?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::users::{self, CreateOutcome};
    use anyhow::bail;
    use secrecy::SecretString;

    async fn user(store: &Store, email: &str) -> Result<User> {
        match users::create(store, "A", email, &SecretString::from("p".to_string())).await? {
            CreateOutcome::Created(user) => Ok(user),
            CreateOutcome::Conflict => bail!("unexpected conflict"),
        }
    }

    #[tokio::test]
    async fn create_then_find_active() -> Result<()> {
        let store = Store::in_memory().await?;
        let owner = user(&store, "a@x.com").await?;

        let session = create(&store, &owner, 3600).await?;
        assert!(session.id > 0);
        assert_eq!(session.user_id, owner.id);
        assert_eq!(session.email, "a@x.com");
        assert!(Uuid::parse_str(&session.token).is_ok());

        let now = Utc::now().timestamp();
        let found = find_active(&store, &session.token, now)
            .await?
            .context("session missing")?;
        assert_eq!(found.id, session.id);
        assert!(found.is_active(now));
        Ok(())
    }

    #[tokio::test]
    async fn each_login_gets_its_own_session() -> Result<()> {
        let store = Store::in_memory().await?;
        let owner = user(&store, "a@x.com").await?;

        let first = create(&store, &owner, 3600).await?;
        let second = create(&store, &owner, 3600).await?;
        assert_ne!(first.token, second.token);

        let now = Utc::now().timestamp();
        assert!(find_active(&store, &first.token, now).await?.is_some());
        assert!(find_active(&store, &second.token, now).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_and_purged() -> Result<()> {
        let store = Store::in_memory().await?;
        let owner = user(&store, "a@x.com").await?;

        let expired = create(&store, &owner, -10).await?;
        let live = create(&store, &owner, 3600).await?;

        let now = Utc::now().timestamp();
        assert!(find_active(&store, &expired.token, now).await?.is_none());
        assert!(!expired.is_active(now));

        assert_eq!(purge_expired(&store, now).await?, 1);
        assert!(find_active(&store, &live.token, now).await?.is_some());
        assert_eq!(purge_expired(&store, now).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> Result<()> {
        let store = Store::in_memory().await?;
        let owner = user(&store, "a@x.com").await?;
        let session = create(&store, &owner, 3600).await?;

        assert!(delete_by_token(&store, &session.token).await?);
        assert!(!delete_by_token(&store, &session.token).await?);
        assert!(!delete_by_token(&store, "never-issued").await?);

        let now = Utc::now().timestamp();
        assert!(find_active(&store, &session.token, now).await?.is_none());
        Ok(())
    }

    #[test]
    fn zero_id_is_never_active() {
        let session = Session {
            id: 0,
            token: String::new(),
            email: String::new(),
            user_id: 0,
            created_at: Utc::now(),
            expires_at: i64::MAX,
        };
        assert!(!session.is_active(0));
    }
}
