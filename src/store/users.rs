//! Credential store: user records keyed by id and by (normalized) email.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{is_unique_violation, password::hash_password, query_span, Store};

#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Outcome when attempting to create a user.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(User),
    /// A user with this email already exists.
    Conflict,
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        uuid: row.try_get("uuid")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Hash `password`, assign a fresh uuid and insert the user.
///
/// `email` is stored as given; callers normalize it first.
///
/// # Errors
/// Returns an error on hashing or database failure. A duplicate email is
/// reported as [`CreateOutcome::Conflict`], not as an error.
pub async fn create(
    store: &Store,
    name: &str,
    email: &str,
    password: &SecretString,
) -> Result<CreateOutcome> {
    let digest = hash_password(password)?;

    let query = r"
        INSERT INTO users (uuid, name, email, password, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, uuid, name, email, password, created_at
    ";
    let result = sqlx::query(query)
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(email)
        .bind(digest)
        .bind(Utc::now())
        .fetch_one(store.pool())
        .instrument(query_span("INSERT", query))
        .await;

    match result {
        Ok(row) => Ok(CreateOutcome::Created(
            user_from_row(&row).context("failed to decode user")?,
        )),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// # Errors
/// Returns an error if the query fails.
pub async fn find_by_id(store: &Store, id: i64) -> Result<Option<User>> {
    let query = "SELECT id, uuid, name, email, password, created_at FROM users WHERE id = ?";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(store.pool())
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup user by id")?;

    row.as_ref()
        .map(user_from_row)
        .transpose()
        .context("failed to decode user")
}

/// # Errors
/// Returns an error if the query fails.
pub async fn find_by_email(store: &Store, email: &str) -> Result<Option<User>> {
    let query = "SELECT id, uuid, name, email, password, created_at FROM users WHERE email = ?";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(store.pool())
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup user by email")?;

    row.as_ref()
        .map(user_from_row)
        .transpose()
        .context("failed to decode user")
}

/// Update name and email; returns `false` when no user has `id`.
///
/// # Errors
/// Returns an error if the update fails (including a duplicate email).
pub async fn update(store: &Store, id: i64, name: &str, email: &str) -> Result<bool> {
    let query = "UPDATE users SET name = ?, email = ? WHERE id = ?";
    let result = sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(store.pool())
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to update user")?;

    Ok(result.rows_affected() > 0)
}

/// Delete a user; their todos and sessions are left in place.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete(store: &Store, id: i64) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = ?";
    let result = sqlx::query(query)
        .bind(id)
        .execute(store.pool())
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::password::verify_password;
    use anyhow::bail;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    async fn created(store: &Store, name: &str, email: &str) -> Result<User> {
        match create(store, name, email, &secret("p")).await? {
            CreateOutcome::Created(user) => Ok(user),
            CreateOutcome::Conflict => bail!("unexpected conflict for {email}"),
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_assigns_uuid() -> Result<()> {
        let store = Store::in_memory().await?;
        let user = created(&store, "A", "a@x.com").await?;

        assert!(user.id > 0);
        assert!(Uuid::parse_str(&user.uuid).is_ok());
        assert_ne!(user.password, "p");
        assert!(verify_password(&secret("p"), &user.password));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() -> Result<()> {
        let store = Store::in_memory().await?;
        created(&store, "A", "a@x.com").await?;

        let outcome = create(&store, "B", "a@x.com", &secret("q")).await?;
        assert!(matches!(outcome, CreateOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_and_email() -> Result<()> {
        let store = Store::in_memory().await?;
        let user = created(&store, "A", "a@x.com").await?;

        let by_id = find_by_id(&store, user.id).await?.context("missing by id")?;
        assert_eq!(by_id.email, "a@x.com");
        let by_email = find_by_email(&store, "a@x.com")
            .await?
            .context("missing by email")?;
        assert_eq!(by_email.id, user.id);

        assert!(find_by_id(&store, user.id + 100).await?.is_none());
        assert!(find_by_email(&store, "nobody@x.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete() -> Result<()> {
        let store = Store::in_memory().await?;
        let user = created(&store, "A", "a@x.com").await?;

        assert!(update(&store, user.id, "Alice", "alice@x.com").await?);
        let updated = find_by_id(&store, user.id).await?.context("missing user")?;
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.email, "alice@x.com");

        assert!(delete(&store, user.id).await?);
        assert!(!delete(&store, user.id).await?);
        assert!(find_by_id(&store, user.id).await?.is_none());
        Ok(())
    }

    #[test]
    fn debug_redacts_password() {
        let user = User {
            id: 1,
            uuid: "u".to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };
        assert!(!format!("{user:?}").contains("secret"));
    }
}
