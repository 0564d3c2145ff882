//! Schema creation and additive column migration.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info, warn};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Columns added after the first release, with the DDL that adds them.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
    (
        "todos",
        "priority",
        "ALTER TABLE todos ADD COLUMN priority TEXT DEFAULT 'medium'",
    ),
    (
        "todos",
        "status",
        "ALTER TABLE todos ADD COLUMN status TEXT DEFAULT 'todo'",
    ),
    (
        "todos",
        "due_date",
        // SQLite rejects expression defaults in ADD COLUMN; the backfill covers it.
        "ALTER TABLE todos ADD COLUMN due_date DATE",
    ),
    (
        "sessions",
        "expires_at",
        "ALTER TABLE sessions ADD COLUMN expires_at INTEGER NOT NULL DEFAULT 0",
    ),
];

/// Backfill statements run after the columns exist. Older databases stored
/// priority, status and due date as free-form text; anything outside the
/// closed sets is reset to its default.
const BACKFILL_SQL: &[&str] = &[
    "UPDATE users SET name = '' WHERE name IS NULL",
    "UPDATE users SET created_at = CURRENT_TIMESTAMP WHERE created_at IS NULL",
    "UPDATE todos SET priority = lower(trim(priority)) WHERE priority <> lower(trim(priority))",
    "UPDATE todos SET priority = 'medium' WHERE priority IS NULL OR priority NOT IN ('high', 'medium', 'low')",
    "UPDATE todos SET status = lower(trim(status)) WHERE status <> lower(trim(status))",
    "UPDATE todos SET status = 'todo' WHERE status IS NULL OR status NOT IN ('todo', 'in_progress', 'completed')",
    "UPDATE todos SET due_date = date(due_date) WHERE date(due_date) IS NOT NULL AND due_date <> date(due_date)",
    "UPDATE todos SET due_date = date('now') WHERE due_date IS NULL OR date(due_date) IS NULL",
];

/// Indexes that depend on cleaned-up data.
const INDEX_SQL: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)",
    "CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON sessions (expires_at)",
];

const DUPLICATE_USERS_FILTER: &str = r"
    email IS NOT NULL
    AND id NOT IN (SELECT MIN(id) FROM users WHERE email IS NOT NULL GROUP BY email)
";

pub(super) async fn run(pool: &SqlitePool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    for (table, column, ddl) in ADDED_COLUMNS {
        let columns = table_columns(pool, table).await?;
        if columns.contains(*column) {
            debug!("{table}.{column} already present");
            continue;
        }
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("failed to add column {table}.{column}"))?;
        info!("Added {column} column to {table} table");
    }

    dedupe_user_emails(pool).await?;

    for statement in BACKFILL_SQL.iter().chain(INDEX_SQL) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to run migration statement: {statement}"))?;
    }

    Ok(())
}

/// Keep the oldest account for each email and delete the others. Older
/// databases allowed duplicates, and login always resolved to the lowest id,
/// so the removed rows were unreachable.
async fn dedupe_user_emails(pool: &SqlitePool) -> Result<u64> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to start user dedupe transaction")?;

    let select = format!("SELECT id, email FROM users WHERE {DUPLICATE_USERS_FILTER}");
    let duplicates = sqlx::query(&select)
        .fetch_all(&mut *tx)
        .await
        .context("failed to look up duplicate user emails")?;
    if duplicates.is_empty() {
        return Ok(0);
    }

    for row in &duplicates {
        let id: i64 = row.try_get("id").context("failed to read user id")?;
        let email: String = row.try_get("email").context("failed to read user email")?;
        warn!(user_id = id, email, "Removing duplicate user account");
    }

    let delete = format!("DELETE FROM users WHERE {DUPLICATE_USERS_FILTER}");
    let removed = sqlx::query(&delete)
        .execute(&mut *tx)
        .await
        .context("failed to delete duplicate user accounts")?
        .rows_affected();
    tx.commit()
        .await
        .context("failed to commit user dedupe")?;

    warn!("Removed {removed} duplicate user accounts before enforcing unique emails");
    Ok(removed)
}

async fn table_columns(pool: &SqlitePool, table: &str) -> Result<HashSet<String>> {
    // PRAGMA arguments cannot be bound; `table` only comes from ADDED_COLUMNS.
    let statement = format!("PRAGMA table_info({table})");
    let rows = sqlx::query(&statement)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to read table info for {table}"))?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("name")
                .context("failed to read column name")
        })
        .collect()
}

/// Split a schema file into statements; assumes `;` only ends statements.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn bare_pool() -> Result<SqlitePool> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("failed to open test pool")
    }

    #[test]
    fn split_sql_statements_skips_comments() {
        let statements = split_sql_statements("-- header\nCREATE TABLE a (id INT);\n\nSELECT 1;");
        assert_eq!(statements, vec!["CREATE TABLE a (id INT);", "SELECT 1;"]);
    }

    #[test]
    fn schema_has_three_tables() {
        let creates = split_sql_statements(SCHEMA_SQL)
            .into_iter()
            .filter(|statement| statement.starts_with("CREATE TABLE"))
            .count();
        assert_eq!(creates, 3);
    }

    #[tokio::test]
    async fn run_is_idempotent() -> Result<()> {
        let pool = bare_pool().await?;
        run(&pool).await?;
        run(&pool).await?;

        let columns = table_columns(&pool, "sessions").await?;
        assert!(columns.contains("expires_at"));
        Ok(())
    }

    #[tokio::test]
    async fn legacy_todos_table_gains_columns_and_defaults() -> Result<()> {
        let pool = bare_pool().await?;
        sqlx::query(
            "CREATE TABLE todos (id INTEGER PRIMARY KEY AUTOINCREMENT, content TEXT, user_id INTEGER, created_at DATETIME)",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE TABLE sessions (id INTEGER PRIMARY KEY AUTOINCREMENT, uuid TEXT NOT NULL UNIQUE, email TEXT, user_id INTEGER, created_at DATETIME)",
        )
        .execute(&pool)
        .await?;
        sqlx::query("INSERT INTO todos (content, user_id, created_at) VALUES ('old', 1, '2024-01-01 00:00:00')")
            .execute(&pool)
            .await?;

        run(&pool).await?;

        let todos = table_columns(&pool, "todos").await?;
        for column in ["priority", "status", "due_date"] {
            assert!(todos.contains(column), "missing {column}");
        }
        assert!(table_columns(&pool, "sessions").await?.contains("expires_at"));

        let row = sqlx::query("SELECT priority, status, due_date FROM todos WHERE content = 'old'")
            .fetch_one(&pool)
            .await?;
        assert_eq!(row.try_get::<String, _>("priority")?, "medium");
        assert_eq!(row.try_get::<String, _>("status")?, "todo");
        assert!(!row.try_get::<String, _>("due_date")?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn free_form_todo_values_are_normalized() -> Result<()> {
        let pool = bare_pool().await?;
        run(&pool).await?;

        for (content, priority, status, due_date) in [
            ("urgent", "urgent", "done", "someday"),
            ("shouty", " High ", "In_Progress", "2024-03-05 10:30:00"),
            ("fine", "low", "completed", "2024-03-05"),
        ] {
            sqlx::query(
                "INSERT INTO todos (content, user_id, priority, status, due_date, created_at) VALUES (?, 1, ?, ?, ?, CURRENT_TIMESTAMP)",
            )
            .bind(content)
            .bind(priority)
            .bind(status)
            .bind(due_date)
            .execute(&pool)
            .await?;
        }

        run(&pool).await?;

        let today: String = sqlx::query_scalar("SELECT date('now')")
            .fetch_one(&pool)
            .await?;
        let expected = [
            ("urgent", "medium", "todo", today.as_str()),
            ("shouty", "high", "in_progress", "2024-03-05"),
            ("fine", "low", "completed", "2024-03-05"),
        ];
        for (content, priority, status, due_date) in expected {
            let row = sqlx::query("SELECT priority, status, due_date FROM todos WHERE content = ?")
                .bind(content)
                .fetch_one(&pool)
                .await?;
            assert_eq!(row.try_get::<String, _>("priority")?, priority, "{content}");
            assert_eq!(row.try_get::<String, _>("status")?, status, "{content}");
            assert_eq!(row.try_get::<String, _>("due_date")?, due_date, "{content}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_emails_keep_the_oldest_account() -> Result<()> {
        let pool = bare_pool().await?;
        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, uuid STRING NOT NULL UNIQUE, name STRING, email STRING, password STRING, created_at DATETIME)",
        )
        .execute(&pool)
        .await?;
        for (uuid, email) in [("u1", "a@x.com"), ("u2", "a@x.com"), ("u3", "b@x.com"), ("u4", "a@x.com")] {
            sqlx::query("INSERT INTO users (uuid, email, password, created_at) VALUES (?, ?, 'x', '2024-01-01 00:00:00')")
                .bind(uuid)
                .bind(email)
                .execute(&pool)
                .await?;
        }

        run(&pool).await?;

        let kept: Vec<String> = sqlx::query_scalar("SELECT uuid FROM users ORDER BY id")
            .fetch_all(&pool)
            .await?;
        assert_eq!(kept, vec!["u1", "u3"]);

        let name: String = sqlx::query_scalar("SELECT name FROM users WHERE uuid = 'u1'")
            .fetch_one(&pool)
            .await?;
        assert_eq!(name, "");

        let duplicate = sqlx::query(
            "INSERT INTO users (uuid, email, password, created_at) VALUES ('u5', 'b@x.com', 'x', CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await;
        assert!(duplicate.is_err());

        assert_eq!(dedupe_user_emails(&pool).await?, 0);
        Ok(())
    }
}
