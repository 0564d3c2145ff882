//! Todo store: task records scoped to an owning user.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use std::{fmt, str::FromStr};
use tracing::Instrument;
use utoipa::ToSchema;

use super::{query_span, Store};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
}

/// Returned when a string is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(UnknownVariant {
                kind: "priority",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownVariant {
                kind: "status",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a todo; status always starts as `todo`.
#[derive(Clone, Debug)]
pub struct NewTodo {
    pub content: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
}

/// Full replacement of the mutable fields.
#[derive(Clone, Debug)]
pub struct TodoChanges {
    pub content: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
}

fn todo_from_row(row: &SqliteRow) -> Result<Todo, sqlx::Error> {
    Ok(Todo {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        priority: row.try_get("priority")?,
        status: row.try_get("status")?,
        due_date: row.try_get("due_date")?,
        created_at: row.try_get("created_at")?,
    })
}

/// # Errors
/// Returns an error if the insert fails.
pub async fn create(store: &Store, user_id: i64, todo: &NewTodo) -> Result<Todo> {
    let query = r"
        INSERT INTO todos (content, user_id, priority, status, due_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, content, user_id, priority, status, due_date, created_at
    ";
    let row = sqlx::query(query)
        .bind(&todo.content)
        .bind(user_id)
        .bind(todo.priority)
        .bind(Status::Todo)
        .bind(todo.due_date)
        .bind(Utc::now())
        .fetch_one(store.pool())
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert todo")?;

    todo_from_row(&row).context("failed to decode todo")
}

/// # Errors
/// Returns an error if the query fails.
pub async fn get(store: &Store, id: i64) -> Result<Option<Todo>> {
    let query = r"
        SELECT id, COALESCE(content, '') AS content, user_id,
            COALESCE(priority, 'medium') AS priority,
            COALESCE(status, 'todo') AS status,
            COALESCE(due_date, date('now')) AS due_date,
            created_at
        FROM todos
        WHERE id = ?
    ";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(store.pool())
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup todo")?;

    row.as_ref()
        .map(todo_from_row)
        .transpose()
        .context("failed to decode todo")
}

/// All todos owned by `user_id`, oldest first.
///
/// # Errors
/// Returns an error if the query fails or a row cannot be decoded.
pub async fn list_by_user(store: &Store, user_id: i64) -> Result<Vec<Todo>> {
    let query = r"
        SELECT id, COALESCE(content, '') AS content, user_id,
            COALESCE(priority, 'medium') AS priority,
            COALESCE(status, 'todo') AS status,
            COALESCE(due_date, date('now')) AS due_date,
            created_at
        FROM todos
        WHERE user_id = ?
        ORDER BY id ASC
    ";
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(store.pool())
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to list todos")?;

    rows.iter()
        .map(todo_from_row)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode todo")
}

/// Overwrite content, priority, status and due date. Returns `false` when no
/// todo has `id`.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update(store: &Store, id: i64, changes: &TodoChanges) -> Result<bool> {
    let query = r"
        UPDATE todos
        SET content = ?, priority = ?, status = ?, due_date = ?
        WHERE id = ?
    ";
    let result = sqlx::query(query)
        .bind(&changes.content)
        .bind(changes.priority)
        .bind(changes.status)
        .bind(changes.due_date)
        .bind(id)
        .execute(store.pool())
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to update todo")?;

    Ok(result.rows_affected() > 0)
}

/// # Errors
/// Returns an error if the delete fails.
pub async fn delete(store: &Store, id: i64) -> Result<bool> {
    let query = "DELETE FROM todos WHERE id = ?";
    let result = sqlx::query(query)
        .bind(id)
        .execute(store.pool())
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete todo")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").context("bad test date")
    }

    fn new_todo(content: &str) -> Result<NewTodo> {
        Ok(NewTodo {
            content: content.to_string(),
            priority: Priority::default(),
            due_date: date("2025-03-01")?,
        })
    }

    #[test]
    fn priority_and_status_parse_known_values_only() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" Low ".parse::<Priority>(), Ok(Priority::Low));
        assert!("urgent".parse::<Priority>().is_err());

        assert_eq!("completed".parse::<Status>(), Ok(Status::Completed));
        assert_eq!("in_progress".parse::<Status>(), Ok(Status::InProgress));
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn defaults_are_medium_and_todo() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Status::default(), Status::Todo);
    }

    #[test]
    fn serde_uses_snake_case() -> Result<()> {
        assert_eq!(serde_json::to_value(Status::InProgress)?, "in_progress");
        assert_eq!(serde_json::to_value(Priority::High)?, "high");
        Ok(())
    }

    #[tokio::test]
    async fn create_starts_in_todo_status() -> Result<()> {
        let store = Store::in_memory().await?;
        let todo = create(&store, 7, &new_todo("buy milk")?).await?;

        assert_eq!(todo.content, "buy milk");
        assert_eq!(todo.user_id, 7);
        assert_eq!(todo.priority, Priority::Medium);
        assert_eq!(todo.status, Status::Todo);
        assert_eq!(todo.due_date, date("2025-03-01")?);

        let fetched = get(&store, todo.id).await?.context("todo missing")?;
        assert_eq!(fetched, todo);
        Ok(())
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner_in_insertion_order() -> Result<()> {
        let store = Store::in_memory().await?;
        let first = create(&store, 1, &new_todo("one")?).await?;
        create(&store, 2, &new_todo("someone else")?).await?;
        let second = create(&store, 1, &new_todo("two")?).await?;

        let todos = list_by_user(&store, 1).await?;
        let ids: Vec<i64> = todos.iter().map(|todo| todo.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(todos.iter().all(|todo| todo.user_id == 1));
        assert!(list_by_user(&store, 3).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_fields() -> Result<()> {
        let store = Store::in_memory().await?;
        let todo = create(&store, 1, &new_todo("draft")?).await?;

        let changes = TodoChanges {
            content: "final".to_string(),
            priority: Priority::High,
            status: Status::Completed,
            due_date: date("2025-12-31")?,
        };
        assert!(update(&store, todo.id, &changes).await?);
        assert!(!update(&store, todo.id + 1, &changes).await?);

        let updated = get(&store, todo.id).await?.context("todo missing")?;
        assert_eq!(updated.content, "final");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.status, Status::Completed);
        assert_eq!(updated.due_date, date("2025-12-31")?);
        assert_eq!(updated.created_at, todo.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_row() -> Result<()> {
        let store = Store::in_memory().await?;
        let todo = create(&store, 1, &new_todo("gone")?).await?;

        assert!(delete(&store, todo.id).await?);
        assert!(!delete(&store, todo.id).await?);
        assert!(get(&store, todo.id).await?.is_none());
        Ok(())
    }
}
