//! Request/response types for todo endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::handlers::UserProfile,
    store::{Priority, Status, Todo},
};

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub content: String,
    /// `high`, `medium` or `low`; empty or missing means `medium`.
    pub priority: Option<String>,
    /// `YYYY-MM-DD`; empty or missing means today.
    #[serde(rename = "dueDate")]
    pub due_date: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub content: String,
    pub priority: Option<String>,
    /// `todo`, `in_progress` or `completed`; empty or missing means `todo`.
    pub status: Option<String>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<String>,
}

/// A todo as the frontend consumes it.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TodoResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "DueDate")]
    pub due_date: NaiveDate,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            content: todo.content,
            user_id: todo.user_id,
            priority: todo.priority,
            status: todo.status,
            due_date: todo.due_date,
            created_at: todo.created_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TodoListResponse {
    pub status: String,
    pub todos: Vec<TodoResponse>,
    pub user: UserProfile,
}
