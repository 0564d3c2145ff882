use axum::{extract::Extension, http::HeaderMap, Json};
use tracing::instrument;

use super::types::{TodoListResponse, TodoResponse};
use crate::{
    api::handlers::{auth::principal::require_auth, UserProfile},
    store::{todos, Store},
    Error,
};

#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "The caller's todos, oldest first", body = TodoListResponse),
        (status = 401, description = "Missing or invalid session"),
    ),
    tag = "todos"
)]
#[instrument(skip(headers, store))]
pub async fn list(
    headers: HeaderMap,
    store: Extension<Store>,
) -> Result<Json<TodoListResponse>, Error> {
    let principal = require_auth(&headers, &store).await?;
    let todos = todos::list_by_user(&store, principal.user_id).await?;

    Ok(Json(TodoListResponse {
        status: "success".to_string(),
        todos: todos.into_iter().map(TodoResponse::from).collect(),
        user: UserProfile::from(&principal),
    }))
}
