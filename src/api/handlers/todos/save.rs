use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::HeaderMap,
    Json,
};
use tracing::{debug, instrument};

use super::{parse_due_date, parse_priority, types::CreateTodoRequest};
use crate::{
    api::handlers::{auth::principal::require_auth, json_body, MessageResponse},
    store::{todos, NewTodo, Store},
    Error,
};

#[utoipa::path(
    post,
    path = "/todos/save",
    request_body = CreateTodoRequest,
    responses(
        (status = 200, description = "Todo created", body = MessageResponse),
        (status = 400, description = "Invalid JSON, priority or due date"),
        (status = 401, description = "Missing or invalid session"),
    ),
    tag = "todos"
)]
#[instrument(skip(headers, store, payload))]
pub async fn save(
    headers: HeaderMap,
    store: Extension<Store>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let principal = require_auth(&headers, &store).await?;
    let request = json_body(payload)?;

    let new_todo = NewTodo {
        content: request.content,
        priority: parse_priority(request.priority.as_deref())?,
        due_date: parse_due_date(request.due_date.as_deref())?,
    };
    let todo = todos::create(&store, principal.user_id, &new_todo).await?;
    debug!(todo_id = todo.id, user_id = principal.user_id, "Todo created");

    Ok(Json(MessageResponse::success("Todo created successfully")))
}
