use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::HeaderMap,
    Json,
};
use tracing::{debug, instrument};

use super::{
    owned_todo, parse_due_date, parse_priority, parse_status, todo_id, types::UpdateTodoRequest,
};
use crate::{
    api::handlers::{auth::principal::require_auth, json_body, MessageResponse},
    store::{todos, Store, TodoChanges},
    Error,
};

#[utoipa::path(
    method(post, put),
    path = "/todos/update/{id}",
    params(("id" = i64, Path, description = "Todo id")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = MessageResponse),
        (status = 400, description = "Invalid JSON, priority, status or due date"),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Todo belongs to another user"),
        (status = 404, description = "Todo not found"),
    ),
    tag = "todos"
)]
#[instrument(skip(headers, store, id, payload))]
pub async fn update(
    headers: HeaderMap,
    store: Extension<Store>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let principal = require_auth(&headers, &store).await?;
    let id = todo_id(id)?;
    let request = json_body(payload)?;

    let changes = TodoChanges {
        content: request.content,
        priority: parse_priority(request.priority.as_deref())?,
        status: parse_status(request.status.as_deref())?,
        due_date: parse_due_date(request.due_date.as_deref())?,
    };

    owned_todo(&store, id, &principal).await?;
    if !todos::update(&store, id, &changes).await? {
        // Deleted between the ownership check and the update.
        return Err(Error::NotFound("todo"));
    }
    debug!(todo_id = id, "Todo updated");

    Ok(Json(MessageResponse::success("Todo updated successfully")))
}
