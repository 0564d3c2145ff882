use axum::{
    extract::{rejection::PathRejection, Extension, Path},
    http::HeaderMap,
    Json,
};
use tracing::{debug, instrument};

use super::{owned_todo, todo_id};
use crate::{
    api::handlers::{auth::principal::require_auth, MessageResponse},
    store::{todos, Store},
    Error,
};

#[utoipa::path(
    method(post, delete),
    path = "/todos/delete/{id}",
    params(("id" = i64, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Todo belongs to another user"),
        (status = 404, description = "Todo not found"),
    ),
    tag = "todos"
)]
#[instrument(skip(headers, store, id))]
pub async fn delete(
    headers: HeaderMap,
    store: Extension<Store>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let principal = require_auth(&headers, &store).await?;
    let id = todo_id(id)?;

    owned_todo(&store, id, &principal).await?;
    if !todos::delete(&store, id).await? {
        return Err(Error::NotFound("todo"));
    }
    debug!(todo_id = id, "Todo deleted");

    Ok(Json(MessageResponse::success("Todo deleted successfully")))
}
