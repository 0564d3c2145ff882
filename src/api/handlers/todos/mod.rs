//! Todo handlers.
//!
//! Every handler resolves the caller with `require_auth` before touching the
//! todo store. Update and delete load the target first: a missing todo is
//! `404`, a todo owned by someone else is `403`.

pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod save;
pub(crate) mod types;
pub(crate) mod update;

use axum::extract::{rejection::PathRejection, Path};
use chrono::{NaiveDate, Utc};
use tracing::debug;

use super::auth::principal::Principal;
use crate::{
    store::{todos, Priority, Status, Store, Todo},
    Error,
};

/// Accept only positive numeric ids; anything else matches no todo.
fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, Error> {
    match path {
        Ok(Path(id)) if id > 0 => Ok(id),
        Ok(Path(id)) => {
            debug!(id, "Non-positive todo id");
            Err(Error::NotFound("todo"))
        }
        Err(rejection) => {
            debug!("Invalid todo id: {rejection}");
            Err(Error::NotFound("todo"))
        }
    }
}

/// Load a todo and check that `principal` owns it.
async fn owned_todo(store: &Store, id: i64, principal: &Principal) -> Result<Todo, Error> {
    let todo = todos::get(store, id).await?.ok_or(Error::NotFound("todo"))?;
    if todo.user_id != principal.user_id {
        debug!(
            todo_id = id,
            owner = todo.user_id,
            caller = principal.user_id,
            "Todo belongs to another user"
        );
        return Err(Error::Forbidden);
    }
    Ok(todo)
}

fn provided(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_priority(value: Option<&str>) -> Result<Priority, Error> {
    provided(value).map_or(Ok(Priority::default()), |value| {
        value
            .parse()
            .map_err(|_| Error::MalformedRequest("Invalid priority".to_string()))
    })
}

fn parse_status(value: Option<&str>) -> Result<Status, Error> {
    provided(value).map_or(Ok(Status::default()), |value| {
        value
            .parse()
            .map_err(|_| Error::MalformedRequest("Invalid status".to_string()))
    })
}

fn parse_due_date(value: Option<&str>) -> Result<NaiveDate, Error> {
    provided(value).map_or_else(
        || Ok(Utc::now().date_naive()),
        |value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| Error::MalformedRequest("Invalid due date".to_string()))
        },
    )
}
