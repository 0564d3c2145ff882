//! API handlers and the response shapes they share.

pub mod auth;
pub mod health;
pub mod todos;

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::{store::User, Error};
use auth::principal::Principal;

/// `{"status": "success", "message": ...}`
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
        }
    }
}

/// Public part of a user record.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&Principal> for UserProfile {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.user_id,
            name: principal.name.clone(),
            email: principal.email.clone(),
        }
    }
}

/// Unwrap a JSON body, turning any rejection into `400 Invalid JSON`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!("Rejected request body: {rejection}");
        Error::MalformedRequest("Invalid JSON".to_string())
    })
}
