//! Request-level error taxonomy.
//!
//! Store and auth failures are converted into one of these variants and then
//! into a JSON response with a generic message. Internal detail is logged, never
//! returned to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Body is not valid JSON or a field holds an unrecognized value.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Missing, unknown or expired session.
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Authenticated, but the target record belongs to another user.
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Error {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::MalformedRequest(reason) => reason.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::Forbidden => "Forbidden".to_string(),
            Self::NotFound(what) => format!("{} not found", capitalize(what)),
            Self::Conflict(what) => format!("{} already exists", capitalize(what)),
            Self::Storage(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(err) => error!("request failed: {err:#}"),
            other => debug!("request rejected: {other}"),
        }

        let body = Json(json!({
            "status": "error",
            "message": self.client_message(),
        }));

        (self.status(), body).into_response()
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::to_bytes;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            Error::MalformedRequest("Invalid JSON".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("todo").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Conflict("user").status(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Storage(anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(Error::NotFound("todo").client_message(), "Todo not found");
        assert_eq!(
            Error::Conflict("user").client_message(),
            "User already exists"
        );
    }

    #[tokio::test]
    async fn storage_errors_hide_internal_detail() -> anyhow::Result<()> {
        let response = Error::Storage(anyhow!("UNIQUE constraint failed: secret")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "Internal server error");
        assert!(!body.windows(6).any(|window| window == b"secret"));
        Ok(())
    }
}
