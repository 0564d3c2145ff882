use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use secrecy::SecretString;
use tracing::instrument;

use super::{flow, types::SignupRequest};
use crate::{
    api::handlers::{json_body, MessageResponse},
    store::Store,
    Error,
};

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created", body = MessageResponse),
        (status = 400, description = "Invalid JSON or email"),
        (status = 409, description = "A user with this email already exists"),
    ),
    tag = "auth"
)]
#[instrument(skip(store, payload))]
pub async fn signup(
    store: Extension<Store>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let request = json_body(payload)?;
    let password = SecretString::from(request.password);

    flow::signup(&store, &request.name, &request.email, &password).await?;

    Ok(Json(MessageResponse::success("User created successfully")))
}
