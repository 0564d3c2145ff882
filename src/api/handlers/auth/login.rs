use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header::SET_COOKIE, HeaderMap},
    Json,
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::instrument;

use super::{
    flow,
    session::session_cookie,
    state::AuthState,
    types::{AuthenticateRequest, AuthenticateResponse},
};
use crate::{
    api::handlers::{json_body, UserProfile},
    store::Store,
    Error,
};

#[utoipa::path(
    post,
    path = "/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Logged in; the session cookie is set", body = AuthenticateResponse),
        (status = 400, description = "Invalid JSON"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip(store, auth_state, payload))]
pub async fn authenticate(
    store: Extension<Store>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<AuthenticateResponse>), Error> {
    let request = json_body(payload)?;
    let password = SecretString::from(request.password);
    let config = auth_state.config();

    let (user, session) =
        flow::login(&store, &request.email, &password, config.session_ttl_seconds()).await?;

    let cookie = session_cookie(config, &session.token)
        .map_err(|err| Error::Storage(anyhow::anyhow!("failed to build session cookie: {err}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((
        headers,
        Json(AuthenticateResponse {
            status: "success".to_string(),
            user: UserProfile::from(&user),
        }),
    ))
}
