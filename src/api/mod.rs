//! HTTP surface: route table, middleware stack and server lifecycle.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;

use crate::store::Store;
use handlers::{
    auth::{self, AuthConfig, AuthState},
    health, todos,
};

pub mod handlers;
mod openapi;

pub use openapi::openapi;


/// Build the application router with every route and middleware layer.
///
/// # Errors
/// Returns an error if the frontend base URL cannot be turned into a CORS
/// origin.
pub fn router(store: Store, auth_state: Arc<AuthState>) -> Result<Router> {
    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi_json))
        .route("/signup", post(auth::signup::signup))
        .route("/authenticate", post(auth::login::authenticate))
        .route("/logout", post(auth::session::logout))
        .route("/todos", get(todos::list::list))
        .route("/todos/save", post(todos::save::save))
        .route(
            "/todos/update/:id",
            post(todos::update::update).put(todos::update::update),
        )
        .route(
            "/todos/update/:id/",
            post(todos::update::update).put(todos::update::update),
        )
        .route(
            "/todos/delete/:id",
            post(todos::delete::delete).delete(todos::delete::delete),
        )
        .route(
            "/todos/delete/:id/",
            post(todos::delete::delete).delete(todos::delete::delete),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(store)),
        );

    Ok(app)
}

/// Start the server and block until ctrl-c.
///
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, store: Store, auth_config: AuthConfig) -> Result<()> {
    let auth_state = Arc::new(AuthState::new(auth_config));

    let sweeper = auth::spawn_session_sweeper(
        store.clone(),
        auth_state.config().session_sweep_interval(),
    );

    let app = router(store.clone(), auth_state)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    store.close().await;
    info!("Database connections closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
