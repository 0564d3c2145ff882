use crate::{
    api::{self, handlers::auth::AuthConfig},
    cli::telemetry,
    store::Store,
};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub session_sweep_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Starting server with {args:?}");

    let store = Store::connect(&args.dsn).await?;

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_sweep_seconds(args.session_sweep_seconds);

    let result = api::new(args.port, store, auth_config).await;

    telemetry::shutdown_tracer();

    result
}
