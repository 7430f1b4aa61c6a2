use conduit::{
    config::{Config, DEFAULT_USER_SERVICE_ADDRESS},
    make_user_service_router, run_app,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> conduit::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env(DEFAULT_USER_SERVICE_ADDRESS)?;
    tracing::info!(database = ?config.database, "Loaded configuration");

    run_app(make_user_service_router(), config.bind_address).await
}
