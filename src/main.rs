use std::sync::Arc;

use conduit::{
    config::{jwt_secret, Config, DEFAULT_CONTENT_ADDRESS},
    make_router, run_app,
    telemetry::init_tracing,
    Authenticator, ContentStore, Seed,
};

#[tokio::main]
async fn main() -> conduit::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env(DEFAULT_CONTENT_ADDRESS)?;
    tracing::info!(database = ?config.database, "Loaded configuration");

    let authenticator = Arc::new(Authenticator::new(jwt_secret()?.as_bytes()));
    let store = Arc::new(ContentStore::from_seed(Seed::demo()?)?);

    run_app(make_router(store, authenticator), config.bind_address).await
}
