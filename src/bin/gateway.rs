use conduit::{
    config::{Config, GatewayConfig, DEFAULT_GATEWAY_ADDRESS},
    make_gateway_router, run_app,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> conduit::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env(DEFAULT_GATEWAY_ADDRESS)?;
    let gateway = GatewayConfig::from_env()?;
    tracing::info!(
        database = ?config.database,
        timeout_secs = gateway.forward_timeout.as_secs(),
        "Loaded configuration"
    );

    let router = make_gateway_router(&gateway.routes, gateway.forward_timeout)?;
    run_app(router, config.bind_address).await
}
