mod authentication;
mod data_formats;
mod errors;
mod handlers;
mod models;
mod seed;
mod store;

pub mod config;
pub mod gateway;
pub mod telemetry;
pub mod user_service;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use authentication::{bearer_token, Authenticator, SessionClaims, TOKEN_LIFETIME};
pub use data_formats::*;
pub use errors::{RequestError, RequestErrorJson, RequestErrorJsonWrapper};
pub use gateway::make_gateway_router;
use handlers::*;
pub use models::{Article, Comment, Profile, Session, User};
pub use seed::{Seed, SeedUser};
use std::{
    future::Future,
    net::{SocketAddr, TcpListener},
    sync::Arc,
};
pub use store::{ContentStore, LoginFailure, NewUser, StoreError, UserChanges};
use tower_http::trace::TraceLayer;
pub use user_service::make_user_service_router;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(app: Router, address: SocketAddr) -> Result<()> {
    let listener =
        TcpListener::bind(address).with_context(|| format!("Failed to bind {address}"))?;
    serve(app, listener, shutdown_signal()).await
}

/// Serves `app` on an already bound listener until `shutdown` resolves.
pub async fn serve(
    app: Router,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    tracing::info!(address = %listener.local_addr()?, "Server started");
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Content service routes. Every path and method pair not listed here,
/// including a known path with another method, is a JSON 404.
pub fn make_router(store: Arc<ContentStore>, authenticator: Arc<Authenticator>) -> Router {
    Router::new()
        .route(
            "/api/profiles/:username",
            get(get_profile).fallback(not_found),
        )
        .route("/api/articles", get(list_articles).fallback(not_found))
        .route("/api/articles/:slug", get(get_article).fallback(not_found))
        .route(
            "/api/articles/:slug/comments",
            get(get_comments).fallback(not_found),
        )
        .route("/api/tags", get(get_tags).fallback(not_found))
        .route(
            "/api/user",
            get(get_current_user).put(update_user).fallback(not_found),
        )
        .route("/api/users/login", post(login_user).fallback(not_found))
        .route("/api/users", post(register_user).fallback(not_found))
        .fallback(not_found)
        .layer(Extension(store))
        .layer(Extension(authenticator))
        .layer(TraceLayer::new_for_http())
}
