//! Edge process: answers `/ping` itself and hands configured prefixes to
//! their downstream services.

mod proxy;

pub use proxy::ReverseProxy;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::{BodyStream, ConnectInfo, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{config::ProxyRoute, errors::RequestError, handlers::not_found};

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

async fn forward(
    State(proxy): State<Arc<ReverseProxy>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: BodyStream,
) -> Result<Response, RequestError> {
    let client_addr = connect_info.map(|ConnectInfo(addr)| addr);
    proxy.forward(method, uri, headers, body, client_addr).await
}

/// One proxy per route, mounted on `<prefix>`, `<prefix>/` and
/// `<prefix>/*rest` since a wildcard never matches an empty segment.
/// Paths outside every prefix are handled locally.
pub fn make_gateway_router(routes: &[ProxyRoute], forward_timeout: Duration) -> Result<Router> {
    let mut router = Router::new().route("/ping", get(ping));
    for route in routes {
        let proxy = Arc::new(ReverseProxy::new(&route.target, forward_timeout)?);
        tracing::info!(prefix = %route.prefix, target = %route.target, "Registered downstream");
        let handler = any(forward).with_state(proxy);
        router = router
            .route(&route.prefix, handler.clone())
            .route(&format!("{}/", route.prefix), handler.clone())
            .route(&format!("{}/*rest", route.prefix), handler);
    }
    Ok(router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http()))
}
