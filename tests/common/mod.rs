#![allow(dead_code)]

use std::{net::SocketAddr, net::TcpListener, sync::Arc};

use axum::Router;
use conduit::{make_router, serve, Authenticator, ContentStore, Seed};

pub const SECRET: &[u8] = b"integration-secret";

/// Starts `app` on an ephemeral port and returns its address.
pub fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(app, listener, std::future::pending())
            .await
            .unwrap();
    });
    address
}

pub fn spawn_content_service() -> SocketAddr {
    let store = Arc::new(ContentStore::from_seed(Seed::demo().unwrap()).unwrap());
    let authenticator = Arc::new(Authenticator::new(SECRET));
    spawn(make_router(store, authenticator))
}

/// An address nothing listens on.
pub fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
