use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::handlers::not_found;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

type Directory = HashMap<String, DirectoryUser>;

fn demo_directory() -> Directory {
    let john = DirectoryUser {
        id: "1".into(),
        name: "John Doe".into(),
        email: "john.doe@example.com".into(),
    };
    HashMap::from([(john.id.clone(), john)])
}

async fn get_user_by_id(
    Extension(directory): Extension<Arc<Directory>>,
    Path(id): Path<String>,
) -> Response {
    match directory.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "User not found" })),
        )
            .into_response(),
    }
}

/// The downstream the gateway's `/users` prefix points at by default.
pub fn make_user_service_router() -> Router {
    Router::new()
        .route("/users/:id", get(get_user_by_id))
        .fallback(not_found)
        .layer(Extension(Arc::new(demo_directory())))
        .layer(TraceLayer::new_for_http())
}
