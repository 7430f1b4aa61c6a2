use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::{store::StoreError, JsonResponse};

/// Every way a request can fail once it has reached a handler.
///
/// Credential, conflict and authorization failures are answered with
/// `200 OK` and an error body; existing clients of the service rely on that.
#[derive(Debug)]
pub enum RequestError {
    NotFound,
    Validation(&'static str),
    BadRequest(String),
    InvalidCredentials(&'static str),
    Conflict(&'static str),
    NotAuthorized,
    ServerError,
    BadGateway,
    GatewayTimeout,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RequestErrorJsonWrapper {
    pub errors: RequestErrorJson,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RequestErrorJson {
    pub body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
        }
    }
}

impl From<StoreError> for RequestError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(field) => Self::Conflict(field),
            other => {
                tracing::error!(error = %other, "Store rejected a write");
                Self::ServerError
            }
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound => (
                StatusCode::NOT_FOUND,
                RequestErrorJsonWrapper::new("Not Found"),
            ),
            RequestError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::InvalidCredentials(message) => {
                (StatusCode::OK, RequestErrorJsonWrapper::new(message))
            }
            RequestError::Conflict(field) => (
                StatusCode::OK,
                RequestErrorJsonWrapper::new(&format!("{field} already exists")),
            ),
            RequestError::NotAuthorized => (
                StatusCode::OK,
                RequestErrorJsonWrapper::new("authorization failed"),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
            RequestError::BadGateway => (
                StatusCode::BAD_GATEWAY,
                RequestErrorJsonWrapper::new("Bad Gateway"),
            ),
            RequestError::GatewayTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                RequestErrorJsonWrapper::new("Gateway Timeout"),
            ),
        };
        (status_code, Json(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_the_field() {
        let (status, Json(body)) = RequestError::Conflict("email").to_json_response();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.errors.body, vec!["email already exists".to_string()]);
    }

    #[test]
    fn validation_is_a_bad_request() {
        let (status, Json(body)) =
            RequestError::Validation("username is required").to_json_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.errors.body, vec!["username is required".to_string()]);
    }

    #[test]
    fn error_body_shape() {
        let (_, Json(body)) = RequestError::NotAuthorized.to_json_response();
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "errors": { "body": ["authorization failed"] } })
        );
    }
}
