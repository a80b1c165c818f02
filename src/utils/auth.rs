use axum::Json;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::config::CONFIG;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug)]
pub enum AuthError {
    Empty,
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message) = match self {
            AuthError::Empty => (
                StatusCode::UNAUTHORIZED,
                1001,
                "header X-Admin-Token is needed",
            ),
            AuthError::Invalid => (StatusCode::UNAUTHORIZED, 1002, "admin token invalid"),
        };
        let body = Json(json!({
            "code": error_code,
            "msg": error_message,
        }));
        (status, body).into_response()
    }
}

// Gates the management API behind the configured shared secret.
pub async fn admin_access_middleware(
    req: Request,
    next: Next,
) -> Result<Response<Body>, AuthError> {
    let token = match req.headers().get(ADMIN_TOKEN_HEADER) {
        Some(value) => value.to_str().unwrap_or(""),
        None => return Err(AuthError::Empty),
    };
    if token.is_empty() {
        return Err(AuthError::Empty);
    }
    if token != CONFIG.secret_key {
        return Err(AuthError::Invalid);
    }
    Ok(next.run(req).await)
}
