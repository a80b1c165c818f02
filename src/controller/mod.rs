use axum::{Router, http, middleware, response::IntoResponse};

use crate::utils::auth::admin_access_middleware;

use api_key::create_api_key_router;
use model::create_model_router;
use provider::create_provider_router;
use user::create_user_router;

mod api_key;
mod error;
mod model;
mod provider;
mod user;

pub use error::BaseError;

pub fn create_manager_router() -> Router {
    let api_router = Router::new()
        .merge(create_user_router())
        .merge(create_api_key_router())
        .merge(create_provider_router())
        .merge(create_model_router())
        .layer(middleware::from_fn(admin_access_middleware));

    Router::new().nest("/manager", Router::new().nest("/api", api_router))
}

pub async fn handle_404() -> impl IntoResponse {
    (http::StatusCode::NOT_FOUND, "not found")
}
