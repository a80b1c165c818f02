use axum::{Router, routing::post};

use super::completions::chat_completions_handler;

pub fn create_gateway_router() -> Router {
    Router::new().route("/chat/completions", post(chat_completions_handler))
}
