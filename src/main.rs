use config::CONFIG;
use controller::create_manager_router;
use gateway::create_gateway_router;

use axum::Router;
use cyder_tools::log::{LocalLogger, info};

mod config;
mod controller;
mod database;
mod gateway;
mod service;
mod utils;

#[tokio::main]
async fn main() {
    LocalLogger::init(&CONFIG.log_level);
    let addr = format!("{}:{}", &CONFIG.host, CONFIG.port);
    info!("server start at {}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(
        listener,
        Router::new()
            .nest(&CONFIG.base_path, create_gateway_router())
            .merge(create_manager_router())
            .fallback(controller::handle_404),
    )
    .await
    .expect("failed to start server");
}
