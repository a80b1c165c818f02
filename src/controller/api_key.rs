use axum::{
    Json, Router,
    extract::Path,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::database::DbResult;
use crate::database::api_key::{ApiKey, UpdateApiKeyData};
use crate::utils::HttpResult;

#[derive(Deserialize)]
struct InsertApiKeyRequest {
    name: String,
    user_id: i64,
}

async fn insert_one(Json(payload): Json<InsertApiKeyRequest>) -> DbResult<HttpResult<ApiKey>> {
    let created = ApiKey::create(&payload.name, payload.user_id)?;
    Ok(HttpResult::new(created))
}

async fn list() -> DbResult<HttpResult<Vec<ApiKey>>> {
    let result = ApiKey::list_all()?;
    Ok(HttpResult::new(result))
}

async fn update_one(
    Path(id): Path<i64>,
    Json(payload): Json<UpdateApiKeyData>,
) -> DbResult<HttpResult<ApiKey>> {
    let updated = ApiKey::update(id, &payload)?;
    Ok(HttpResult::new(updated))
}

async fn delete_one(Path(id): Path<i64>) -> DbResult<HttpResult<()>> {
    ApiKey::delete(id)?;
    Ok(HttpResult::new(()))
}

pub fn create_api_key_router() -> Router {
    Router::new().nest(
        "/api_key",
        Router::new()
            .route("/", post(insert_one))
            .route("/{id}", put(update_one))
            .route("/{id}", delete(delete_one))
            .route("/list", get(list)),
    )
}
