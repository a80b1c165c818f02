use axum::{
    Json, Router,
    extract::Path,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::database::DbResult;
use crate::database::provider::{Provider, UpdateProviderData};
use crate::utils::HttpResult;

#[derive(Deserialize)]
struct InsertProviderRequest {
    name: String,
}

async fn insert_one(Json(payload): Json<InsertProviderRequest>) -> DbResult<HttpResult<Provider>> {
    let created = Provider::create(&payload.name)?;
    Ok(HttpResult::new(created))
}

async fn list() -> DbResult<HttpResult<Vec<Provider>>> {
    let result = Provider::list_all()?;
    Ok(HttpResult::new(result))
}

async fn update_one(
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProviderData>,
) -> DbResult<HttpResult<Provider>> {
    let updated = Provider::update(id, &payload)?;
    Ok(HttpResult::new(updated))
}

async fn delete_one(Path(id): Path<i64>) -> DbResult<HttpResult<()>> {
    Provider::delete(id)?;
    Ok(HttpResult::new(()))
}

pub fn create_provider_router() -> Router {
    Router::new().nest(
        "/provider",
        Router::new()
            .route("/", post(insert_one))
            .route("/{id}", put(update_one))
            .route("/{id}", delete(delete_one))
            .route("/list", get(list)),
    )
}
