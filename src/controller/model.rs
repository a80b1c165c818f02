use axum::{
    Json, Router,
    extract::Path,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::database::DbResult;
use crate::database::model::{MappingDetail, Model, ModelProviderMapping, UpdateModelData};
use crate::database::provider::Provider;
use crate::utils::HttpResult;

#[derive(Deserialize)]
struct InsertModelRequest {
    slug: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct InsertMappingRequest {
    provider_id: i64,
    input_token_cost: f64,
    output_token_cost: f64,
}

async fn insert_one(Json(payload): Json<InsertModelRequest>) -> DbResult<HttpResult<Model>> {
    let created = Model::create(&payload.slug, payload.description.as_deref())?;
    Ok(HttpResult::new(created))
}

async fn list() -> DbResult<HttpResult<Vec<Model>>> {
    let result = Model::list_all()?;
    Ok(HttpResult::new(result))
}

async fn update_one(
    Path(id): Path<i64>,
    Json(payload): Json<UpdateModelData>,
) -> DbResult<HttpResult<Model>> {
    let updated = Model::update(id, &payload)?;
    Ok(HttpResult::new(updated))
}

async fn delete_one(Path(id): Path<i64>) -> DbResult<HttpResult<()>> {
    Model::delete(id)?;
    Ok(HttpResult::new(()))
}

async fn insert_mapping(
    Path(model_id): Path<i64>,
    Json(payload): Json<InsertMappingRequest>,
) -> DbResult<HttpResult<ModelProviderMapping>> {
    // reject mappings pointing at providers that do not exist
    Provider::get_by_id(payload.provider_id)?;
    let created = ModelProviderMapping::create(
        model_id,
        payload.provider_id,
        payload.input_token_cost,
        payload.output_token_cost,
    )?;
    Ok(HttpResult::new(created))
}

async fn list_mappings(Path(model_id): Path<i64>) -> DbResult<HttpResult<Vec<MappingDetail>>> {
    let result = ModelProviderMapping::list_for_model(model_id)?;
    Ok(HttpResult::new(result))
}

async fn delete_mapping(Path(mapping_id): Path<i64>) -> DbResult<HttpResult<()>> {
    ModelProviderMapping::delete(mapping_id)?;
    Ok(HttpResult::new(()))
}

pub fn create_model_router() -> Router {
    Router::new().nest(
        "/model",
        Router::new()
            .route("/", post(insert_one))
            .route("/{id}", put(update_one))
            .route("/{id}", delete(delete_one))
            .route("/list", get(list))
            .route("/{id}/mapping", post(insert_mapping))
            .route("/{id}/mapping/list", get(list_mappings))
            .route("/mapping/{id}", delete(delete_mapping)),
    )
}
