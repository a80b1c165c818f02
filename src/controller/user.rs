use axum::{
    Json, Router,
    extract::Path,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::database::DbResult;
use crate::database::user::{UpdateUserData, User};
use crate::utils::HttpResult;

#[derive(Deserialize)]
struct InsertUserRequest {
    name: String,
    #[serde(default)]
    credits: f64,
}

async fn insert_one(Json(payload): Json<InsertUserRequest>) -> DbResult<HttpResult<User>> {
    let user = User::create(&payload.name, payload.credits)?;
    Ok(HttpResult::new(user))
}

async fn list() -> DbResult<HttpResult<Vec<User>>> {
    let result = User::list_all()?;
    Ok(HttpResult::new(result))
}

async fn update_one(
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserData>,
) -> DbResult<HttpResult<User>> {
    let updated = User::update(id, &payload)?;
    Ok(HttpResult::new(updated))
}

async fn delete_one(Path(id): Path<i64>) -> DbResult<HttpResult<()>> {
    User::delete(id)?;
    Ok(HttpResult::new(()))
}

pub fn create_user_router() -> Router {
    Router::new().nest(
        "/user",
        Router::new()
            .route("/", post(insert_one))
            .route("/{id}", put(update_one))
            .route("/{id}", delete(delete_one))
            .route("/list", get(list)),
    )
}
