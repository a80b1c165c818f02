use chrono::Utc;
use diesel::prelude::*;
use rand::{Rng, distr::Alphanumeric, rng};
use serde::Deserialize;

use super::{DbResult, get_connection};
use crate::controller::BaseError;
use crate::utils::ID_GENERATOR;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, Debug)]
    #[diesel(table_name = api_key)]
    pub struct ApiKey {
        pub id: i64,
        #[diesel(column_name = key)]
        pub api_key: String,
        pub name: String,
        pub user_id: i64,
        pub credits_consumed: f64,
        pub is_enabled: bool,
        pub created_at: i64,
        pub updated_at: i64,
        pub deleted_at: Option<i64>,
    }

    #[derive(Insertable, Debug)]
    #[diesel(table_name = api_key)]
    pub struct NewApiKey {
        pub id: i64,
        #[diesel(column_name = key)]
        pub api_key: String,
        pub name: String,
        pub user_id: i64,
        pub credits_consumed: f64,
        pub is_enabled: bool,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug, Default)]
    #[diesel(table_name = api_key)]
    pub struct UpdateApiKeyData {
        pub name: Option<String>,
        pub is_enabled: Option<bool>,
    }
}

impl ApiKey {
    /// Creates a key for a user; the key value is generated server-side.
    pub fn create(name: &str, user_id_value: i64) -> DbResult<ApiKey> {
        let now = Utc::now().timestamp_millis();

        let random_part: String = rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let api_key_value = format!("tg-{}", random_part);

        let new_api_key = NewApiKey {
            id: ID_GENERATOR.generate_id(),
            api_key: api_key_value,
            name: name.to_string(),
            user_id: user_id_value,
            credits_consumed: 0.0,
            is_enabled: true,
            created_at: now,
            updated_at: now,
        };

        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_key = diesel::insert_into(api_key::table)
                .values(NewApiKeyDb::to_db(&new_api_key))
                .returning(ApiKeyDb::as_returning())
                .get_result::<ApiKeyDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to create api key: {}", e)))
                })?;
            Ok(db_key.from_db())
        })
    }

    /// Exact-match lookup honoring the enabled flag and soft deletion; a
    /// disabled or deleted key is indistinguishable from an unknown one.
    pub fn find_usable_by_key(key_value: &str) -> DbResult<Option<ApiKey>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_key = api_key::table
                .filter(api_key::dsl::key.eq(key_value))
                .filter(api_key::dsl::is_enabled.eq(true))
                .filter(api_key::dsl::deleted_at.is_null())
                .select(ApiKeyDb::as_select())
                .first::<ApiKeyDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Error fetching api key: {}", e)))
                })?;
            Ok(db_key.map(|k| k.from_db()))
        })
    }

    pub fn list_all() -> DbResult<Vec<ApiKey>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_keys = api_key::table
                .filter(api_key::dsl::deleted_at.is_null())
                .order(api_key::dsl::created_at.desc())
                .select(ApiKeyDb::as_select())
                .load::<ApiKeyDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to list api keys: {}", e)))
                })?;
            Ok(db_keys.into_iter().map(|k| k.from_db()).collect())
        })
    }

    pub fn update(id_value: i64, data: &UpdateApiKeyData) -> DbResult<ApiKey> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            let db_key = diesel::update(api_key::table.find(id_value))
                .set((
                    UpdateApiKeyDataDb::to_db(data),
                    api_key::dsl::updated_at.eq(current_time),
                ))
                .returning(ApiKeyDb::as_returning())
                .get_result::<ApiKeyDb>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        BaseError::NotFound(Some(format!("Api key {} not found", id_value)))
                    }
                    _ => BaseError::DatabaseFatal(Some(format!(
                        "Failed to update api key {}: {}",
                        id_value, e
                    ))),
                })?;
            Ok(db_key.from_db())
        })
    }

    pub fn delete(id_value: i64) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(api_key::table.find(id_value))
                .set((
                    api_key::dsl::deleted_at.eq(current_time),
                    api_key::dsl::is_enabled.eq(false),
                ))
                .execute(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to delete api key {}: {}",
                        id_value, e
                    )))
                })
        })
    }
}
