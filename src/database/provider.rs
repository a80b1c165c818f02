use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use super::{DbResult, get_connection};
use crate::controller::BaseError;
use crate::utils::ID_GENERATOR;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, Debug)]
    #[diesel(table_name = provider)]
    pub struct Provider {
        pub id: i64,
        pub name: String,
        pub created_at: i64,
        pub updated_at: i64,
        pub deleted_at: Option<i64>,
    }

    #[derive(Insertable, Debug)]
    #[diesel(table_name = provider)]
    pub struct NewProvider {
        pub id: i64,
        pub name: String,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug, Default)]
    #[diesel(table_name = provider)]
    pub struct UpdateProviderData {
        pub name: Option<String>,
    }
}

impl Provider {
    pub fn create(name: &str) -> DbResult<Provider> {
        let now = Utc::now().timestamp_millis();
        let new_provider = NewProvider {
            id: ID_GENERATOR.generate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_provider = diesel::insert_into(provider::table)
                .values(NewProviderDb::to_db(&new_provider))
                .returning(ProviderDb::as_returning())
                .get_result::<ProviderDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to create provider: {}", e)))
                })?;
            Ok(db_provider.from_db())
        })
    }

    pub fn get_by_id(id_value: i64) -> DbResult<Provider> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_provider = provider::table
                .find(id_value)
                .filter(provider::dsl::deleted_at.is_null())
                .select(ProviderDb::as_select())
                .first::<ProviderDb>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => BaseError::ParamInvalid(Some(format!(
                        "Provider with id {} not found",
                        id_value
                    ))),
                    _ => BaseError::DatabaseFatal(Some(format!(
                        "Error fetching provider {}: {}",
                        id_value, e
                    ))),
                })?;
            Ok(db_provider.from_db())
        })
    }

    pub fn list_all() -> DbResult<Vec<Provider>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_providers = provider::table
                .filter(provider::dsl::deleted_at.is_null())
                .order(provider::dsl::created_at.desc())
                .select(ProviderDb::as_select())
                .load::<ProviderDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to list providers: {}", e)))
                })?;
            Ok(db_providers.into_iter().map(|p| p.from_db()).collect())
        })
    }

    pub fn update(id_value: i64, data: &UpdateProviderData) -> DbResult<Provider> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            let db_provider = diesel::update(provider::table.find(id_value))
                .set((
                    UpdateProviderDataDb::to_db(data),
                    provider::dsl::updated_at.eq(current_time),
                ))
                .returning(ProviderDb::as_returning())
                .get_result::<ProviderDb>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        BaseError::NotFound(Some(format!("Provider {} not found", id_value)))
                    }
                    _ => BaseError::DatabaseFatal(Some(format!(
                        "Failed to update provider {}: {}",
                        id_value, e
                    ))),
                })?;
            Ok(db_provider.from_db())
        })
    }

    pub fn delete(id_value: i64) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(provider::table.find(id_value))
                .set(provider::dsl::deleted_at.eq(current_time))
                .execute(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to delete provider {}: {}",
                        id_value, e
                    )))
                })
        })
    }
}
