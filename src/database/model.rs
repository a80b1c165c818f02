use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{DbResult, get_connection};
use crate::controller::BaseError;
use crate::utils::ID_GENERATOR;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, Debug)]
    #[diesel(table_name = model)]
    pub struct Model {
        pub id: i64,
        pub slug: String,
        pub description: Option<String>,
        pub created_at: i64,
        pub updated_at: i64,
        pub deleted_at: Option<i64>,
    }

    #[derive(Insertable, Debug)]
    #[diesel(table_name = model)]
    pub struct NewModel {
        pub id: i64,
        pub slug: String,
        pub description: Option<String>,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug, Default)]
    #[diesel(table_name = model)]
    pub struct UpdateModelData {
        pub slug: Option<String>,
        pub description: Option<Option<String>>,
    }

    #[derive(Queryable, Selectable, Identifiable, Debug)]
    #[diesel(table_name = model_provider_mapping)]
    pub struct ModelProviderMapping {
        pub id: i64,
        pub model_id: i64,
        pub provider_id: i64,
        pub input_token_cost: f64,
        pub output_token_cost: f64,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(Insertable, Debug)]
    #[diesel(table_name = model_provider_mapping)]
    pub struct NewModelProviderMapping {
        pub id: i64,
        pub model_id: i64,
        pub provider_id: i64,
        pub input_token_cost: f64,
        pub output_token_cost: f64,
        pub created_at: i64,
        pub updated_at: i64,
    }
}

/// A provider mapping joined with the provider's display name; one of these
/// is the unit of provider selection for a request.
#[derive(Debug, Clone, Serialize)]
pub struct MappingDetail {
    pub mapping: ModelProviderMapping,
    pub provider_name: String,
}

impl Model {
    pub fn create(slug: &str, description: Option<&str>) -> DbResult<Model> {
        let now = Utc::now().timestamp_millis();
        let new_model = NewModel {
            id: ID_GENERATOR.generate_id(),
            slug: slug.to_string(),
            description: description.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        };

        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_model = diesel::insert_into(model::table)
                .values(NewModelDb::to_db(&new_model))
                .returning(ModelDb::as_returning())
                .get_result::<ModelDb>(conn)
                .map_err(BaseError::from)?;
            Ok(db_model.from_db())
        })
    }

    /// Catalog lookup by the public model string; row existence is the sole
    /// validity check the gateway performs.
    pub fn find_by_slug(slug_value: &str) -> DbResult<Option<Model>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_model = model::table
                .filter(model::dsl::slug.eq(slug_value))
                .filter(model::dsl::deleted_at.is_null())
                .select(ModelDb::as_select())
                .first::<ModelDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Error fetching model '{}': {}",
                        slug_value, e
                    )))
                })?;
            Ok(db_model.map(|m| m.from_db()))
        })
    }

    pub fn list_all() -> DbResult<Vec<Model>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_models = model::table
                .filter(model::dsl::deleted_at.is_null())
                .order(model::dsl::created_at.desc())
                .select(ModelDb::as_select())
                .load::<ModelDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to list models: {}", e)))
                })?;
            Ok(db_models.into_iter().map(|m| m.from_db()).collect())
        })
    }

    pub fn update(id_value: i64, data: &UpdateModelData) -> DbResult<Model> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            let db_model = diesel::update(model::table.find(id_value))
                .set((
                    UpdateModelDataDb::to_db(data),
                    model::dsl::updated_at.eq(current_time),
                ))
                .returning(ModelDb::as_returning())
                .get_result::<ModelDb>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        BaseError::NotFound(Some(format!("Model {} not found", id_value)))
                    }
                    _ => BaseError::DatabaseFatal(Some(format!(
                        "Failed to update model {}: {}",
                        id_value, e
                    ))),
                })?;
            Ok(db_model.from_db())
        })
    }

    pub fn delete(id_value: i64) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(model::table.find(id_value))
                .set(model::dsl::deleted_at.eq(current_time))
                .execute(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to delete model {}: {}",
                        id_value, e
                    )))
                })
        })
    }
}

impl ModelProviderMapping {
    pub fn create(
        model_id_value: i64,
        provider_id_value: i64,
        input_token_cost: f64,
        output_token_cost: f64,
    ) -> DbResult<ModelProviderMapping> {
        let now = Utc::now().timestamp_millis();
        let new_mapping = NewModelProviderMapping {
            id: ID_GENERATOR.generate_id(),
            model_id: model_id_value,
            provider_id: provider_id_value,
            input_token_cost,
            output_token_cost,
            created_at: now,
            updated_at: now,
        };

        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_mapping = diesel::insert_into(model_provider_mapping::table)
                .values(NewModelProviderMappingDb::to_db(&new_mapping))
                .returning(ModelProviderMappingDb::as_returning())
                .get_result::<ModelProviderMappingDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to create provider mapping: {}",
                        e
                    )))
                })?;
            Ok(db_mapping.from_db())
        })
    }

    /// The eligible-provider pool for a model: every mapping row joined with
    /// its (non-deleted) provider. Queried fresh on every request.
    pub fn list_for_model(model_id_value: i64) -> DbResult<Vec<MappingDetail>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let rows = model_provider_mapping::table
                .inner_join(provider::table)
                .filter(model_provider_mapping::dsl::model_id.eq(model_id_value))
                .filter(provider::dsl::deleted_at.is_null())
                .select((ModelProviderMappingDb::as_select(), provider::dsl::name))
                .load::<(ModelProviderMappingDb, String)>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to list provider mappings for model {}: {}",
                        model_id_value, e
                    )))
                })?;
            Ok(rows
                .into_iter()
                .map(|(db_mapping, provider_name)| MappingDetail {
                    mapping: db_mapping.from_db(),
                    provider_name,
                })
                .collect())
        })
    }

    pub fn delete(id_value: i64) -> DbResult<usize> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            diesel::delete(model_provider_mapping::table.find(id_value))
                .execute(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to delete provider mapping {}: {}",
                        id_value, e
                    )))
                })
        })
    }
}
