use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use super::{DbResult, get_connection};
use crate::controller::BaseError;
use crate::utils::ID_GENERATOR;
use crate::{db_execute, db_object};

db_object! {
    #[derive(Queryable, Selectable, Identifiable, Debug)]
    #[diesel(table_name = users)]
    pub struct User {
        pub id: i64,
        pub name: String,
        pub credits: f64,
        pub created_at: i64,
        pub updated_at: i64,
        pub deleted_at: Option<i64>,
    }

    #[derive(Insertable, Debug)]
    #[diesel(table_name = users)]
    pub struct NewUser {
        pub id: i64,
        pub name: String,
        pub credits: f64,
        pub created_at: i64,
        pub updated_at: i64,
    }

    #[derive(AsChangeset, Deserialize, Debug, Default)]
    #[diesel(table_name = users)]
    pub struct UpdateUserData {
        pub name: Option<String>,
        pub credits: Option<f64>,
    }
}

impl User {
    pub fn create(name: &str, credits: f64) -> DbResult<User> {
        let now = Utc::now().timestamp_millis();
        let new_user = NewUser {
            id: ID_GENERATOR.generate_id(),
            name: name.to_string(),
            credits,
            created_at: now,
            updated_at: now,
        };

        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user = diesel::insert_into(users::table)
                .values(NewUserDb::to_db(&new_user))
                .returning(UserDb::as_returning())
                .get_result::<UserDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to create user: {}", e)))
                })?;
            Ok(db_user.from_db())
        })
    }

    /// Looks up a non-deleted user; `None` when the row is missing or soft-deleted.
    pub fn find_active_by_id(id_value: i64) -> DbResult<Option<User>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_user = users::table
                .find(id_value)
                .filter(users::dsl::deleted_at.is_null())
                .select(UserDb::as_select())
                .first::<UserDb>(conn)
                .optional()
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Error fetching user {}: {}",
                        id_value, e
                    )))
                })?;
            Ok(db_user.map(|u| u.from_db()))
        })
    }

    pub fn list_all() -> DbResult<Vec<User>> {
        let conn = &mut get_connection();
        db_execute!(conn, {
            let db_users = users::table
                .filter(users::dsl::deleted_at.is_null())
                .order(users::dsl::created_at.desc())
                .select(UserDb::as_select())
                .load::<UserDb>(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!("Failed to list users: {}", e)))
                })?;
            Ok(db_users.into_iter().map(|u| u.from_db()).collect())
        })
    }

    pub fn update(id_value: i64, data: &UpdateUserData) -> DbResult<User> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            let db_user = diesel::update(users::table.find(id_value))
                .set((
                    UpdateUserDataDb::to_db(data),
                    users::dsl::updated_at.eq(current_time),
                ))
                .returning(UserDb::as_returning())
                .get_result::<UserDb>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        BaseError::NotFound(Some(format!("User {} not found", id_value)))
                    }
                    _ => BaseError::DatabaseFatal(Some(format!(
                        "Failed to update user {}: {}",
                        id_value, e
                    ))),
                })?;
            Ok(db_user.from_db())
        })
    }

    pub fn delete(id_value: i64) -> DbResult<usize> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            diesel::update(users::table.find(id_value))
                .set(users::dsl::deleted_at.eq(current_time))
                .execute(conn)
                .map_err(|e| {
                    BaseError::DatabaseFatal(Some(format!(
                        "Failed to delete user {}: {}",
                        id_value, e
                    )))
                })
        })
    }

    /// Applies a completed call's charge: debits the user's balance and bumps
    /// the key's consumption counter in one transaction. Arithmetic happens in
    /// SQL so concurrent charges compose; the balance is allowed to go
    /// negative (only the pre-call check enforces a floor).
    pub fn charge_for_usage(user_id_value: i64, api_key_id_value: i64, amount: f64) -> DbResult<()> {
        let conn = &mut get_connection();
        let current_time = Utc::now().timestamp_millis();

        db_execute!(conn, {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::update(users::table.find(user_id_value))
                    .set((
                        users::dsl::credits.eq(users::dsl::credits - amount),
                        users::dsl::updated_at.eq(current_time),
                    ))
                    .execute(conn)?;
                diesel::update(api_key::table.find(api_key_id_value))
                    .set((
                        api_key::dsl::credits_consumed
                            .eq(api_key::dsl::credits_consumed + amount),
                        api_key::dsl::updated_at.eq(current_time),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .map_err(|e| {
                BaseError::DatabaseFatal(Some(format!(
                    "Failed to record usage charge for user {}: {}",
                    user_id_value, e
                )))
            })
        })
    }
}
