use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::entity::user::{self, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserInput, Pagination, UpdateUserInput, User, UserFilter};
use crate::repositories::queries::{self, BuiltQuery, COUNT_ALIAS};
use crate::repositories::UserStore;

/// PostgreSQL-backed user store
pub struct PgUserStore {
    db: Arc<DatabaseConnection>,
}

impl PgUserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Run a statement that yields at most one user row
    async fn fetch_one(&self, query: BuiltQuery) -> AppResult<Option<User>> {
        tracing::debug!(sql = %query.sql, params = ?query.values, "Executing query");

        let model = UserEntity::find()
            .from_raw_sql(query.into_statement())
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn count_users(&self, filter: &UserFilter) -> AppResult<u64> {
        let query = queries::build_count(filter);
        tracing::debug!(sql = %query.sql, params = ?query.values, "Executing query");

        let row = self
            .db
            .query_one(query.into_statement())
            .await?
            .ok_or_else(|| AppError::Database("COUNT returned no row".to_string()))?;
        let count: i64 = row.try_get("", COUNT_ALIAS)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn search_users(
        &self,
        pagination: &Pagination,
        filter: &UserFilter,
    ) -> AppResult<Vec<User>> {
        let query = queries::build_search(filter, pagination);
        tracing::debug!(sql = %query.sql, params = ?query.values, "Executing query");

        let models = UserEntity::find()
            .from_raw_sql(query.into_statement())
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.fetch_one(queries::build_find_by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn create_user(&self, input: &CreateUserInput) -> AppResult<User> {
        self.fetch_one(queries::build_insert(input)?)
            .await?
            .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
    }

    async fn update_user_by_id(&self, id: Uuid, input: &UpdateUserInput) -> AppResult<User> {
        self.fetch_one(queries::build_update(id, input))
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn delete_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.fetch_one(queries::build_delete(id))
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}

// Conversion from SeaORM model to our domain model
impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            name: m.name,
            surname: m.surname,
            patronymic: m.patronymic,
            nationality: m.nationality,
            sex: m.sex.as_deref().and_then(|s| s.parse().ok()),
            age: m.age,
        }
    }
}
