pub mod memory;
pub mod queries;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::PgUserStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{CreateUserInput, Pagination, UpdateUserInput, User, UserFilter};

/// Storage backend for users. Each operation maps to exactly one statement.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Count rows matching the filter
    async fn count_users(&self, filter: &UserFilter) -> AppResult<u64>;

    /// Fetch one page of rows matching the filter
    async fn search_users(
        &self,
        pagination: &Pagination,
        filter: &UserFilter,
    ) -> AppResult<Vec<User>>;

    /// Find a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Insert a user and return the persisted row
    async fn create_user(&self, input: &CreateUserInput) -> AppResult<User>;

    /// Patch a user and return the updated row
    async fn update_user_by_id(&self, id: Uuid, input: &UpdateUserInput) -> AppResult<User>;

    /// Delete a user and return the row as it was before deletion
    async fn delete_user_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Check that the backend is reachable
    async fn ping(&self) -> AppResult<()>;
}
