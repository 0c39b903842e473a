use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateUserInput, Pagination, UpdateUserInput, User, UserFilter};
use crate::repositories::UserStore;

/// In-memory user store for tests and local runs without PostgreSQL.
/// Rows are kept in insertion order, which stands in for storage order.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

fn matches(user: &User, filter: &UserFilter) -> bool {
    filter
        .name
        .as_deref()
        .map_or(true, |n| contains_ci(Some(&user.name), n))
        && filter
            .surname
            .as_deref()
            .map_or(true, |s| contains_ci(Some(&user.surname), s))
        && filter
            .patronymic
            .as_deref()
            .map_or(true, |p| contains_ci(user.patronymic.as_deref(), p))
        && filter
            .nationality
            .as_ref()
            .map_or(true, |n| user.nationality.as_ref() == Some(n))
        && filter.sex.map_or(true, |s| user.sex == Some(s))
        && filter.age.map_or(true, |a| user.age == Some(a))
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn count_users(&self, filter: &UserFilter) -> AppResult<u64> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| matches(u, filter)).count() as u64)
    }

    async fn search_users(
        &self,
        pagination: &Pagination,
        filter: &UserFilter,
    ) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let offset = pagination.offset.unwrap_or(0) as usize;
        let limit = pagination.limit.map_or(usize::MAX, |l| l as usize);

        Ok(users
            .iter()
            .filter(|u| matches(u, filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn create_user(&self, input: &CreateUserInput) -> AppResult<User> {
        let now = time::OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: input.name.clone(),
            surname: input.surname.clone(),
            patronymic: input.patronymic.clone(),
            nationality: input.nationality.clone(),
            sex: input.sex,
            age: input.age,
        };

        self.users.write().await.push(user.clone());
        Ok(user)
    }

    async fn update_user_by_id(&self, id: Uuid, input: &UpdateUserInput) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if let Some(name) = &input.name {
            user.name = name.clone();
        }
        if let Some(surname) = &input.surname {
            user.surname = surname.clone();
        }
        if let Some(patronymic) = &input.patronymic {
            user.patronymic = Some(patronymic.clone());
        }
        if let Some(nationality) = &input.nationality {
            user.nationality = Some(nationality.clone());
        }
        if let Some(age) = input.age {
            user.age = Some(age);
        }
        if let Some(sex) = input.sex {
            user.sex = Some(sex);
        }
        user.updated_at = time::OffsetDateTime::now_utc();

        Ok(user.clone())
    }

    async fn delete_user_by_id(&self, id: Uuid) -> AppResult<User> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(users.remove(index))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
