use std::fmt::Debug;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateUserInput, Enrichment, Pagination, UpdateUserInput, User, UserFilter, UserPage,
};
use crate::repositories::UserStore;
use crate::services::EnrichmentGateway;

/// User use cases: enrichment on create, paired count+search on listing, and
/// error classification for everything that reaches the caller.
pub struct UserService {
    store: Arc<dyn UserStore>,
    gateway: Arc<dyn EnrichmentGateway>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, gateway: Arc<dyn EnrichmentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Count and fetch concurrently. The first failure drops the other query.
    pub async fn search_users(
        &self,
        pagination: Pagination,
        filter: UserFilter,
    ) -> AppResult<UserPage> {
        tracing::debug!(?pagination, ?filter, "Searching users");

        let (total, items) = tokio::try_join!(
            self.store.count_users(&filter),
            self.store.search_users(&pagination, &filter),
        )
        .map_err(|e| {
            tracing::error!(error = %e, ?pagination, ?filter, "Failed to search users");
            AppError::Unknown
        })?;

        tracing::debug!(total, items = items.len(), "Users fetched");
        Ok(UserPage { total, items })
    }

    /// Enrich then persist. Lookup failures only leave attributes empty.
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        tracing::debug!(name = %input.name, surname = %input.surname, "Creating user");

        let enrichment = self.enrich(&input.name).await;
        let input = input.with_enrichment(enrichment);

        let user = self.store.create_user(&input).await.map_err(|e| {
            tracing::error!(error = %e, ?input, "Failed to create user");
            AppError::Unknown
        })?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Run the three lookups concurrently and wait for all of them.
    pub async fn enrich(&self, name: &str) -> Enrichment {
        let (age, nationality, sex) = tokio::join!(
            self.gateway.age(name),
            self.gateway.nationality(name),
            self.gateway.sex(name),
        );

        Enrichment {
            age: settle("age", name, age),
            nationality: settle("nationality", name, nationality),
            sex: settle("sex", name, sex),
        }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.store
            .find_user_by_id(id)
            .await
            .map_err(|e| classify("find", id, e))
    }

    pub async fn update_user_by_id(&self, id: Uuid, input: UpdateUserInput) -> AppResult<User> {
        if input.is_empty() {
            tracing::debug!(user_id = %id, "Empty patch, only updated_at will change");
        }

        let user = self
            .store
            .update_user_by_id(id, &input)
            .await
            .map_err(|e| classify("update", id, e))?;

        tracing::info!(user_id = %id, "User updated");
        Ok(user)
    }

    pub async fn delete_user_by_id(&self, id: Uuid) -> AppResult<User> {
        let user = self
            .store
            .delete_user_by_id(id)
            .await
            .map_err(|e| classify("delete", id, e))?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(user)
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await.map_err(|e| {
            tracing::error!(error = %e, "Store ping failed");
            AppError::Unknown
        })
    }
}

/// Collapse one lookup outcome into presence/absence.
fn settle<T: Debug>(attribute: &'static str, name: &str, result: AppResult<Option<T>>) -> Option<T> {
    match result {
        Ok(Some(value)) => {
            tracing::debug!(attribute, name, ?value, "Enrichment lookup succeeded");
            Some(value)
        }
        Ok(None) => {
            tracing::warn!(attribute, name, "Enrichment lookup returned no value");
            None
        }
        Err(e) => {
            tracing::warn!(attribute, name, error = %e, "Enrichment lookup failed");
            None
        }
    }
}

fn classify(operation: &'static str, id: Uuid, err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => {
            tracing::warn!(operation, user_id = %id, "User not found");
            AppError::NotFound("User".to_string())
        }
        AppError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
        other => {
            tracing::error!(operation, user_id = %id, error = %other, "User operation failed");
            AppError::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::models::Sex;
    use crate::repositories::InMemoryUserStore;

    /// Gateway answering every lookup from fixed values
    struct StubGateway(Enrichment);

    #[async_trait]
    impl EnrichmentGateway for StubGateway {
        async fn age(&self, _name: &str) -> AppResult<Option<i32>> {
            Ok(self.0.age)
        }

        async fn nationality(&self, _name: &str) -> AppResult<Option<String>> {
            Ok(self.0.nationality.clone())
        }

        async fn sex(&self, _name: &str) -> AppResult<Option<Sex>> {
            Ok(self.0.sex)
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl EnrichmentGateway for FailingGateway {
        async fn age(&self, _name: &str) -> AppResult<Option<i32>> {
            Err(AppError::Enrichment("unexpected status code: 500".to_string()))
        }

        async fn nationality(&self, _name: &str) -> AppResult<Option<String>> {
            Err(AppError::Enrichment("connection refused".to_string()))
        }

        async fn sex(&self, _name: &str) -> AppResult<Option<Sex>> {
            Err(AppError::Enrichment("timed out".to_string()))
        }
    }

    /// Age succeeds, nationality fails, sex is empty
    struct MixedGateway;

    #[async_trait]
    impl EnrichmentGateway for MixedGateway {
        async fn age(&self, _name: &str) -> AppResult<Option<i32>> {
            Ok(Some(44))
        }

        async fn nationality(&self, _name: &str) -> AppResult<Option<String>> {
            Err(AppError::Enrichment("unexpected status code: 429".to_string()))
        }

        async fn sex(&self, _name: &str) -> AppResult<Option<Sex>> {
            Ok(None)
        }
    }

    /// Every lookup waits until all three have started
    struct RendezvousGateway(Barrier);

    #[async_trait]
    impl EnrichmentGateway for RendezvousGateway {
        async fn age(&self, _name: &str) -> AppResult<Option<i32>> {
            self.0.wait().await;
            Ok(Some(25))
        }

        async fn nationality(&self, _name: &str) -> AppResult<Option<String>> {
            self.0.wait().await;
            Ok(Some("PL".to_string()))
        }

        async fn sex(&self, _name: &str) -> AppResult<Option<Sex>> {
            self.0.wait().await;
            Err(AppError::Enrichment("unexpected status code: 503".to_string()))
        }
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Store whose count fails at once while search never finishes
    #[derive(Default)]
    struct FailingCountStore {
        search_dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl UserStore for FailingCountStore {
        async fn count_users(&self, _filter: &UserFilter) -> AppResult<u64> {
            // let the search start before failing
            tokio::task::yield_now().await;
            Err(AppError::Database("canceling statement due to timeout".to_string()))
        }

        async fn search_users(
            &self,
            _pagination: &Pagination,
            _filter: &UserFilter,
        ) -> AppResult<Vec<User>> {
            let _guard = SetOnDrop(self.search_dropped.clone());
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }

        async fn find_user_by_id(&self, _id: Uuid) -> AppResult<User> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn create_user(&self, _input: &CreateUserInput) -> AppResult<User> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn update_user_by_id(&self, _id: Uuid, _input: &UpdateUserInput) -> AppResult<User> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn delete_user_by_id(&self, _id: Uuid) -> AppResult<User> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    /// Store whose count and search only finish when both are running
    struct RendezvousStore {
        inner: InMemoryUserStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl UserStore for RendezvousStore {
        async fn count_users(&self, filter: &UserFilter) -> AppResult<u64> {
            self.barrier.wait().await;
            self.inner.count_users(filter).await
        }

        async fn search_users(
            &self,
            pagination: &Pagination,
            filter: &UserFilter,
        ) -> AppResult<Vec<User>> {
            self.barrier.wait().await;
            self.inner.search_users(pagination, filter).await
        }

        async fn find_user_by_id(&self, id: Uuid) -> AppResult<User> {
            self.inner.find_user_by_id(id).await
        }

        async fn create_user(&self, input: &CreateUserInput) -> AppResult<User> {
            self.inner.create_user(input).await
        }

        async fn update_user_by_id(&self, id: Uuid, input: &UpdateUserInput) -> AppResult<User> {
            self.inner.update_user_by_id(id, input).await
        }

        async fn delete_user_by_id(&self, id: Uuid) -> AppResult<User> {
            self.inner.delete_user_by_id(id).await
        }

        async fn ping(&self) -> AppResult<()> {
            self.inner.ping().await
        }
    }

    /// Store where every statement fails with a backend error
    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn count_users(&self, _filter: &UserFilter) -> AppResult<u64> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn search_users(
            &self,
            _pagination: &Pagination,
            _filter: &UserFilter,
        ) -> AppResult<Vec<User>> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn find_user_by_id(&self, _id: Uuid) -> AppResult<User> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn create_user(&self, _input: &CreateUserInput) -> AppResult<User> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn update_user_by_id(&self, _id: Uuid, _input: &UpdateUserInput) -> AppResult<User> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn delete_user_by_id(&self, _id: Uuid) -> AppResult<User> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn ping(&self) -> AppResult<()> {
            Err(AppError::Database("connection refused".to_string()))
        }
    }

    fn oliver_enrichment() -> Enrichment {
        Enrichment {
            age: Some(31),
            nationality: Some("GB".to_string()),
            sex: Some(Sex::Male),
        }
    }

    fn service_with(
        store: Arc<dyn UserStore>,
        gateway: Arc<dyn EnrichmentGateway>,
    ) -> UserService {
        UserService::new(store, gateway)
    }

    fn new_user(name: &str, surname: &str) -> CreateUserInput {
        CreateUserInput::new(name.to_string(), surname.to_string(), None)
    }

    #[tokio::test]
    async fn test_create_and_delete_round_trip() {
        let service = service_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(StubGateway(oliver_enrichment())),
        );

        let created = service
            .create_user(new_user("Oliver", "Smith"))
            .await
            .unwrap();

        assert_eq!(created.name, "Oliver");
        assert_eq!(created.surname, "Smith");
        assert_eq!(created.age, Some(31));
        assert_eq!(created.nationality.as_deref(), Some("GB"));
        assert_eq!(created.sex, Some(Sex::Male));
        assert_eq!(created.patronymic, None);
        assert!(!created.id.is_nil());

        let fetched = service.get_user_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);

        let deleted = service.delete_user_by_id(created.id).await.unwrap();
        assert_eq!(deleted, created);
    }

    #[tokio::test]
    async fn test_create_succeeds_when_all_lookups_fail() {
        let service = service_with(Arc::new(InMemoryUserStore::new()), Arc::new(FailingGateway));

        let created = service
            .create_user(CreateUserInput::new(
                "Oliver".to_string(),
                "Smith".to_string(),
                Some("James".to_string()),
            ))
            .await
            .unwrap();

        assert_eq!(created.patronymic.as_deref(), Some("James"));
        assert_eq!(created.age, None);
        assert_eq!(created.nationality, None);
        assert_eq!(created.sex, None);
    }

    #[tokio::test]
    async fn test_create_keeps_each_lookup_independent() {
        let service = service_with(Arc::new(InMemoryUserStore::new()), Arc::new(MixedGateway));

        let created = service.create_user(new_user("Ivan", "Petrov")).await.unwrap();

        assert_eq!(created.age, Some(44));
        assert_eq!(created.nationality, None);
        assert_eq!(created.sex, None);
    }

    #[tokio::test]
    async fn test_enrichment_lookups_run_concurrently() {
        let service = service_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(RendezvousGateway(Barrier::new(3))),
        );

        let enrichment = tokio::time::timeout(Duration::from_secs(5), service.enrich("Jan"))
            .await
            .expect("lookups did not run concurrently");

        assert_eq!(enrichment.age, Some(25));
        assert_eq!(enrichment.nationality.as_deref(), Some("PL"));
        assert_eq!(enrichment.sex, None);
    }

    #[tokio::test]
    async fn test_create_persistence_failure_is_unknown() {
        let service = service_with(Arc::new(BrokenStore), Arc::new(StubGateway(oliver_enrichment())));

        let result = service.create_user(new_user("Oliver", "Smith")).await;
        assert!(matches!(result, Err(AppError::Unknown)));
    }

    #[tokio::test]
    async fn test_search_returns_total_and_page() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service_with(store.clone(), Arc::new(FailingGateway));
        for name in ["Oliver", "Olivia", "Ivan"] {
            service.create_user(new_user(name, "Smith")).await.unwrap();
        }

        let filter = UserFilter {
            name: Some("oliv".to_string()),
            ..Default::default()
        };
        let page = service
            .search_users(Pagination::clamped(Some(1), None), filter)
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Oliver");
    }

    #[tokio::test]
    async fn test_search_runs_count_and_fetch_concurrently() {
        let store = RendezvousStore {
            inner: InMemoryUserStore::new(),
            barrier: Barrier::new(2),
        };
        let service = service_with(Arc::new(store), Arc::new(FailingGateway));

        let page = tokio::time::timeout(
            Duration::from_secs(5),
            service.search_users(Pagination::clamped(None, None), UserFilter::default()),
        )
        .await
        .expect("count and search did not run concurrently")
        .unwrap();

        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_search_fails_fast_and_cancels_sibling() {
        let store = Arc::new(FailingCountStore::default());
        let search_dropped = store.search_dropped.clone();
        let service = service_with(store, Arc::new(FailingGateway));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.search_users(Pagination::clamped(None, None), UserFilter::default()),
        )
        .await
        .expect("search was not cancelled after count failed");

        assert!(matches!(result, Err(AppError::Unknown)));
        assert!(search_dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let service = service_with(Arc::new(InMemoryUserStore::new()), Arc::new(FailingGateway));
        let id = Uuid::new_v4();

        let update = service
            .update_user_by_id(id, UpdateUserInput::default())
            .await;
        assert!(matches!(update, Err(AppError::NotFound(_))));

        let delete = service.delete_user_by_id(id).await;
        assert!(matches!(delete, Err(AppError::NotFound(_))));

        let get = service.get_user_by_id(id).await;
        assert!(matches!(get, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_backend_failures_are_unknown() {
        let service = service_with(Arc::new(BrokenStore), Arc::new(FailingGateway));
        let id = Uuid::new_v4();

        assert!(matches!(
            service.update_user_by_id(id, UpdateUserInput::default()).await,
            Err(AppError::Unknown)
        ));
        assert!(matches!(
            service.delete_user_by_id(id).await,
            Err(AppError::Unknown)
        ));
        assert!(matches!(
            service
                .search_users(Pagination::default(), UserFilter::default())
                .await,
            Err(AppError::Unknown)
        ));
        assert!(matches!(service.ping().await, Err(AppError::Unknown)));
    }

    #[tokio::test]
    async fn test_update_applies_only_present_fields() {
        let service = service_with(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(StubGateway(oliver_enrichment())),
        );
        let created = service
            .create_user(new_user("Oliver", "Smith"))
            .await
            .unwrap();

        let patch = UpdateUserInput {
            surname: Some("Jones".to_string()),
            age: Some(32),
            ..Default::default()
        };
        let updated = service.update_user_by_id(created.id, patch).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Oliver");
        assert_eq!(updated.surname, "Jones");
        assert_eq!(updated.age, Some(32));
        assert_eq!(updated.nationality.as_deref(), Some("GB"));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }
}
