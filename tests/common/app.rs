use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use user_directory::build_router;
use user_directory::error::{AppError, AppResult};
use user_directory::models::{Enrichment, Sex};
use user_directory::repositories::InMemoryUserStore;
use user_directory::services::EnrichmentGateway;
use user_directory::state::AppState;

/// Gateway answering from a fixed table; unknown names fail every lookup
#[derive(Default)]
pub struct StubGateway {
    known: HashMap<String, Enrichment>,
}

impl StubGateway {
    pub fn with(mut self, name: &str, enrichment: Enrichment) -> Self {
        self.known.insert(name.to_string(), enrichment);
        self
    }

    fn get(&self, name: &str) -> AppResult<&Enrichment> {
        self.known
            .get(name)
            .ok_or_else(|| AppError::Enrichment(format!("unexpected status code: 404 for {}", name)))
    }
}

#[async_trait]
impl EnrichmentGateway for StubGateway {
    async fn age(&self, name: &str) -> AppResult<Option<i32>> {
        Ok(self.get(name)?.age)
    }

    async fn nationality(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.get(name)?.nationality.clone())
    }

    async fn sex(&self, name: &str) -> AppResult<Option<Sex>> {
        Ok(self.get(name)?.sex)
    }
}

pub fn default_gateway() -> StubGateway {
    StubGateway::default()
        .with(
            "Oliver",
            Enrichment {
                age: Some(31),
                nationality: Some("GB".to_string()),
                sex: Some(Sex::Male),
            },
        )
        .with(
            "Olivia",
            Enrichment {
                age: Some(29),
                nationality: Some("GB".to_string()),
                sex: Some(Sex::Female),
            },
        )
        .with(
            "Ivan",
            Enrichment {
                age: Some(44),
                nationality: Some("RU".to_string()),
                sex: None,
            },
        )
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryUserStore,
}

impl TestApp {
    /// Create a new test application backed by the in-memory store
    pub async fn new() -> Self {
        Self::with_gateway(default_gateway())
    }

    pub fn with_gateway(gateway: StubGateway) -> Self {
        let store = InMemoryUserStore::new();
        let state = AppState::with_services(Arc::new(store.clone()), Arc::new(gateway));

        let router = build_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }
}
