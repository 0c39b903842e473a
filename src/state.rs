use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::Config;
use crate::repositories::{PgUserStore, UserStore};
use crate::services::{EnrichmentGateway, HttpEnrichmentGateway, UserService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    /// Present when backed by PostgreSQL, so the server can close the pool on shutdown
    pub db: Option<Arc<DatabaseConnection>>,
}

impl AppState {
    /// Connect to PostgreSQL and wire the HTTP enrichment gateway
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections)
            .sqlx_logging(true);

        let db = Arc::new(
            Database::connect(opt)
                .await
                .map_err(|e| AppStateError::Postgres(e.to_string()))?,
        );

        let gateway = HttpEnrichmentGateway::from_config(&config)
            .map_err(|e| AppStateError::HttpClient(e.to_string()))?;

        let mut state =
            Self::with_services(Arc::new(PgUserStore::new(db.clone())), Arc::new(gateway));
        state.db = Some(db);

        Ok(state)
    }

    /// Build state from explicit collaborators (used by tests)
    pub fn with_services(store: Arc<dyn UserStore>, gateway: Arc<dyn EnrichmentGateway>) -> Self {
        Self {
            users: Arc::new(UserService::new(store, gateway)),
            db: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
