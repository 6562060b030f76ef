//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::UserRepository;
use blog_core::service::{BlogService, Repositories};
use blog_infra::InMemoryStore;

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use blog_infra::DatabaseConnections;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn from_repositories(repos: Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            blog: BlogService::new(repos),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::from_repositories(Arc::new(InMemoryStore::new()).repositories())
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        if let Some(repos) = connect_database(config).await {
            tracing::info!("Application state initialized (postgres)");
            return Self::from_repositories(repos);
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory()
    }
}

#[cfg(feature = "postgres")]
async fn connect_database(config: &AppConfig) -> Option<Repositories> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return None;
    };

    match DatabaseConnections::init(db_config).await {
        Ok(connections) => {
            if config.run_migrations {
                if let Err(e) = connections.migrate().await {
                    tracing::error!(error = %e, "Failed to apply migrations");
                }
            }
            Some(connections.repositories())
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            None
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn connect_database(config: &AppConfig) -> Option<Repositories> {
    if config.database.is_some() {
        tracing::warn!("Built without postgres feature - DATABASE_URL ignored");
    }
    None
}
