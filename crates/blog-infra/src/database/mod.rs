//! Database connection management, SeaORM entities, repositories and migrations.

mod connections;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
pub mod migrator;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;
#[cfg(feature = "postgres")]
pub use migrator::Migrator;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// SeaORM-backed implementations of every repository port.
    pub fn repositories(&self) -> blog_core::service::Repositories {
        use std::sync::Arc;

        blog_core::service::Repositories {
            users: Arc::new(PostgresUserRepository::new(self.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(self.main.clone())),
            comments: Arc::new(PostgresCommentRepository::new(self.main.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(self.main.clone())),
            locations: Arc::new(PostgresLocationRepository::new(self.main.clone())),
        }
    }
}

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
