//! Migration CLI tool.
//!
//! Wraps the sea-orm-migration CLI (`up`, `down`, `status`, `fresh`, ...)
//! around the blog schema. Reads `DATABASE_URL` from the environment.

use blog_infra::database::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Running blog schema migrations");
    cli::run_cli(Migrator).await;
}
