use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::config::AppConfig;

fn pool_options(config: &AppConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
}

/// Connects to Postgres and logs the outcome. An unreachable database does
/// not stop startup: the pool falls back to lazy connection and store calls
/// fail until it comes up.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    match pool_options(config).connect(&config.database_url).await {
        Ok(pool) => {
            info!("connected to database");
            Ok(pool)
        }
        Err(e) => {
            error!(error = %e, "error connecting to database");
            pool_options(config)
                .connect_lazy(&config.database_url)
                .context("parse DATABASE_URL")
        }
    }
}

pub async fn migrate(pool: &PgPool) {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => info!("migrations applied"),
        Err(e) => tracing::warn!(error = %e, "migration failed; continuing"),
    }
}
