use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::ZoneError;
use crate::scoring::EffortScorer;

pub type DbPool = SqlitePool;

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  /// Relative effort scorer used by recalculation
  pub scorer: Arc<dyn EffortScorer>,
}

impl AppState {
  pub fn new(db: DbPool, scorer: Arc<dyn EffortScorer>) -> Self {
    Self { db, scorer }
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, ZoneError> {
  tracing::info!(database_url = %config.database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
