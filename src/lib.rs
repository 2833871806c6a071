pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod qualifier;
pub mod recalculation;
pub mod scoring;
pub mod settings_store;
pub mod workflow;
pub mod workout_store;
pub mod zones;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

pub use config::AppConfig;
pub use db::AppState;
pub use error::{ErrorKind, ScoringError, ZoneError};
pub use scoring::{EffortScorer, ZoneWeightedScorer};

/// Open the database (running migrations) and build state with the default scorer
pub async fn init_app(config: &AppConfig) -> Result<AppState, ZoneError> {
  let pool = db::initialize_db(config).await?;
  Ok(AppState::new(pool, Arc::new(ZoneWeightedScorer)))
}
