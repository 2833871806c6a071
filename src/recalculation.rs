//! Bulk relative effort recalculation
//!
//! Every qualifying workout is re-scored against one zone set. Scoring is
//! isolated per workout: a failure is counted and recorded, then the batch
//! moves on. All resulting updates are written in a single transaction.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::ZoneError;
use crate::models::HeartRateZones;
use crate::qualifier::find_qualifying_workout_ids;
use crate::scoring::EffortScorer;
use crate::workout_store::{list_workouts_by_ids, update_relative_efforts};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutScoringError {
  pub workout_id: i64,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalculationResult {
  pub updated_count: usize,
  pub total_qualifying: usize,
  pub error_count: usize,
  /// Present only when at least one workout failed
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<WorkoutScoringError>>,
}

impl RecalculationResult {
  fn empty() -> Self {
    Self {
      updated_count: 0,
      total_qualifying: 0,
      error_count: 0,
      errors: None,
    }
  }
}

/// Re-score every qualifying workout against `zones`.
///
/// Per-workout scoring errors never fail the call. An `Err` means the batch
/// itself could not run or commit, in which case no workout was changed.
pub async fn recalculate_all(
  pool: &SqlitePool,
  zones: &HeartRateZones,
  scorer: &dyn EffortScorer,
) -> Result<RecalculationResult, ZoneError> {
  let ids: Vec<i64> = find_qualifying_workout_ids(pool).await?.into_iter().collect();
  if ids.is_empty() {
    tracing::info!("No workouts with heart rate data; nothing to recalculate");
    return Ok(RecalculationResult::empty());
  }

  let workouts = list_workouts_by_ids(pool, &ids).await?;
  let total_qualifying = workouts.len();

  let mut updates: Vec<(i64, f64)> = Vec::new();
  let mut errors: Vec<WorkoutScoringError> = Vec::new();

  for workout in &workouts {
    match scorer.score(workout, zones) {
      Ok(Some(relative_effort)) => {
        tracing::debug!(workout_id = workout.id, relative_effort, "Scored workout");
        updates.push((workout.id, relative_effort));
      }
      Ok(None) => {
        tracing::debug!(workout_id = workout.id, "No score for workout; keeping previous value");
      }
      Err(e) => {
        tracing::warn!(workout_id = workout.id, error = %e, "Failed to score workout");
        errors.push(WorkoutScoringError {
          workout_id: workout.id,
          message: e.to_string(),
        });
      }
    }
  }

  update_relative_efforts(pool, &updates).await?;

  tracing::info!(
    updated = updates.len(),
    total = total_qualifying,
    failed = errors.len(),
    "Relative effort recalculation complete"
  );

  Ok(RecalculationResult {
    updated_count: updates.len(),
    total_qualifying,
    error_count: errors.len(),
    errors: if errors.is_empty() { None } else { Some(errors) },
  })
}
