use serde::Serialize;

use super::log_failure;
use crate::db::AppState;
use crate::error::ZoneError;
use crate::qualifier::count_qualifying_workouts;
use crate::recalculation::RecalculationResult;
use crate::workflow::{self, UpdateZonesRequest, ZoneSettingsResponse, ZoneSettingsView};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifyingCount {
  pub count: usize,
}

/// Current zones, or the defaults if none are saved
pub async fn read_zones(state: &AppState) -> Result<ZoneSettingsView, ZoneError> {
  log_failure("read_zones", workflow::read_zones(&state.db).await)
}

pub async fn update_zones(
  state: &AppState,
  request: &UpdateZonesRequest,
) -> Result<ZoneSettingsResponse, ZoneError> {
  log_failure("update_zones", workflow::update_zones(&state.db, request).await)
}

/// Workouts with enough heart rate data to be scored
pub async fn count_qualifying(state: &AppState) -> Result<QualifyingCount, ZoneError> {
  let count = log_failure("count_qualifying", count_qualifying_workouts(&state.db).await)?;
  Ok(QualifyingCount { count })
}

/// Re-score every qualifying workout against the saved zones
pub async fn recalculate_all(state: &AppState) -> Result<RecalculationResult, ZoneError> {
  log_failure(
    "recalculate_all",
    workflow::recalculate_with_saved_zones(&state.db, state.scorer.as_ref()).await,
  )
}

/// Update zones, then recalculate if `recalculate_existing` is set.
/// Recalculation problems never fail the update.
pub async fn update_zones_and_recalculate(
  state: &AppState,
  request: &UpdateZonesRequest,
) -> Result<ZoneSettingsResponse, ZoneError> {
  log_failure(
    "update_zones_and_recalculate",
    workflow::update_zones_and_recalculate(&state.db, state.scorer.as_ref(), request).await,
  )
}
