//! Operation surface for callers (CLI today). Every command takes the shared
//! [`AppState`] and returns serializable results or a [`ZoneError`].

pub mod zones;

use crate::db::AppState;
use crate::error::{ErrorKind, ZoneError};
use crate::models::Workout;
use crate::workout_store::list_recent_workouts;

/// Log unexpected failures with full detail before they reach the caller,
/// who only sees the generic message.
pub(crate) fn log_failure<T>(operation: &str, result: Result<T, ZoneError>) -> Result<T, ZoneError> {
  if let Err(e) = &result {
    if e.kind() == ErrorKind::Unexpected {
      tracing::error!(operation, error = %e, "Command failed");
    }
  }
  result
}

pub async fn get_workouts(state: &AppState, limit: Option<i64>) -> Result<Vec<Workout>, ZoneError> {
  let limit = limit.unwrap_or(50);
  log_failure("get_workouts", list_recent_workouts(&state.db, limit).await)
}
