//! Which workouts carry enough heart rate signal to be scored.
//!
//! A workout qualifies if any of these hold:
//! - at least one time-series sample has a heart rate
//! - it has a non-empty raw capture (may embed an average HR; not parsed here)
//! - its average heart rate is set
//!
//! The three predicates run as one query; ids come back as an ordered set, so
//! recalculation visits workouts in ascending id order.

use std::collections::BTreeSet;

use sqlx::SqlitePool;

use crate::error::ZoneError;

pub async fn find_qualifying_workout_ids(pool: &SqlitePool) -> Result<BTreeSet<i64>, ZoneError> {
  let ids: Vec<i64> = sqlx::query_scalar(
    r#"
    SELECT w.id
    FROM workouts w
    WHERE w.average_heartrate IS NOT NULL
       OR (w.raw_fit_data IS NOT NULL AND length(w.raw_fit_data) > 0)
       OR EXISTS (
         SELECT 1 FROM workout_samples s
         WHERE s.workout_id = w.id AND s.heart_rate_bpm IS NOT NULL
       )
    "#,
  )
  .fetch_all(pool)
  .await?;

  Ok(ids.into_iter().collect())
}

pub async fn count_qualifying_workouts(pool: &SqlitePool) -> Result<usize, ZoneError> {
  Ok(find_qualifying_workout_ids(pool).await?.len())
}
