//! Workout persistence used by recalculation

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::ZoneError;
use crate::models::{NewWorkout, Workout, WorkoutSample};

/// Keeps `IN (...)` lists well under SQLite's bound-parameter limit
const ID_CHUNK_SIZE: usize = 500;

const WORKOUT_COLUMNS: &str = "id, strava_id, activity_type, started_at, duration_seconds, \
   average_heartrate, max_heartrate, raw_fit_data, relative_effort";

/// Insert a workout, returning its id
pub async fn insert_workout(pool: &SqlitePool, workout: &NewWorkout) -> Result<i64, ZoneError> {
  let result = sqlx::query(
    r#"
    INSERT INTO workouts (
      strava_id, activity_type, started_at, duration_seconds,
      average_heartrate, max_heartrate, raw_fit_data
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
  )
  .bind(&workout.strava_id)
  .bind(&workout.activity_type)
  .bind(workout.started_at)
  .bind(workout.duration_seconds)
  .bind(workout.average_heartrate)
  .bind(workout.max_heartrate)
  .bind(&workout.raw_fit_data)
  .execute(pool)
  .await?;

  Ok(result.last_insert_rowid())
}

/// Store time-series samples for a workout as `(offset_seconds, heart_rate_bpm)`
pub async fn insert_samples(
  pool: &SqlitePool,
  workout_id: i64,
  samples: &[(i64, Option<i64>)],
) -> Result<(), ZoneError> {
  let mut tx = pool.begin().await?;

  for (offset_seconds, heart_rate_bpm) in samples {
    sqlx::query(
      r#"
      INSERT INTO workout_samples (workout_id, offset_seconds, heart_rate_bpm)
      VALUES (?1, ?2, ?3)
      "#,
    )
    .bind(workout_id)
    .bind(offset_seconds)
    .bind(heart_rate_bpm)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;
  Ok(())
}

/// Fetch full workout records, samples included, for the given ids.
/// Unknown ids are skipped. Results are ordered by id.
pub async fn list_workouts_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Workout>, ZoneError> {
  let mut workouts = Vec::with_capacity(ids.len());
  let mut samples: HashMap<i64, Vec<WorkoutSample>> = HashMap::new();

  for chunk in ids.chunks(ID_CHUNK_SIZE) {
    let mut query: QueryBuilder<Sqlite> =
      QueryBuilder::new(format!("SELECT {} FROM workouts WHERE id IN (", WORKOUT_COLUMNS));
    let mut separated = query.separated(", ");
    for id in chunk {
      separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    workouts.extend(query.build_query_as::<Workout>().fetch_all(pool).await?);

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
      "SELECT workout_id, offset_seconds, heart_rate_bpm, watts FROM workout_samples WHERE workout_id IN (",
    );
    let mut separated = query.separated(", ");
    for id in chunk {
      separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY workout_id, offset_seconds");

    for sample in query.build_query_as::<WorkoutSample>().fetch_all(pool).await? {
      samples.entry(sample.workout_id).or_default().push(sample);
    }
  }

  for workout in &mut workouts {
    workout.samples = samples.remove(&workout.id).unwrap_or_default();
  }
  workouts.sort_by_key(|w| w.id);

  Ok(workouts)
}

/// Most recent workouts first. Samples are not loaded.
pub async fn list_recent_workouts(pool: &SqlitePool, limit: i64) -> Result<Vec<Workout>, ZoneError> {
  let sql = format!(
    "SELECT {} FROM workouts ORDER BY started_at DESC LIMIT ?1",
    WORKOUT_COLUMNS
  );
  let workouts = sqlx::query_as::<_, Workout>(&sql)
    .bind(limit)
    .fetch_all(pool)
    .await?;

  Ok(workouts)
}

/// Write relative effort for many workouts in one transaction.
/// Either every row is updated or none is.
pub async fn update_relative_efforts(
  pool: &SqlitePool,
  updates: &[(i64, f64)],
) -> Result<(), ZoneError> {
  if updates.is_empty() {
    return Ok(());
  }

  let mut tx = pool.begin().await?;

  for (workout_id, relative_effort) in updates {
    sqlx::query("UPDATE workouts SET relative_effort = ?1 WHERE id = ?2")
      .bind(relative_effort)
      .bind(workout_id)
      .execute(&mut *tx)
      .await?;
  }

  tx.commit().await?;
  Ok(())
}
