//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Workout factories and seeding
//! - Helpers for reading back recalculation results

use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::models::NewWorkout;
use crate::workout_store::{insert_samples, insert_workout};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Workout Factories
/// ---------------------------------------------------------------------------

/// A one-hour run with the given HR sources
pub fn new_workout(strava_id: &str, average_heartrate: Option<i64>, raw_fit_data: Option<Vec<u8>>) -> NewWorkout {
  NewWorkout {
    strava_id: strava_id.to_string(),
    activity_type: "Run".to_string(),
    started_at: Utc::now(),
    duration_seconds: Some(3600),
    average_heartrate,
    max_heartrate: average_heartrate.map(|hr| hr + 20),
    raw_fit_data,
  }
}

/// Seed workouts that all qualify and all score under the default scorer.
/// Alternates between average-HR-only and stream-only workouts.
/// Returns the IDs of created workouts
pub async fn seed_heart_rate_workouts(pool: &SqlitePool, count: usize) -> Vec<i64> {
  let mut workout_ids = Vec::new();

  for i in 0..count {
    let avg_hr = 120 + (i % 40) as i64;
    let mut workout = new_workout(&format!("test_{}", i), None, None);
    workout.started_at = Utc::now() - Duration::days(i as i64);

    if i % 2 == 0 {
      workout.average_heartrate = Some(avg_hr);
      let id = insert_workout(pool, &workout).await.expect("Failed to insert test workout");
      workout_ids.push(id);
    } else {
      let id = insert_workout(pool, &workout).await.expect("Failed to insert test workout");
      let samples: Vec<(i64, Option<i64>)> = (0..6).map(|n| (n * 600, Some(avg_hr + n))).collect();
      insert_samples(pool, id, &samples).await.expect("Failed to insert test samples");
      workout_ids.push(id);
    }
  }

  workout_ids
}

/// Relative effort of every workout, keyed by id
pub async fn fetch_relative_efforts(pool: &SqlitePool) -> HashMap<i64, Option<f64>> {
  let rows: Vec<(i64, Option<f64>)> = sqlx::query_as("SELECT id, relative_effort FROM workouts")
    .fetch_all(pool)
    .await
    .expect("Failed to fetch relative effort");

  rows.into_iter().collect()
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workouts', 'workout_samples', 'user_settings')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3, "Expected 3 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workouts_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_heart_rate_workouts(&pool, 5).await;
    assert_eq!(ids.len(), 5);

    let efforts = fetch_relative_efforts(&pool).await;
    assert_eq!(efforts.len(), 5);
    assert!(efforts.values().all(Option::is_none));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_settings_slot_rejects_second_row() {
    let pool = setup_test_db().await;

    let result = sqlx::query(
      "INSERT INTO user_settings (id, calculation_method, zone1_min, zone1_max, zone2_min, zone2_max, \
       zone3_min, zone3_max, zone4_min, zone4_max, zone5_min, zone5_max, updated_at) \
       VALUES (2, 'custom', 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, '2025-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "Only id = 1 may exist");

    teardown_test_db(pool).await;
  }
}
