use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workout {
  pub id: i64,
  pub strava_id: String,
  pub activity_type: String,
  pub started_at: DateTime<Utc>,
  pub duration_seconds: Option<i64>,
  pub average_heartrate: Option<i64>,
  pub max_heartrate: Option<i64>,
  /// Raw device/API capture as ingested. Opaque here; may embed an average HR.
  #[serde(skip_serializing)]
  pub raw_fit_data: Option<Vec<u8>>,
  pub relative_effort: Option<f64>,
  /// HR stream, ordered by offset. Loaded separately from `workout_samples`.
  #[sqlx(skip)]
  #[serde(default)]
  pub samples: Vec<WorkoutSample>,
}

impl Workout {
  pub fn has_raw_capture(&self) -> bool {
    self.raw_fit_data.as_ref().is_some_and(|blob| !blob.is_empty())
  }
}

/// One downsampled point of a workout's time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutSample {
  pub workout_id: i64,
  pub offset_seconds: i64,
  pub heart_rate_bpm: Option<i64>,
  pub watts: Option<f64>,
}

/// For inserting new workouts (without id, relative_effort)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkout {
  pub strava_id: String,
  pub activity_type: String,
  pub started_at: DateTime<Utc>,
  pub duration_seconds: Option<i64>,
  pub average_heartrate: Option<i64>,
  pub max_heartrate: Option<i64>,
  pub raw_fit_data: Option<Vec<u8>>,
}
