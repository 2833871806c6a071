//! Relative effort scoring
//!
//! Recalculation only needs "score one workout against a zone set". The
//! [`EffortScorer`] trait is that seam; [`ZoneWeightedScorer`] is the default
//! used by the app, and tests plug in closures.

use crate::error::ScoringError;
use crate::models::{HeartRateZones, Workout};

/// Score a single workout against a zone set.
///
/// `Ok(None)` means the workout has nothing to score; the stored value is left alone.
pub trait EffortScorer: Send + Sync {
  fn score(&self, workout: &Workout, zones: &HeartRateZones) -> Result<Option<f64>, ScoringError>;
}

impl<F> EffortScorer for F
where
  F: Fn(&Workout, &HeartRateZones) -> Result<Option<f64>, ScoringError> + Send + Sync,
{
  fn score(&self, workout: &Workout, zones: &HeartRateZones) -> Result<Option<f64>, ScoringError> {
    self(workout, zones)
  }
}

/// Zone-weighted training impulse (Edwards): minutes spent in each zone times
/// the zone number, summed. Below zone 1 counts for nothing.
///
/// Heart rate sources, in order of preference:
/// 1. The HR stream, each reading held until the next one
/// 2. The stored average HR over the full duration
/// 3. An `average_heartrate` field in the raw capture, read as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneWeightedScorer;

impl EffortScorer for ZoneWeightedScorer {
  fn score(&self, workout: &Workout, zones: &HeartRateZones) -> Result<Option<f64>, ScoringError> {
    if let Some(score) = score_from_samples(workout, zones)? {
      return Ok(Some(round_tenth(score)));
    }

    let average_hr = match workout.average_heartrate {
      Some(hr) => Some(hr),
      None => average_hr_from_capture(workout)?,
    };

    match (average_hr, workout.duration_seconds) {
      (Some(hr), Some(secs)) if secs > 0 => {
        let minutes = secs as f64 / 60.0;
        Ok(Some(round_tenth(zone_weight(zones, hr) * minutes)))
      }
      _ => Ok(None),
    }
  }
}

fn zone_weight(zones: &HeartRateZones, bpm: i64) -> f64 {
  zones.zone_for_hr(bpm).map(f64::from).unwrap_or(0.0)
}

fn round_tenth(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}

/// `None` when the stream has no usable HR readings or spans no time
fn score_from_samples(workout: &Workout, zones: &HeartRateZones) -> Result<Option<f64>, ScoringError> {
  let mut readings: Vec<(i64, i64)> = Vec::new();
  for sample in &workout.samples {
    let Some(bpm) = sample.heart_rate_bpm else {
      continue;
    };
    if bpm < 0 || sample.offset_seconds < 0 {
      return Err(ScoringError::InvalidSample {
        offset_seconds: sample.offset_seconds,
        reason: format!("negative value (hr {})", bpm),
      });
    }
    readings.push((sample.offset_seconds, bpm));
  }

  if readings.is_empty() {
    return Ok(None);
  }
  readings.sort_by_key(|(offset, _)| *offset);

  // The last reading holds until the end of the workout, if that is known
  let end = workout
    .duration_seconds
    .filter(|d| *d > readings[readings.len() - 1].0)
    .unwrap_or(readings[readings.len() - 1].0);

  let mut total_seconds = 0_i64;
  let mut weighted_seconds = 0.0;
  for (i, (offset, bpm)) in readings.iter().enumerate() {
    let next = readings.get(i + 1).map(|(o, _)| *o).unwrap_or(end);
    let held = next - offset;
    total_seconds += held;
    weighted_seconds += zone_weight(zones, *bpm) * held as f64;
  }

  if total_seconds == 0 {
    return Ok(None);
  }

  Ok(Some(weighted_seconds / 60.0))
}

fn average_hr_from_capture(workout: &Workout) -> Result<Option<i64>, ScoringError> {
  let Some(blob) = workout.raw_fit_data.as_deref().filter(|b| !b.is_empty()) else {
    return Ok(None);
  };

  let capture: serde_json::Value = serde_json::from_slice(blob)
    .map_err(|e| ScoringError::UnreadableCapture(e.to_string()))?;

  Ok(
    capture
      .get("average_heartrate")
      .and_then(|v| v.as_f64())
      .map(|hr| hr.round() as i64),
  )
}
