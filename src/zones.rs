//! Heart rate zone derivation and validation
//!
//! Three ways to arrive at the five zones:
//! - Age-based: percentage bands of an estimated max HR (`220 - age`)
//! - Karvonen: percentage bands of heart rate reserve, offset by resting HR
//! - Custom: caller-supplied zones, validated but not derived
//!
//! Both derived methods share one band table. Rounding is half-up in integer
//! arithmetic so results are reproducible across platforms.

use crate::error::ZoneError;
use crate::models::{HeartRateZones, UserSettings, ZoneCandidate, ZONE_COUNT};

/// Max HR estimate is `MAX_HR_FORMULA_BASE - age`
pub const MAX_HR_FORMULA_BASE: i64 = 220;

/// Zone bands as (lower %, upper %) of max HR or heart rate reserve
pub const ZONE_PERCENTAGES: [(i64, i64); ZONE_COUNT] =
  [(50, 60), (60, 70), (70, 80), (80, 90), (90, 100)];

/// ---------------------------------------------------------------------------
/// Derived Zones
/// ---------------------------------------------------------------------------

/// Percentage of a bpm value, rounded half-up. `None` on overflow.
fn percent_of(value: i64, percent: i64) -> Option<i64> {
  Some(value.checked_mul(percent)?.checked_add(50)?.div_euclid(100))
}

/// Apply the band table to `floor + pct * span`. Age-based is the special case
/// `floor = 0, span = max HR`.
fn banded_zones(floor: i64, span: i64) -> Result<HeartRateZones, ZoneError> {
  let mut bounds = [(0, 0); ZONE_COUNT];
  for (bound, (low, high)) in bounds.iter_mut().zip(ZONE_PERCENTAGES) {
    let edge = |percent| percent_of(span, percent).and_then(|offset| floor.checked_add(offset));
    *bound = match (edge(low), edge(high)) {
      (Some(min_bpm), Some(max_bpm)) => (min_bpm, max_bpm),
      _ => return Err(ZoneError::invalid("Heart rate values are too large to derive zones")),
    };
  }
  Ok(HeartRateZones::from_bounds(bounds))
}

/// Zones from age, using `max HR = 220 - age`
pub fn calculate_zones_from_age(age: i64) -> Result<HeartRateZones, ZoneError> {
  if age <= 0 {
    return Err(ZoneError::invalid("Age must be a positive number"));
  }

  let max_hr = MAX_HR_FORMULA_BASE - age;
  if max_hr <= 0 {
    return Err(ZoneError::invalid(format!(
      "Age must be below {} to estimate a max heart rate",
      MAX_HR_FORMULA_BASE
    )));
  }

  banded_zones(0, max_hr)
}

/// Zones from heart rate reserve (Karvonen):
/// `resting + pct * (max - resting)`
pub fn calculate_zones_from_karvonen(
  max_heart_rate_bpm: i64,
  resting_heart_rate_bpm: i64,
) -> Result<HeartRateZones, ZoneError> {
  if max_heart_rate_bpm <= 0 || resting_heart_rate_bpm <= 0 {
    return Err(ZoneError::invalid("Heart rate values must be positive"));
  }
  if resting_heart_rate_bpm >= max_heart_rate_bpm {
    return Err(ZoneError::invalid(
      "Resting heart rate must be lower than max heart rate",
    ));
  }

  let reserve = max_heart_rate_bpm - resting_heart_rate_bpm;
  banded_zones(resting_heart_rate_bpm, reserve)
}

/// ---------------------------------------------------------------------------
/// Custom Zones
/// ---------------------------------------------------------------------------

/// Validate caller-supplied zones.
///
/// Requires exactly five zones numbered 1-5 once each (missing numbers are
/// taken from position), `min <= max` within each zone, and no zone starting
/// below the previous zone's max. Gaps between zones are allowed, and a zone
/// may start exactly where the previous one ends.
///
/// Failures are returned as a message naming the offending zone.
pub fn validate_custom_zones(candidates: &[ZoneCandidate]) -> Result<HeartRateZones, String> {
  if candidates.len() != ZONE_COUNT {
    return Err(format!(
      "Exactly {} zones are required, got {}",
      ZONE_COUNT,
      candidates.len()
    ));
  }

  let mut slots: [Option<(i64, i64)>; ZONE_COUNT] = [None; ZONE_COUNT];
  for (i, candidate) in candidates.iter().enumerate() {
    let number = candidate.zone_number.map(usize::from).unwrap_or(i + 1);
    if !(1..=ZONE_COUNT).contains(&number) {
      return Err(format!("Zone number {} is out of range (1-{})", number, ZONE_COUNT));
    }
    if slots[number - 1].is_some() {
      return Err(format!("Zone {} is defined more than once", number));
    }
    slots[number - 1] = Some((candidate.min_bpm, candidate.max_bpm));
  }

  let mut bounds = [(0, 0); ZONE_COUNT];
  for (i, slot) in slots.iter().enumerate() {
    // Five candidates with no duplicates fill every slot
    let (min_bpm, max_bpm) = slot.ok_or_else(|| format!("Zone {} is missing", i + 1))?;

    if min_bpm > max_bpm {
      return Err(format!(
        "Zone {}: min BPM ({}) must not be greater than max BPM ({})",
        i + 1,
        min_bpm,
        max_bpm
      ));
    }

    if i > 0 {
      let (_, prev_max) = bounds[i - 1];
      if min_bpm < prev_max {
        return Err(format!(
          "Zone {} overlaps zone {}: min BPM ({}) is below zone {} max BPM ({})",
          i + 1,
          i,
          min_bpm,
          i,
          prev_max
        ));
      }
    }

    bounds[i] = (min_bpm, max_bpm);
  }

  Ok(HeartRateZones::from_bounds(bounds))
}

/// ---------------------------------------------------------------------------
/// Settings Helpers
/// ---------------------------------------------------------------------------

pub fn zones_from_settings(settings: &UserSettings) -> HeartRateZones {
  settings.zones
}

pub fn apply_zones_to_settings(settings: &mut UserSettings, zones: HeartRateZones) {
  settings.zones = zones;
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
