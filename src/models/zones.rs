use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ZONE_COUNT: usize = 5;

/// ---------------------------------------------------------------------------
/// Calculation Method
/// ---------------------------------------------------------------------------

/// Which derivation rule produced the persisted zone set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
  /// Percentage bands of `220 - age`
  AgeBased,
  /// Percentage bands of heart rate reserve, offset by resting HR
  Karvonen,
  /// Zones entered by the user
  Custom,
}

impl CalculationMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      CalculationMethod::AgeBased => "age_based",
      CalculationMethod::Karvonen => "karvonen",
      CalculationMethod::Custom => "custom",
    }
  }
}

impl std::fmt::Display for CalculationMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for CalculationMethod {
  type Err = String;

  /// Accepts `AgeBased`, `age_based`, `age-based` and friends, case-insensitively
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized: String = s
      .trim()
      .chars()
      .filter(|c| *c != '_' && *c != '-' && *c != ' ')
      .collect::<String>()
      .to_lowercase();

    match normalized.as_str() {
      "agebased" | "age" => Ok(Self::AgeBased),
      "karvonen" | "heartratereserve" | "hrr" => Ok(Self::Karvonen),
      "custom" => Ok(Self::Custom),
      _ => Err(format!("Unknown calculation method: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Zone Boundaries
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBoundary {
  pub zone_number: u8,
  pub min_bpm: i64,
  pub max_bpm: i64,
}

/// Unvalidated zone as supplied by a caller. `zone_number` falls back to position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCandidate {
  #[serde(default)]
  pub zone_number: Option<u8>,
  pub min_bpm: i64,
  pub max_bpm: i64,
}

impl ZoneCandidate {
  pub fn new(min_bpm: i64, max_bpm: i64) -> Self {
    Self {
      zone_number: None,
      min_bpm,
      max_bpm,
    }
  }
}

impl From<ZoneBoundary> for ZoneCandidate {
  fn from(zone: ZoneBoundary) -> Self {
    Self {
      zone_number: Some(zone.zone_number),
      min_bpm: zone.min_bpm,
      max_bpm: zone.max_bpm,
    }
  }
}

/// Exactly five zones, numbered 1..=5 in order.
///
/// Only the calculator builds these, so anything holding a `HeartRateZones`
/// has already passed derivation or custom validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeartRateZones([ZoneBoundary; ZONE_COUNT]);

impl HeartRateZones {
  /// Build from `(min, max)` pairs, numbering zones by position
  pub(crate) fn from_bounds(bounds: [(i64, i64); ZONE_COUNT]) -> Self {
    let mut zones = [ZoneBoundary {
      zone_number: 0,
      min_bpm: 0,
      max_bpm: 0,
    }; ZONE_COUNT];

    for (i, (min_bpm, max_bpm)) in bounds.into_iter().enumerate() {
      zones[i] = ZoneBoundary {
        zone_number: (i + 1) as u8,
        min_bpm,
        max_bpm,
      };
    }

    Self(zones)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ZoneBoundary> {
    self.0.iter()
  }

  pub fn as_slice(&self) -> &[ZoneBoundary] {
    &self.0
  }

  /// Zone by number (1-5)
  pub fn zone(&self, zone_number: u8) -> Option<&ZoneBoundary> {
    match zone_number {
      1..=5 => self.0.get(zone_number as usize - 1),
      _ => None,
    }
  }

  /// Zone a heart rate falls in. Below zone 1 is `None`; a rate inside a gap
  /// between zones counts toward the lower one; above zone 5 counts as zone 5.
  pub fn zone_for_hr(&self, bpm: i64) -> Option<u8> {
    self
      .0
      .iter()
      .rev()
      .find(|zone| bpm >= zone.min_bpm)
      .map(|zone| zone.zone_number)
  }
}

/// ---------------------------------------------------------------------------
/// User Settings
/// ---------------------------------------------------------------------------

/// The single settings record. Physiology fields are stored as the caller gave
/// them, even when the chosen method did not use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
  pub calculation_method: CalculationMethod,
  pub age: Option<i64>,
  pub resting_heart_rate_bpm: Option<i64>,
  pub max_heart_rate_bpm: Option<i64>,
  pub zones: HeartRateZones,
  pub updated_at: DateTime<Utc>,
}
