//! Zone settings updates
//!
//! Both entry points share one path: derive or validate zones from the
//! request, then write them into the settings record (creating it on first
//! use). Nothing is written when the request is invalid.
//!
//! The recalculating variant re-scores workouts after the settings commit.
//! Recalculation trouble never undoes the settings change; it only drops the
//! recalculation counts from the response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::ZoneError;
use crate::models::{CalculationMethod, HeartRateZones, UserSettings, ZoneCandidate, ZONE_COUNT};
use crate::recalculation::{recalculate_all, RecalculationResult};
use crate::scoring::EffortScorer;
use crate::settings_store::{load_settings, save_settings};
use crate::zones::{
  apply_zones_to_settings, calculate_zones_from_age, calculate_zones_from_karvonen,
  validate_custom_zones, zones_from_settings,
};

/// Age assumed for the zones shown before anything is configured
pub const DEFAULT_AGE: i64 = 30;

/// ---------------------------------------------------------------------------
/// Request / Response Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateZonesRequest {
  pub calculation_method: String,
  pub age: Option<i64>,
  pub resting_heart_rate_bpm: Option<i64>,
  pub max_heart_rate_bpm: Option<i64>,
  /// Required for the custom method, ignored otherwise
  pub zones: Option<Vec<ZoneCandidate>>,
  /// Only honored by the recalculating update
  #[serde(default)]
  pub recalculate_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSettingsResponse {
  pub settings: UserSettings,
  pub zones: HeartRateZones,
  pub is_first_time_setup: bool,
  /// Workouts whose relative effort changed; absent when recalculation
  /// was not requested or did not complete
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recalculated_count: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recalculated_error_count: Option<usize>,
}

/// Current settings, or the defaults when none have been saved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSettingsView {
  pub settings: UserSettings,
  pub zones: HeartRateZones,
  pub is_configured: bool,
}

/// ---------------------------------------------------------------------------
/// Derivation
/// ---------------------------------------------------------------------------

/// Settings shown before the first update: age-based zones for [`DEFAULT_AGE`]
pub fn default_settings() -> Result<UserSettings, ZoneError> {
  Ok(UserSettings {
    calculation_method: CalculationMethod::AgeBased,
    age: Some(DEFAULT_AGE),
    resting_heart_rate_bpm: None,
    max_heart_rate_bpm: None,
    zones: calculate_zones_from_age(DEFAULT_AGE)?,
    updated_at: DateTime::<Utc>::UNIX_EPOCH,
  })
}

/// Parse the method and produce zones for it. Touches no state.
pub fn derive_zones(
  request: &UpdateZonesRequest,
) -> Result<(CalculationMethod, HeartRateZones), ZoneError> {
  let method: CalculationMethod = request
    .calculation_method
    .parse()
    .map_err(|_| ZoneError::invalid("Invalid calculation method"))?;

  let zones = match method {
    CalculationMethod::AgeBased => {
      let age = request
        .age
        .ok_or_else(|| ZoneError::invalid("Age is required for age-based zones"))?;
      calculate_zones_from_age(age)?
    }
    CalculationMethod::Karvonen => match (request.max_heart_rate_bpm, request.resting_heart_rate_bpm) {
      (Some(max_hr), Some(resting_hr)) => calculate_zones_from_karvonen(max_hr, resting_hr)?,
      _ => {
        return Err(ZoneError::invalid(
          "Max and resting heart rate are both required for Karvonen zones",
        ))
      }
    },
    CalculationMethod::Custom => {
      let candidates = request
        .zones
        .as_deref()
        .ok_or_else(|| ZoneError::invalid("Custom zones are required for the custom method"))?;
      if candidates.len() != ZONE_COUNT {
        return Err(ZoneError::invalid(format!(
          "Exactly {} custom zones are required",
          ZONE_COUNT
        )));
      }
      validate_custom_zones(candidates).map_err(ZoneError::InvalidArgument)?
    }
  };

  Ok((method, zones))
}

/// ---------------------------------------------------------------------------
/// Workflow
/// ---------------------------------------------------------------------------

/// Saved settings plus whether this is a fresh, unsaved record
async fn get_or_initialize(pool: &SqlitePool) -> Result<(UserSettings, bool), ZoneError> {
  match load_settings(pool).await? {
    Some(settings) => Ok((settings, false)),
    None => Ok((default_settings()?, true)),
  }
}

pub async fn read_zones(pool: &SqlitePool) -> Result<ZoneSettingsView, ZoneError> {
  let (settings, is_new) = get_or_initialize(pool).await?;
  Ok(ZoneSettingsView {
    zones: zones_from_settings(&settings),
    settings,
    is_configured: !is_new,
  })
}

pub async fn update_zones(
  pool: &SqlitePool,
  request: &UpdateZonesRequest,
) -> Result<ZoneSettingsResponse, ZoneError> {
  let (method, zones) = derive_zones(request)?;
  let (mut settings, is_first_time_setup) = get_or_initialize(pool).await?;

  // Physiology fields are stored verbatim, whether or not the method used them
  settings.calculation_method = method;
  settings.age = request.age;
  settings.resting_heart_rate_bpm = request.resting_heart_rate_bpm;
  settings.max_heart_rate_bpm = request.max_heart_rate_bpm;
  apply_zones_to_settings(&mut settings, zones);
  settings.updated_at = Utc::now();

  save_settings(pool, &settings).await?;

  tracing::info!(
    method = %method,
    first_time_setup = is_first_time_setup,
    "Heart rate zones updated"
  );

  Ok(ZoneSettingsResponse {
    settings,
    zones,
    is_first_time_setup,
    recalculated_count: None,
    recalculated_error_count: None,
  })
}

pub async fn update_zones_and_recalculate(
  pool: &SqlitePool,
  scorer: &dyn EffortScorer,
  request: &UpdateZonesRequest,
) -> Result<ZoneSettingsResponse, ZoneError> {
  let mut response = update_zones(pool, request).await?;

  if request.recalculate_existing {
    match recalculate_all(pool, &response.zones, scorer).await {
      Ok(result) => {
        response.recalculated_count = Some(result.updated_count);
        response.recalculated_error_count = Some(result.error_count);
      }
      Err(e) => {
        tracing::warn!(error = %e, "Zones saved but relative effort recalculation failed");
      }
    }
  }

  Ok(response)
}

/// Recalculate using whatever zones are saved. Fails if nothing is saved yet.
pub async fn recalculate_with_saved_zones(
  pool: &SqlitePool,
  scorer: &dyn EffortScorer,
) -> Result<RecalculationResult, ZoneError> {
  let settings = load_settings(pool).await?.ok_or_else(|| {
    ZoneError::PreconditionFailed(
      "Heart rate zones have not been configured yet".to_string(),
    )
  })?;

  recalculate_all(pool, &zones_from_settings(&settings), scorer).await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use crate::scoring::ZoneWeightedScorer;
  use crate::test_utils::{fetch_relative_efforts, seed_heart_rate_workouts, setup_test_db, teardown_test_db};

  fn age_request(age: i64) -> UpdateZonesRequest {
    UpdateZonesRequest {
      calculation_method: "AgeBased".to_string(),
      age: Some(age),
      ..Default::default()
    }
  }

  fn custom_request(pairs: &[(i64, i64)]) -> UpdateZonesRequest {
    UpdateZonesRequest {
      calculation_method: "Custom".to_string(),
      zones: Some(pairs.iter().map(|&(min, max)| ZoneCandidate::new(min, max)).collect()),
      ..Default::default()
    }
  }

  fn invalid_message(result: Result<(CalculationMethod, HeartRateZones), ZoneError>) -> String {
    match result {
      Err(ZoneError::InvalidArgument(message)) => message,
      other => panic!("expected InvalidArgument, got {:?}", other),
    }
  }

  #[test]
  fn test_default_settings_are_age_30() {
    let settings = default_settings().unwrap();
    assert_eq!(settings.zones, calculate_zones_from_age(DEFAULT_AGE).unwrap());
    assert_eq!(settings.calculation_method, CalculationMethod::AgeBased);
  }

  #[test]
  fn test_derive_rejects_unknown_method() {
    let request = UpdateZonesRequest {
      calculation_method: "Lactate".to_string(),
      ..Default::default()
    };
    assert_eq!(invalid_message(derive_zones(&request)), "Invalid calculation method");
  }

  #[test]
  fn test_derive_missing_inputs_have_distinct_messages() {
    let no_age = UpdateZonesRequest {
      calculation_method: "AgeBased".to_string(),
      ..Default::default()
    };
    let no_resting = UpdateZonesRequest {
      calculation_method: "Karvonen".to_string(),
      max_heart_rate_bpm: Some(190),
      ..Default::default()
    };
    let no_zones = UpdateZonesRequest {
      calculation_method: "Custom".to_string(),
      ..Default::default()
    };
    let four_zones = custom_request(&[(100, 120), (120, 140), (140, 160), (160, 180)]);

    let messages = [
      invalid_message(derive_zones(&no_age)),
      invalid_message(derive_zones(&no_resting)),
      invalid_message(derive_zones(&no_zones)),
      invalid_message(derive_zones(&four_zones)),
    ];

    assert!(messages[0].contains("Age is required"));
    assert!(messages[1].contains("Karvonen"));
    assert!(messages[2].contains("Custom zones are required"));
    assert!(messages[3].contains("Exactly 5"));
    for (i, a) in messages.iter().enumerate() {
      for b in &messages[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }

  #[test]
  fn test_derive_custom_reports_offending_zone() {
    let request = custom_request(&[(100, 120), (120, 140), (135, 160), (160, 180), (180, 200)]);
    let message = invalid_message(derive_zones(&request));
    assert!(message.contains("Zone 3"), "{}", message);
  }

  #[test]
  fn test_derive_karvonen() {
    let request = UpdateZonesRequest {
      calculation_method: "karvonen".to_string(),
      max_heart_rate_bpm: Some(190),
      resting_heart_rate_bpm: Some(60),
      ..Default::default()
    };
    let (method, zones) = derive_zones(&request).unwrap();
    assert_eq!(method, CalculationMethod::Karvonen);
    assert_eq!(zones, calculate_zones_from_karvonen(190, 60).unwrap());
  }

  #[tokio::test]
  async fn test_first_update_creates_settings() {
    let pool = setup_test_db().await;

    let response = update_zones(&pool, &age_request(40)).await.unwrap();
    assert!(response.is_first_time_setup);
    assert_eq!(response.zones, calculate_zones_from_age(40).unwrap());
    assert_eq!(response.settings.zones, response.zones);

    let second = update_zones(&pool, &custom_request(&[(90, 110), (110, 130), (130, 150), (150, 170), (170, 185)]))
      .await
      .unwrap();
    assert!(!second.is_first_time_setup);
    assert_eq!(second.settings.calculation_method, CalculationMethod::Custom);

    let view = read_zones(&pool).await.unwrap();
    assert!(view.is_configured);
    assert_eq!(view.zones, second.zones);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_irrelevant_fields_stored_verbatim() {
    let pool = setup_test_db().await;

    let mut request = custom_request(&[(90, 110), (110, 130), (130, 150), (150, 170), (170, 185)]);
    request.age = Some(52);
    request.resting_heart_rate_bpm = Some(48);

    update_zones(&pool, &request).await.unwrap();
    let saved = load_settings(&pool).await.unwrap().unwrap();

    assert_eq!(saved.age, Some(52));
    assert_eq!(saved.resting_heart_rate_bpm, Some(48));
    assert_eq!(saved.max_heart_rate_bpm, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_invalid_request_writes_nothing() {
    let pool = setup_test_db().await;

    let result = update_zones(&pool, &age_request(0)).await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert!(load_settings(&pool).await.unwrap().is_none());

    // A later valid update is still the first-time setup
    let response = update_zones(&pool, &age_request(33)).await.unwrap();
    assert!(response.is_first_time_setup);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_read_zones_defaults_are_stable() {
    let pool = setup_test_db().await;

    let first = read_zones(&pool).await.unwrap();
    let second = read_zones(&pool).await.unwrap();

    assert!(!first.is_configured);
    assert_eq!(first, second);
    assert_eq!(first.settings, default_settings().unwrap());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_recalculate_without_settings_is_precondition_failure() {
    let pool = setup_test_db().await;
    seed_heart_rate_workouts(&pool, 3).await;

    let err = recalculate_with_saved_zones(&pool, &ZoneWeightedScorer).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_recalculate_with_saved_zones() {
    let pool = setup_test_db().await;
    seed_heart_rate_workouts(&pool, 3).await;
    update_zones(&pool, &age_request(30)).await.unwrap();

    let result = recalculate_with_saved_zones(&pool, &ZoneWeightedScorer).await.unwrap();
    assert_eq!(result.total_qualifying, 3);
    assert_eq!(result.updated_count, 3);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_combined_without_recalculation_flag() {
    let pool = setup_test_db().await;
    seed_heart_rate_workouts(&pool, 3).await;

    let response = update_zones_and_recalculate(&pool, &ZoneWeightedScorer, &age_request(30))
      .await
      .unwrap();

    assert!(response.is_first_time_setup);
    assert_eq!(response.recalculated_count, None);
    assert_eq!(response.recalculated_error_count, None);
    assert!(fetch_relative_efforts(&pool).await.values().all(Option::is_none));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_combined_with_recalculation() {
    let pool = setup_test_db().await;
    seed_heart_rate_workouts(&pool, 5).await;

    let mut request = age_request(30);
    request.recalculate_existing = true;
    let response = update_zones_and_recalculate(&pool, &ZoneWeightedScorer, &request)
      .await
      .unwrap();

    assert_eq!(response.recalculated_count, Some(5));
    assert_eq!(response.recalculated_error_count, Some(0));
    assert!(fetch_relative_efforts(&pool).await.values().all(Option::is_some));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_combined_recalculation_failure_keeps_settings() {
    let pool = setup_test_db().await;
    seed_heart_rate_workouts(&pool, 3).await;
    // Breaks the qualifying-workout query but not the settings table
    sqlx::query("DROP TABLE workout_samples").execute(&pool).await.unwrap();

    let mut request = age_request(45);
    request.recalculate_existing = true;
    let response = update_zones_and_recalculate(&pool, &ZoneWeightedScorer, &request)
      .await
      .expect("Settings update should still succeed");

    assert_eq!(response.recalculated_count, None);
    assert_eq!(response.recalculated_error_count, None);
    let saved = load_settings(&pool).await.unwrap().expect("Settings should be saved");
    assert_eq!(saved.age, Some(45));
    assert_eq!(saved.zones, calculate_zones_from_age(45).unwrap());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_response_omits_absent_counts() {
    let response = ZoneSettingsResponse {
      settings: default_settings().unwrap(),
      zones: default_settings().unwrap().zones,
      is_first_time_setup: true,
      recalculated_count: None,
      recalculated_error_count: None,
    };
    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("recalculated_count").is_none());
    assert_eq!(json["is_first_time_setup"], true);
  }

  #[test]
  fn test_request_deserializes_with_defaults() {
    let request: UpdateZonesRequest = serde_json::from_str(
      r#"{"calculation_method": "Custom", "zones": [{"min_bpm": 90, "max_bpm": 110}]}"#,
    )
    .unwrap();
    assert!(!request.recalculate_existing);
    assert_eq!(request.zones.map(|z| z.len()), Some(1));
  }
}
