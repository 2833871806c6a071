//! Persistence for the single user settings record.
//!
//! The `user_settings` table is a slot holding zero or one row (`id = 1`).
//! Reads return `Option`; writes are an upsert.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::ZoneError;
use crate::models::{CalculationMethod, HeartRateZones, UserSettings, ZONE_COUNT};

const SETTINGS_ID: i64 = 1;

/// Load the settings record if one has been written
pub async fn load_settings(pool: &SqlitePool) -> Result<Option<UserSettings>, ZoneError> {
  let row = sqlx::query(
    r#"
    SELECT
      calculation_method, age, resting_heart_rate_bpm, max_heart_rate_bpm,
      zone1_min, zone1_max, zone2_min, zone2_max, zone3_min, zone3_max,
      zone4_min, zone4_max, zone5_min, zone5_max, updated_at
    FROM user_settings
    WHERE id = ?1
    "#,
  )
  .bind(SETTINGS_ID)
  .fetch_optional(pool)
  .await?;

  let Some(row) = row else {
    return Ok(None);
  };

  let method_str: String = row.try_get("calculation_method")?;
  let calculation_method: CalculationMethod = method_str.parse().map_err(|e: String| {
    ZoneError::Database(sqlx::Error::Decode(e.into()))
  })?;

  let mut bounds = [(0, 0); ZONE_COUNT];
  for (i, bound) in bounds.iter_mut().enumerate() {
    let n = i + 1;
    *bound = (
      row.try_get(format!("zone{}_min", n).as_str())?,
      row.try_get(format!("zone{}_max", n).as_str())?,
    );
  }

  let updated_at: String = row.try_get("updated_at")?;
  let updated_at = parse_timestamp(&updated_at).ok_or_else(|| {
    ZoneError::Database(sqlx::Error::Decode(
      format!("invalid updated_at timestamp: {}", updated_at).into(),
    ))
  })?;

  Ok(Some(UserSettings {
    calculation_method,
    age: row.try_get("age")?,
    resting_heart_rate_bpm: row.try_get("resting_heart_rate_bpm")?,
    max_heart_rate_bpm: row.try_get("max_heart_rate_bpm")?,
    zones: HeartRateZones::from_bounds(bounds),
    updated_at,
  }))
}

/// Write the settings record, creating it on first use
pub async fn save_settings(pool: &SqlitePool, settings: &UserSettings) -> Result<(), ZoneError> {
  let z = |n: u8| {
    settings
      .zones
      .zone(n)
      .map(|zone| (zone.min_bpm, zone.max_bpm))
      .unwrap_or_default()
  };

  sqlx::query(
    r#"
    INSERT INTO user_settings (
      id, calculation_method, age, resting_heart_rate_bpm, max_heart_rate_bpm,
      zone1_min, zone1_max, zone2_min, zone2_max, zone3_min, zone3_max,
      zone4_min, zone4_max, zone5_min, zone5_max, updated_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
    ON CONFLICT(id) DO UPDATE SET
      calculation_method = excluded.calculation_method,
      age = excluded.age,
      resting_heart_rate_bpm = excluded.resting_heart_rate_bpm,
      max_heart_rate_bpm = excluded.max_heart_rate_bpm,
      zone1_min = excluded.zone1_min,
      zone1_max = excluded.zone1_max,
      zone2_min = excluded.zone2_min,
      zone2_max = excluded.zone2_max,
      zone3_min = excluded.zone3_min,
      zone3_max = excluded.zone3_max,
      zone4_min = excluded.zone4_min,
      zone4_max = excluded.zone4_max,
      zone5_min = excluded.zone5_min,
      zone5_max = excluded.zone5_max,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(SETTINGS_ID)
  .bind(settings.calculation_method.as_str())
  .bind(settings.age)
  .bind(settings.resting_heart_rate_bpm)
  .bind(settings.max_heart_rate_bpm)
  .bind(z(1).0)
  .bind(z(1).1)
  .bind(z(2).0)
  .bind(z(2).1)
  .bind(z(3).0)
  .bind(z(3).1)
  .bind(z(4).0)
  .bind(z(4).1)
  .bind(z(5).0)
  .bind(z(5).1)
  .bind(settings.updated_at.to_rfc3339())
  .execute(pool)
  .await?;

  Ok(())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .or_else(|_| DateTime::parse_from_str(&format!("{}+00:00", s), "%Y-%m-%d %H:%M:%S%:z"))
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
}
