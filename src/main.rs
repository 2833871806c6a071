use clap::{Parser, Subcommand};
use serde::Serialize;
use trainer_zones_lib::commands::{self, zones};
use trainer_zones_lib::config::LogFormat;
use trainer_zones_lib::models::ZoneCandidate;
use trainer_zones_lib::workflow::UpdateZonesRequest;
use trainer_zones_lib::{init_app, logging, AppConfig, ErrorKind, ZoneError};

#[derive(Parser, Debug)]
#[command(name = "trainer-zones", version, about = "Heart rate zones and relative effort")]
struct Cli {
  /// SQLite database URL (overrides TRAINER_ZONES_DATABASE_URL)
  #[arg(long, global = true)]
  database_url: Option<String>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON
  #[arg(long, global = true)]
  json_logs: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the current zones (defaults if never configured)
  Show,
  /// Set zones by age, Karvonen, or custom bounds
  Update {
    /// age_based, karvonen, or custom
    #[arg(long)]
    method: String,
    #[arg(long)]
    age: Option<i64>,
    #[arg(long)]
    resting_hr: Option<i64>,
    #[arg(long)]
    max_hr: Option<i64>,
    /// Custom zones as MIN-MAX, comma separated, zone 1 first
    #[arg(long, value_delimiter = ',', value_parser = parse_zone)]
    zones: Vec<ZoneCandidate>,
    /// Recalculate relative effort for existing workouts afterwards
    #[arg(long)]
    recalculate: bool,
  },
  /// Count workouts with heart rate data
  Count,
  /// Recalculate relative effort using the saved zones
  Recalculate,
  /// List recent workouts
  Workouts {
    #[arg(long)]
    limit: Option<i64>,
  },
}

fn parse_zone(s: &str) -> Result<ZoneCandidate, String> {
  let (min, max) = s
    .split_once('-')
    .ok_or_else(|| format!("Expected MIN-MAX, got '{}'", s))?;
  let min_bpm = min.trim().parse().map_err(|_| format!("Invalid min BPM in '{}'", s))?;
  let max_bpm = max.trim().parse().map_err(|_| format!("Invalid max BPM in '{}'", s))?;
  Ok(ZoneCandidate::new(min_bpm, max_bpm))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn exit_code(e: &ZoneError) -> i32 {
  match e.kind() {
    ErrorKind::InvalidArgument => 2,
    ErrorKind::PreconditionFailed => 3,
    ErrorKind::Unexpected => 1,
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  let mut config = AppConfig::from_env()?;
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }
  if cli.json_logs {
    config.log_format = LogFormat::Json;
  }

  logging::init_logger(config.log_format, cli.verbose);

  let state = match init_app(&config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialize database");
      eprintln!("{}", serde_json::to_string(&e)?);
      std::process::exit(exit_code(&e));
    }
  };

  let result = match cli.command {
    Command::Show => zones::read_zones(&state).await.map(|v| print_json(&v)),
    Command::Update {
      method,
      age,
      resting_hr,
      max_hr,
      zones: custom_zones,
      recalculate,
    } => {
      let request = UpdateZonesRequest {
        calculation_method: method,
        age,
        resting_heart_rate_bpm: resting_hr,
        max_heart_rate_bpm: max_hr,
        zones: (!custom_zones.is_empty()).then_some(custom_zones),
        recalculate_existing: recalculate,
      };
      zones::update_zones_and_recalculate(&state, &request)
        .await
        .map(|v| print_json(&v))
    }
    Command::Count => zones::count_qualifying(&state).await.map(|v| print_json(&v)),
    Command::Recalculate => zones::recalculate_all(&state).await.map(|v| print_json(&v)),
    Command::Workouts { limit } => commands::get_workouts(&state, limit).await.map(|v| print_json(&v)),
  };

  state.db.close().await;

  match result {
    Ok(printed) => printed,
    Err(e) => {
      eprintln!("{}", serde_json::to_string(&e)?);
      std::process::exit(exit_code(&e));
    }
  }
}
