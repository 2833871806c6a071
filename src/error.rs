use serde::ser::SerializeStruct;
use serde::Serialize;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

/// Machine-checkable error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  InvalidArgument,
  PreconditionFailed,
  Unexpected,
}

#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
  #[error("{0}")]
  InvalidArgument(String),

  #[error("{0}")]
  PreconditionFailed(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

impl ZoneError {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidArgument(message.into())
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      ZoneError::InvalidArgument(_) => ErrorKind::InvalidArgument,
      ZoneError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
      ZoneError::Database(_) | ZoneError::Migration(_) => ErrorKind::Unexpected,
    }
  }

  /// Message safe to show a caller. Unexpected errors stay generic.
  pub fn public_message(&self) -> String {
    match self.kind() {
      ErrorKind::Unexpected => "An unexpected error occurred".to_string(),
      _ => self.to_string(),
    }
  }
}

impl Serialize for ZoneError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    let mut state = serializer.serialize_struct("ZoneError", 2)?;
    state.serialize_field("kind", &self.kind())?;
    state.serialize_field("message", &self.public_message())?;
    state.end()
  }
}

/// Failure scoring a single workout. Absorbed by batch recalculation.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
  #[error("Raw capture could not be decoded: {0}")]
  UnreadableCapture(String),

  #[error("Invalid sample at offset {offset_seconds}s: {reason}")]
  InvalidSample { offset_seconds: i64, reason: String },

  #[error("{0}")]
  Other(String),
}
