pub mod workout;
pub mod zones;

pub use workout::{NewWorkout, Workout, WorkoutSample};
pub use zones::{CalculationMethod, HeartRateZones, UserSettings, ZoneBoundary, ZoneCandidate, ZONE_COUNT};
