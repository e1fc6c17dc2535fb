//! Error types for `petagende-core`.

use thiserror::Error;

/// Validation failures raised before anything is written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("passwords do not match")]
  PasswordMismatch,

  #[error("password must be at least {min} characters")]
  PasswordTooShort { min: usize },

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("invalid tax id: expected 11 digits, got {digits}")]
  InvalidTaxId { digits: usize },

  #[error("{field} must not be empty")]
  EmptyField { field: &'static str },

  #[error("rating must be between 1 and 5, got {0}")]
  RatingOutOfRange(u8),

  #[error("invalid time of day: {0:?}")]
  InvalidTime(String),

  #[error("{year}-{month:02}-{day:02} is not a calendar date")]
  InvalidDate { year: i32, month: u32, day: u32 },

  #[error("day {day} is not open for booking (first open day is {first_open})")]
  DayClosed { day: u32, first_open: u32 },

  #[error("service duration must be at most {max} minutes, got {got}")]
  DurationOutOfRange { got: u32, max: u32 },

  #[error("{0} is not an offered start time")]
  TimeNotOffered(String),

  #[error("invalid transition {action} from {from}")]
  InvalidTransition { from: String, action: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
