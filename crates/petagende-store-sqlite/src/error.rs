//! Error type for `petagende-store-sqlite`.

use chrono::NaiveDate;
use petagende_core::{
  appointment::AppointmentStatus,
  clock::ClockTime,
  store::{ErrorKind, StoreError},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Invalid(#[from] petagende_core::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("profile not found for user {0}")]
  ProfileNotFound(Uuid),

  #[error("pet not found: {0}")]
  PetNotFound(Uuid),

  #[error("pet {0} has appointments and cannot be removed")]
  PetInUse(Uuid),

  #[error("establishment not found: {0}")]
  EstablishmentNotFound(Uuid),

  #[error("service not found: {0}")]
  ServiceNotFound(Uuid),

  #[error("appointment not found: {0}")]
  AppointmentNotFound(Uuid),

  #[error("{start} on {date} is already booked at establishment {establishment_id}")]
  SlotTaken {
    establishment_id: Uuid,
    date:             NaiveDate,
    start:            ClockTime,
  },

  #[error("appointment cannot move from {from} to {to}")]
  IllegalStatusChange {
    from: AppointmentStatus,
    to:   AppointmentStatus,
  },

  #[error("appointment {0} is not completed")]
  NotCompleted(Uuid),

  #[error("appointment {0} already has a review")]
  AlreadyReviewed(Uuid),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Invalid(_) => ErrorKind::Invalid,
      Self::ProfileNotFound(_)
      | Self::PetNotFound(_)
      | Self::EstablishmentNotFound(_)
      | Self::ServiceNotFound(_)
      | Self::AppointmentNotFound(_) => ErrorKind::NotFound,
      Self::EmailTaken(_)
      | Self::PetInUse(_)
      | Self::SlotTaken { .. }
      | Self::IllegalStatusChange { .. }
      | Self::NotCompleted(_)
      | Self::AlreadyReviewed(_) => ErrorKind::Conflict,
      Self::Database(_) | Self::Json(_) | Self::Uuid(_) | Self::Decode(_) => {
        ErrorKind::Internal
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
