//! Appointments: a booking binding a user, pet, service and establishment to
//! a date and time window.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  clock::{ClockTime, SlotWindow},
  establishment::EstablishmentSummary,
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
  #[default]
  Scheduled,
  Completed,
  Cancelled,
}

impl AppointmentStatus {
  /// Only a scheduled appointment may change status, and never back to
  /// scheduled.
  pub fn can_become(self, next: AppointmentStatus) -> bool {
    matches!(
      (self, next),
      (Self::Scheduled, Self::Completed) | (Self::Scheduled, Self::Cancelled)
    )
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
  pub appointment_id:   Uuid,
  pub user_id:          Uuid,
  pub pet_id:           Uuid,
  pub service_id:       Uuid,
  pub establishment_id: Uuid,
  pub date:             NaiveDate,
  pub start:            ClockTime,
  /// `start` plus the service duration, never wrapped past midnight.
  pub end:              ClockTime,
  pub price:            f64,
  pub notes:            Option<String>,
  pub status:           AppointmentStatus,
  /// Client-chosen key identifying the booking attempt.
  pub request_key:      Uuid,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Appointment {
  pub fn window(&self) -> SlotWindow { SlotWindow { start: self.start, end: self.end } }
}

/// Input to [`crate::store::BookingStore::book`].
#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub request_key:      Uuid,
  pub user_id:          Uuid,
  pub pet_id:           Uuid,
  pub service_id:       Uuid,
  pub establishment_id: Uuid,
  pub date:             NaiveDate,
  pub window:           SlotWindow,
  pub price:            f64,
  pub notes:            Option<String>,
}

/// The result of a booking call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
  pub appointment: Appointment,
  /// `true` when the request key had already been used and the existing
  /// appointment was returned instead of inserting a new one.
  pub replayed:    bool,
}

/// What a client submits to book. The window is derived server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
  pub pet_id:      Uuid,
  pub service_id:  Uuid,
  /// Day of the configured booking month.
  pub day:         u32,
  /// One of the calendar's candidate times, `HH:MM`.
  pub time:        String,
  pub notes:       Option<String>,
  /// Resubmitting with the same key returns the original appointment.
  pub request_key: Option<Uuid>,
}

// ─── Embedded history view ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSummary {
  pub name:        String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetSummary {
  pub name:      String,
  pub species:   String,
  pub photo_url: Option<String>,
}

/// An appointment with the related rows embedded, as shown in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
  #[serde(flatten)]
  pub appointment:   Appointment,
  pub service:       ServiceSummary,
  pub pet:           PetSummary,
  pub establishment: EstablishmentSummary,
}
