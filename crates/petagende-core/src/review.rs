//! Reviews of completed appointments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A 1-5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub fn new(stars: u8) -> Result<Self> {
    if (1..=5).contains(&stars) {
      Ok(Self(stars))
    } else {
      Err(Error::RatingOutOfRange(stars))
    }
  }

  pub fn stars(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(v: u8) -> Result<Self> { Self::new(v) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:        Uuid,
  pub user_id:          Uuid,
  pub appointment_id:   Uuid,
  pub establishment_id: Uuid,
  pub rating:           Rating,
  pub comment:          Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::BookingStore::add_review`]. The establishment is
/// taken from the appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub appointment_id: Uuid,
  pub rating:         Rating,
  pub comment:        Option<String>,
}
