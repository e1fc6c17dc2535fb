//! Pet profiles owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PetSex {
  Male,
  Female,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
  pub pet_id:       Uuid,
  pub owner_id:     Uuid,
  pub name:         String,
  /// Free text as entered, e.g. "dog", "cat".
  pub species:      String,
  pub breed:        Option<String>,
  /// Age in whole years.
  pub age:          Option<u32>,
  /// Weight in kilograms.
  pub weight_kg:    Option<f64>,
  pub sex:          Option<PetSex>,
  pub color:        Option<String>,
  pub notes:        Option<String>,
  pub photo_url:    Option<String>,
  pub vaccinated:   bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Registration form payload. The owner comes from the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPet {
  pub name:       String,
  pub species:    String,
  pub breed:      Option<String>,
  pub age:        Option<u32>,
  pub weight_kg:  Option<f64>,
  pub sex:        Option<PetSex>,
  pub color:      Option<String>,
  pub notes:      Option<String>,
  pub photo_url:  Option<String>,
  #[serde(default)]
  pub vaccinated: bool,
}

impl NewPet {
  pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
    Self { name: name.into(), species: species.into(), ..Self::default() }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::EmptyField { field: "name" });
    }
    if self.species.trim().is_empty() {
      return Err(Error::EmptyField { field: "species" });
    }
    Ok(())
  }
}

/// A partial pet update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetPatch {
  pub name:       Option<String>,
  pub species:    Option<String>,
  pub breed:      Option<String>,
  pub age:        Option<u32>,
  pub weight_kg:  Option<f64>,
  pub sex:        Option<PetSex>,
  pub color:      Option<String>,
  pub notes:      Option<String>,
  pub photo_url:  Option<String>,
  pub vaccinated: Option<bool>,
}

impl PetPatch {
  pub fn validate(&self) -> Result<()> {
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::EmptyField { field: "name" });
    }
    if self.species.as_deref().is_some_and(|s| s.trim().is_empty()) {
      return Err(Error::EmptyField { field: "species" });
    }
    Ok(())
  }
}
