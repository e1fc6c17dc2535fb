//! Establishments and the services they offer.
//!
//! Both are read-only to end users; they enter the store through the
//! catalogue import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, clock::MAX_DURATION_MINUTES, profile::Address};

/// Whether a catalogue record is visible to users.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListingStatus {
  #[default]
  Active,
  Inactive,
}

// ─── Establishment ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Establishment {
  pub establishment_id: Uuid,
  pub name:             String,
  pub description:      Option<String>,
  /// Brazilian CNPJ as supplied by the catalogue.
  pub tax_id:           Option<String>,
  pub phone:            Option<String>,
  pub email:            Option<String>,
  pub address:          Option<Address>,
  /// Free-form opening hours as supplied by the catalogue.
  pub opening_hours:    Option<serde_json::Value>,
  pub photos:           Vec<String>,
  /// Mean of all review ratings; `None` until the first review.
  pub rating_average:   Option<f64>,
  pub rating_count:     u32,
  pub status:           ListingStatus,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// The slice of an establishment embedded in service and appointment
/// listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstablishmentSummary {
  pub establishment_id: Uuid,
  pub name:             String,
  pub address:          Option<Address>,
  pub rating_average:   Option<f64>,
}

impl From<&Establishment> for EstablishmentSummary {
  fn from(e: &Establishment) -> Self {
    Self {
      establishment_id: e.establishment_id,
      name:             e.name.clone(),
      address:          e.address.clone(),
      rating_average:   e.rating_average,
    }
  }
}

/// Catalogue input. A supplied id makes the import an upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEstablishment {
  pub establishment_id: Option<Uuid>,
  pub name:             String,
  pub description:      Option<String>,
  pub tax_id:           Option<String>,
  pub phone:            Option<String>,
  pub email:            Option<String>,
  pub address:          Option<Address>,
  pub opening_hours:    Option<serde_json::Value>,
  #[serde(default)]
  pub photos:           Vec<String>,
  #[serde(default)]
  pub status:           ListingStatus,
}

impl NewEstablishment {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      establishment_id: None,
      name:             name.into(),
      description:      None,
      tax_id:           None,
      phone:            None,
      email:            None,
      address:          None,
      opening_hours:    None,
      photos:           Vec::new(),
      status:           ListingStatus::Active,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
  pub service_id:       Uuid,
  pub establishment_id: Uuid,
  pub name:             String,
  pub description:      Option<String>,
  pub price:            f64,
  pub duration_minutes: u32,
  /// e.g. "Banho e Tosa", "Veterinário".
  pub category:         String,
  /// Species served; empty means every species.
  pub species:          Vec<String>,
  pub status:           ListingStatus,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Service {
  /// Case-insensitive membership test against [`Service::species`].
  pub fn serves_species(&self, species: &str) -> bool {
    self.species.is_empty()
      || self
        .species
        .iter()
        .any(|s| s.to_lowercase() == species.to_lowercase())
  }
}

/// A service bundled with its establishment, as returned by service search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
  #[serde(flatten)]
  pub service:       Service,
  pub establishment: EstablishmentSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
  pub service_id:       Option<Uuid>,
  pub establishment_id: Uuid,
  pub name:             String,
  pub description:      Option<String>,
  pub price:            f64,
  pub duration_minutes: u32,
  pub category:         String,
  #[serde(default)]
  pub species:          Vec<String>,
  #[serde(default)]
  pub status:           ListingStatus,
}

impl NewService {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::EmptyField { field: "service name" });
    }
    if self.duration_minutes > MAX_DURATION_MINUTES {
      return Err(Error::DurationOutOfRange {
        got: self.duration_minutes,
        max: MAX_DURATION_MINUTES,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn service(species: &[&str]) -> Service {
    let now = Utc::now();
    Service {
      service_id: Uuid::new_v4(),
      establishment_id: Uuid::new_v4(),
      name: "Banho".into(),
      description: None,
      price: 50.0,
      duration_minutes: 45,
      category: "Banho e Tosa".into(),
      species: species.iter().map(|s| s.to_string()).collect(),
      status: ListingStatus::Active,
      created_at: now,
      updated_at: now,
    }
  }

  fn new_service(minutes: u32) -> NewService {
    NewService {
      service_id:       None,
      establishment_id: Uuid::new_v4(),
      name:             "Tosa".into(),
      description:      None,
      price:            80.0,
      duration_minutes: minutes,
      category:         "Banho e Tosa".into(),
      species:          vec![],
      status:           ListingStatus::Active,
    }
  }

  #[test]
  fn service_duration_fits_in_a_day() {
    assert!(new_service(0).validate().is_ok());
    assert!(new_service(MAX_DURATION_MINUTES).validate().is_ok());
    assert!(matches!(
      new_service(60_000).validate(),
      Err(Error::DurationOutOfRange { got: 60_000, .. })
    ));
  }

  #[test]
  fn service_name_is_required() {
    let mut s = new_service(30);
    s.name = "  ".into();
    assert_eq!(s.validate(), Err(Error::EmptyField { field: "service name" }));
  }

  #[test]
  fn empty_species_list_serves_everyone() {
    assert!(service(&[]).serves_species("iguana"));
  }

  #[test]
  fn species_match_ignores_case() {
    let s = service(&["Cachorro", "gato"]);
    assert!(s.serves_species("cachorro"));
    assert!(s.serves_species("GATO"));
    assert!(!s.serves_species("coelho"));
  }
}
