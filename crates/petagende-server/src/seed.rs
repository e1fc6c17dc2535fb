//! Catalogue import for `petagende-server seed <catalogue.json>`.
//!
//! The file is a JSON array of establishments, each carrying its services:
//!
//! ```json
//! [
//!   {
//!     "establishment_id": "0b9c…",
//!     "name": "Pet Feliz",
//!     "address": { "city": "Recife", "state": "PE" },
//!     "services": [
//!       { "name": "Banho", "price": 60.0, "duration_minutes": 45, "category": "banho" }
//!     ]
//!   }
//! ]
//! ```
//!
//! Entries with ids are upserted, so re-running the same file is harmless.

use anyhow::Context as _;
use petagende_core::{
  establishment::{ListingStatus, NewEstablishment, NewService},
  store::BookingStore,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CatalogueEntry {
  #[serde(flatten)]
  pub establishment: NewEstablishment,
  #[serde(default)]
  pub services:      Vec<CatalogueService>,
}

/// A service as listed under its establishment.
#[derive(Debug, Deserialize)]
pub struct CatalogueService {
  pub service_id:       Option<Uuid>,
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

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub establishments: usize,
  pub services:       usize,
}

pub fn parse(json: &str) -> anyhow::Result<Vec<CatalogueEntry>> {
  serde_json::from_str(json).context("catalogue is not valid JSON")
}

pub async fn import<S: BookingStore>(
  store: &S,
  catalogue: Vec<CatalogueEntry>,
) -> anyhow::Result<SeedReport> {
  let mut report = SeedReport::default();

  for entry in catalogue {
    let name = entry.establishment.name.clone();
    let establishment = store
      .put_establishment(entry.establishment)
      .await
      .with_context(|| format!("failed to import establishment {name:?}"))?;
    report.establishments += 1;

    for service in entry.services {
      let service_name = service.name.clone();
      store
        .put_service(NewService {
          service_id:       service.service_id,
          establishment_id: establishment.establishment_id,
          name:             service.name,
          description:      service.description,
          price:            service.price,
          duration_minutes: service.duration_minutes,
          category:         service.category,
          species:          service.species,
          status:           service.status,
        })
        .await
        .with_context(|| format!("failed to import service {service_name:?} of {name:?}"))?;
      report.services += 1;
    }

    tracing::info!(
      establishment_id = %establishment.establishment_id,
      name = %establishment.name,
      "establishment imported"
    );
  }

  Ok(report)
}
