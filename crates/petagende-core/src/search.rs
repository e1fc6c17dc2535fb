//! Query types for catalogue reads, and the matching rules backends apply.

use uuid::Uuid;

use crate::establishment::{Establishment, ListingStatus, Service};

/// Parameters for [`crate::store::BookingStore::search_establishments`].
#[derive(Debug, Clone, Default)]
pub struct EstablishmentQuery {
  /// Case-insensitive substring of the establishment name.
  pub name:             Option<String>,
  pub include_inactive: bool,
}

impl EstablishmentQuery {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn matches(&self, e: &Establishment) -> bool {
    (self.include_inactive || e.status == ListingStatus::Active)
      && self.name.as_deref().is_none_or(|q| contains_ignore_case(&e.name, q))
  }
}

/// Parameters for [`crate::store::BookingStore::search_services`].
#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
  pub establishment_id: Option<Uuid>,
  /// Case-insensitive substring of the service name.
  pub name:             Option<String>,
  /// Exact category.
  pub category:         Option<String>,
  /// Only services that serve this species.
  pub species:          Option<String>,
  pub include_inactive: bool,
}

impl ServiceQuery {
  /// Service-level predicates. Establishment status is the backend's job.
  pub fn matches(&self, s: &Service) -> bool {
    (self.include_inactive || s.status == ListingStatus::Active)
      && self.establishment_id.is_none_or(|id| s.establishment_id == id)
      && self.name.as_deref().is_none_or(|q| contains_ignore_case(&s.name, q))
      && self.category.as_deref().is_none_or(|c| s.category == c)
      && self.species.as_deref().is_none_or(|sp| s.serves_species(sp))
  }
}

/// `true` if `haystack` contains `needle`, ignoring case. A blank needle
/// matches everything; otherwise surrounding spaces are part of the needle.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
  needle.trim().is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn establishment(name: &str, status: ListingStatus) -> Establishment {
    let now = Utc::now();
    Establishment {
      establishment_id: Uuid::new_v4(),
      name: name.into(),
      description: None,
      tax_id: None,
      phone: None,
      email: None,
      address: None,
      opening_hours: None,
      photos: vec![],
      rating_average: None,
      rating_count: 0,
      status,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn substring_match_ignores_case() {
    assert!(contains_ignore_case("Pet Shop Amigo", "shop"));
    assert!(contains_ignore_case("Pet Shop Amigo", "PET SHOP"));
    assert!(contains_ignore_case("Clínica Veterinária", "VETERINÁRIA"));
    assert!(!contains_ignore_case("Pet Shop Amigo", "hotel"));
    assert!(contains_ignore_case("anything", "   "));
  }

  #[test]
  fn needle_is_matched_untrimmed() {
    assert!(!contains_ignore_case("PetShop", "shop "));
    assert!(contains_ignore_case("Pet Shop Amigo", "shop "));
    assert!(!contains_ignore_case("Pet Shop", " pet"));
  }

  #[test]
  fn name_filter_returns_exactly_the_matching_establishments() {
    let all = [
      establishment("Banho & Tosa Feliz", ListingStatus::Active),
      establishment("PETSHOP central", ListingStatus::Active),
      establishment("Hotel Canino", ListingStatus::Active),
      establishment("petshop fechado", ListingStatus::Inactive),
    ];
    let query = EstablishmentQuery::named("PetShop");
    let found: Vec<_> = all.iter().filter(|e| query.matches(e)).map(|e| e.name.as_str()).collect();
    assert_eq!(found, ["PETSHOP central"]);

    let with_inactive = EstablishmentQuery { include_inactive: true, ..query };
    assert_eq!(all.iter().filter(|e| with_inactive.matches(e)).count(), 2);
  }
}
