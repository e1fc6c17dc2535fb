//! Profile: the user-facing identity record, distinct from credentials.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A postal address, shared by profiles and establishments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub street:      Option<String>,
  pub number:      Option<String>,
  pub district:    Option<String>,
  pub city:        Option<String>,
  pub state:       Option<String>,
  pub postal_code: Option<String>,
}

impl Address {
  /// Single-line rendering of whichever parts are present.
  pub fn one_line(&self) -> String {
    let street = match (&self.street, &self.number) {
      (Some(s), Some(n)) => Some(format!("{s}, {n}")),
      (Some(s), None) => Some(s.clone()),
      _ => None,
    };
    [street, self.district.clone(), self.city.clone(), self.state.clone()]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join(" - ")
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id: Uuid,
  pub user_id:    Uuid,
  pub name:       String,
  pub phone:      Option<String>,
  /// Brazilian CPF, stored as 11 bare digits.
  pub tax_id:     Option<String>,
  pub birth_date: Option<NaiveDate>,
  pub photo_url:  Option<String>,
  pub address:    Option<Address>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Profile fields supplied at sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub name:   String,
  pub tax_id: Option<String>,
}

/// A partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
  pub name:       Option<String>,
  pub phone:      Option<String>,
  pub tax_id:     Option<String>,
  pub birth_date: Option<NaiveDate>,
  pub photo_url:  Option<String>,
  pub address:    Option<Address>,
}

impl ProfilePatch {
  /// A patch may leave the name alone but never blank it.
  pub fn validate(&self) -> Result<()> {
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::EmptyField { field: "name" });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn one_line_skips_missing_parts() {
    let addr = Address {
      street: Some("Rua das Flores".into()),
      number: Some("12".into()),
      city: Some("Recife".into()),
      state: Some("PE".into()),
      ..Address::default()
    };
    assert_eq!(addr.one_line(), "Rua das Flores, 12 - Recife - PE");
    assert_eq!(Address::default().one_line(), "");
  }
}
