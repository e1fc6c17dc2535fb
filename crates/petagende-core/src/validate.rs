//! Synchronous form validation, run before any request or write.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const TAX_ID_DIGITS: usize = 11;

/// The sign-up form as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpForm {
  pub email:                 String,
  pub password:              String,
  pub password_confirmation: String,
  pub name:                  String,
  pub tax_id:                Option<String>,
}

/// A sign-up form that passed validation, with normalised fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignUp {
  /// Trimmed and lower-cased.
  pub email:    String,
  pub password: String,
  pub name:     String,
  /// Bare digits.
  pub tax_id:   Option<String>,
}

impl SignUpForm {
  pub fn validate(self) -> Result<ValidSignUp> {
    if self.password != self.password_confirmation {
      return Err(Error::PasswordMismatch);
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    let email = normalize_email(&self.email)?;
    let name = self.name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::EmptyField { field: "name" });
    }
    let tax_id = self
      .tax_id
      .filter(|t| !t.trim().is_empty())
      .map(|t| normalize_tax_id(&t))
      .transpose()?;

    Ok(ValidSignUp { email, password: self.password, name, tax_id })
  }
}

/// Trim and lower-case an email, rejecting anything without a local part and
/// a dotted domain.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  let valid = email
    .split_once('@')
    .is_some_and(|(local, domain)| {
      !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
    })
    && !email.chars().any(char::is_whitespace);
  if valid { Ok(email) } else { Err(Error::InvalidEmail(raw.to_owned())) }
}

/// Strip punctuation from a CPF and require exactly 11 digits.
pub fn normalize_tax_id(raw: &str) -> Result<String> {
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  if digits.len() != TAX_ID_DIGITS {
    return Err(Error::InvalidTaxId { digits: digits.len() });
  }
  Ok(digits)
}

/// Render 11 CPF digits as `000.000.000-00`. Other input is returned as is.
pub fn format_tax_id(digits: &str) -> String {
  if digits.len() != TAX_ID_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return digits.to_owned();
  }
  format!(
    "{}.{}.{}-{}",
    &digits[0..3],
    &digits[3..6],
    &digits[6..9],
    &digits[9..11]
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form() -> SignUpForm {
    SignUpForm {
      email:                 " Ana@Example.com ".into(),
      password:              "secret1".into(),
      password_confirmation: "secret1".into(),
      name:                  "Ana".into(),
      tax_id:                Some("123.456.789-01".into()),
    }
  }

  #[test]
  fn valid_form_is_normalised() {
    let v = form().validate().unwrap();
    assert_eq!(v.email, "ana@example.com");
    assert_eq!(v.tax_id.as_deref(), Some("12345678901"));
  }

  #[test]
  fn mismatched_confirmation_is_checked_first() {
    let mut f = form();
    f.password_confirmation = "other".into();
    f.email = "nope".into();
    assert_eq!(f.validate(), Err(Error::PasswordMismatch));
  }

  #[test]
  fn short_password() {
    let mut f = form();
    f.password = "12345".into();
    f.password_confirmation = "12345".into();
    assert_eq!(f.validate(), Err(Error::PasswordTooShort { min: 6 }));
  }

  #[test]
  fn malformed_tax_id() {
    let mut f = form();
    f.tax_id = Some("123.456".into());
    assert_eq!(f.validate(), Err(Error::InvalidTaxId { digits: 6 }));
  }

  #[test]
  fn blank_tax_id_is_treated_as_absent() {
    let mut f = form();
    f.tax_id = Some("   ".into());
    assert_eq!(f.validate().unwrap().tax_id, None);
  }

  #[test]
  fn emails() {
    assert!(normalize_email("a@b.co").is_ok());
    for bad in ["", "a", "@b.co", "a@b", "a@.co", "a b@c.de", "a@b@c.de"] {
      assert!(normalize_email(bad).is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn formats_tax_id() {
    assert_eq!(format_tax_id("12345678901"), "123.456.789-01");
    assert_eq!(format_tax_id("123"), "123");
  }
}
