//! Password hashing, session tokens and the bearer-token extractor.
//!
//! Tokens are 32 random bytes, URL-safe base64 encoded. Only the SHA-256
//! digest of a token is stored, so a leaked database cannot be replayed
//! against the API.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use petagende_core::store::BookingStore;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

const TOKEN_BYTES: usize = 32;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// `false` for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a token, the form sessions are stored under.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Pull the token out of an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller. Present in a handler means the request carried
/// a live session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user_id:      Uuid,
  pub token_digest: String,
}

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: BookingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let digest = token_digest(bearer_token(&parts.headers)?);

    let session = state
      .store
      .get_session(&digest)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    if session.is_expired(Utc::now()) {
      tracing::debug!(user_id = %session.user_id, "expired session presented");
      return Err(ApiError::Unauthorized);
    }

    Ok(CurrentUser { user_id: session.user_id, token_digest: digest })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("segredo").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("segredo", &hash));
    assert!(!verify_password("errado", &hash));
    assert!(!verify_password("segredo", "not a phc string"));
  }

  #[test]
  fn tokens_are_url_safe_and_unique() {
    let a = new_token();
    let b = new_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(a.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
  }

  #[test]
  fn digest_is_stable_hex() {
    let d = token_digest("abc");
    assert_eq!(d, token_digest("abc"));
    assert_eq!(d.len(), 64);
    assert_ne!(d, token_digest("abd"));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized)));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
    assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized)));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
    assert_eq!(bearer_token(&headers).unwrap(), "tok123");
  }
}
