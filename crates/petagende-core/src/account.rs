//! Credentials and sessions. Accounts and sessions never leave the server;
//! clients only see a [`SessionGrant`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::{NewProfile, Profile};

/// The authentication record behind a profile.
#[derive(Debug, Clone)]
pub struct Account {
  pub user_id:       Uuid,
  /// Lower-cased at sign-up; lookups are case-insensitive.
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::BookingStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub profile:       NewProfile,
}

/// A signed-in session. The store only ever sees the token digest.
#[derive(Debug, Clone)]
pub struct Session {
  pub token_digest: String,
  pub user_id:      Uuid,
  pub created_at:   DateTime<Utc>,
  pub expires_at:   DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

/// Sign-in request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

/// Returned by a successful sign-in. `token` is shown exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub profile:    Profile,
}
