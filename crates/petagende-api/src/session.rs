//! Handlers for `/auth/*` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: sign-up form; 201 + profile |
//! | `POST` | `/auth/signin` | Body: `{"email","password"}`; returns a token |
//! | `POST` | `/auth/signout` | Bearer; 204 |
//! | `GET`  | `/auth/session` | Bearer; the caller's profile |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use petagende_core::{
  account::{Credentials, NewAccount, Session, SessionGrant},
  profile::{NewProfile, Profile},
  store::BookingStore,
  validate::{SignUpForm, normalize_email},
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::{self, CurrentUser},
  error::{ApiError, JsonBody},
};

/// `POST /auth/signup`
pub async fn sign_up<S>(
  State(state): State<ApiState<S>>,
  JsonBody(form): JsonBody<SignUpForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BookingStore + 'static,
{
  let valid = form.validate()?;
  let password_hash = auth::hash_password(&valid.password)?;

  let (_, profile) = state
    .store
    .create_account(NewAccount {
      email: valid.email,
      password_hash,
      profile: NewProfile { name: valid.name, tax_id: valid.tax_id },
    })
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(profile)))
}

/// `POST /auth/signin`
pub async fn sign_in<S>(
  State(state): State<ApiState<S>>,
  JsonBody(creds): JsonBody<Credentials>,
) -> Result<Json<SessionGrant>, ApiError>
where
  S: BookingStore + 'static,
{
  // A malformed email cannot belong to anyone; answer as for a bad password.
  let email = normalize_email(&creds.email).map_err(|_| ApiError::Unauthorized)?;

  let account = state
    .store
    .find_account(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !auth::verify_password(&creds.password, &account.password_hash) {
    tracing::info!(user_id = %account.user_id, "sign-in rejected");
    return Err(ApiError::Unauthorized);
  }

  let profile = own_profile(&state, account.user_id).await?;

  let token = auth::new_token();
  let now = Utc::now();
  let expires_at = now + state.session_ttl;
  state
    .store
    .create_session(Session {
      token_digest: auth::token_digest(&token),
      user_id: account.user_id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %account.user_id, %expires_at, "signed in");
  Ok(Json(SessionGrant { token, expires_at, profile }))
}

/// `POST /auth/signout`
pub async fn sign_out<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: BookingStore + 'static,
{
  state
    .store
    .delete_session(&user.token_digest)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: BookingStore + 'static,
{
  Ok(Json(own_profile(&state, user.user_id).await?))
}

pub(crate) async fn own_profile<S>(state: &ApiState<S>, user_id: Uuid) -> Result<Profile, ApiError>
where
  S: BookingStore + 'static,
{
  state
    .store
    .get_profile(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile for user {user_id} not found")))
}
