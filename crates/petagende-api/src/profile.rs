//! Handlers for `/profile`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profile` | Bearer |
//! | `PUT`  | `/profile` | Bearer; partial update, omitted fields untouched |

use axum::{Json, extract::State};
use petagende_core::{
  profile::{Profile, ProfilePatch},
  store::BookingStore,
  validate::normalize_tax_id,
};

use crate::{
  ApiState,
  auth::CurrentUser,
  error::{ApiError, JsonBody},
  session::own_profile,
};

/// `GET /profile`
pub async fn get_own<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: BookingStore + 'static,
{
  Ok(Json(own_profile(&state, user.user_id).await?))
}

/// `PUT /profile`
pub async fn update_own<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  JsonBody(mut patch): JsonBody<ProfilePatch>,
) -> Result<Json<Profile>, ApiError>
where
  S: BookingStore + 'static,
{
  patch.validate()?;
  patch.name = patch.name.map(|n| n.trim().to_owned());
  patch.tax_id = patch.tax_id.as_deref().map(normalize_tax_id).transpose()?;

  let profile = state
    .store
    .update_profile(user.user_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile for user {} not found", user.user_id)))?;
  Ok(Json(profile))
}
