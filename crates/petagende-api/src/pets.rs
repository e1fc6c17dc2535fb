//! Handlers for `/pets` endpoints. Every route is scoped to the caller; a pet
//! owned by someone else answers 404 exactly like a missing one.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/pets` | Newest first |
//! | `POST`   | `/pets` | Body: new pet; 201 |
//! | `GET`    | `/pets/{id}` | |
//! | `PUT`    | `/pets/{id}` | Partial update |
//! | `DELETE` | `/pets/{id}` | 204; 409 if the pet has appointments |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use petagende_core::{
  pet::{NewPet, Pet, PetPatch},
  store::BookingStore,
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  error::{ApiError, JsonBody},
};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("pet {id} not found")) }

/// `GET /pets`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<Pet>>, ApiError>
where
  S: BookingStore + 'static,
{
  let pets = state
    .store
    .list_pets(user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(pets))
}

/// `POST /pets`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  JsonBody(body): JsonBody<NewPet>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BookingStore + 'static,
{
  body.validate()?;
  let pet = state
    .store
    .add_pet(user.user_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(pet)))
}

/// `GET /pets/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Pet>, ApiError>
where
  S: BookingStore + 'static,
{
  let pet = state
    .store
    .get_pet(user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(pet))
}

/// `PUT /pets/{id}`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  JsonBody(patch): JsonBody<PetPatch>,
) -> Result<Json<Pet>, ApiError>
where
  S: BookingStore + 'static,
{
  patch.validate()?;
  let pet = state
    .store
    .update_pet(user.user_id, id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(pet))
}

/// `DELETE /pets/{id}`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: BookingStore + 'static,
{
  let deleted = state
    .store
    .delete_pet(user.user_id, id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(not_found(id));
  }
  Ok(StatusCode::NO_CONTENT)
}
