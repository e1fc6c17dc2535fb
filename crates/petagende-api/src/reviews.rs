//! Handlers for reviews.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reviews` | Bearer; only the caller's completed appointments |
//! | `GET`  | `/establishments/{id}/reviews` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use petagende_core::{
  review::{NewReview, Rating, Review},
  store::BookingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  catalogue::require_establishment,
  error::{ApiError, JsonBody},
};

/// The rating arrives as a bare integer so an out-of-range value is a
/// validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub appointment_id: Uuid,
  pub rating:         u8,
  pub comment:        Option<String>,
}

/// `POST /reviews`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  JsonBody(body): JsonBody<ReviewBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BookingStore + 'static,
{
  let input = NewReview {
    appointment_id: body.appointment_id,
    rating:         Rating::new(body.rating)?,
    comment:        body.comment.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
  };
  let review = state
    .store
    .add_review(user.user_id, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(review)))
}

/// `GET /establishments/{id}/reviews`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: BookingStore + 'static,
{
  require_establishment(&state, id).await?;
  let reviews = state
    .store
    .list_reviews(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reviews))
}
