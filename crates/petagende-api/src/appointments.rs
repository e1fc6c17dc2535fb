//! Handlers for `/appointments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/appointments` | Caller's history, newest date and time first |
//! | `POST` | `/appointments` | Body: booking request; 201 new, 200 replay |
//! | `GET`  | `/appointments/{id}` | 404 if missing or not the caller's |
//! | `POST` | `/appointments/{id}/cancel` | `scheduled` → `cancelled` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use petagende_core::{
  appointment::{Appointment, AppointmentDetail, AppointmentStatus, BookingRequest, NewAppointment},
  clock::SlotWindow,
  establishment::ListingStatus,
  store::BookingStore,
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  catalogue::require_establishment,
  error::{ApiError, JsonBody},
};

/// `GET /appointments`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<AppointmentDetail>>, ApiError>
where
  S: BookingStore + 'static,
{
  let history = state
    .store
    .list_appointments(user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}

/// `POST /appointments`
///
/// A request key the caller already used returns the stored appointment
/// untouched, whatever changed since. Otherwise every check that can fail
/// runs before the store is asked to write. The end time is the start plus
/// the service duration as plain minute arithmetic, even when that runs past
/// midnight.
pub async fn book<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  JsonBody(req): JsonBody<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError>
where
  S: BookingStore + 'static,
{
  if let Some(key) = req.request_key {
    let previous = state
      .store
      .find_booking(user.user_id, key)
      .await
      .map_err(ApiError::store)?;
    if let Some(existing) = previous {
      tracing::debug!(appointment_id = %existing.appointment_id, "booking replayed");
      return Ok((StatusCode::OK, Json(existing)));
    }
  }

  let date = state.calendar.date_for_day(req.day)?;
  let start = state.calendar.offered_time(&req.time)?;

  let pet = state
    .store
    .get_pet(user.user_id, req.pet_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("pet {} not found", req.pet_id)))?;

  let service = state
    .store
    .get_service(req.service_id)
    .await
    .map_err(ApiError::store)?
    .filter(|s| s.status == ListingStatus::Active)
    .ok_or_else(|| ApiError::NotFound(format!("service {} not available", req.service_id)))?;

  let establishment = require_establishment(&state, service.establishment_id).await?;
  if establishment.status != ListingStatus::Active {
    return Err(ApiError::NotFound(format!(
      "establishment {} not available",
      establishment.establishment_id
    )));
  }

  if !service.serves_species(&pet.species) {
    return Err(ApiError::BadRequest(format!(
      "{} is not offered for {}",
      service.name, pet.species
    )));
  }

  let window = SlotWindow::derive(start, service.duration_minutes)?;
  if window.crosses_midnight() {
    tracing::warn!(
      service_id = %service.service_id,
      start = %window.start,
      end = %window.end,
      "appointment window runs past midnight"
    );
  }

  let booking = state
    .store
    .book(NewAppointment {
      request_key: req.request_key.unwrap_or_else(Uuid::new_v4),
      user_id: user.user_id,
      pet_id: pet.pet_id,
      service_id: service.service_id,
      establishment_id: service.establishment_id,
      date,
      window,
      price: service.price,
      notes: req.notes.filter(|n| !n.trim().is_empty()),
    })
    .await
    .map_err(ApiError::store)?;

  let status = if booking.replayed { StatusCode::OK } else { StatusCode::CREATED };
  Ok((status, Json(booking.appointment)))
}

/// `GET /appointments/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDetail>, ApiError>
where
  S: BookingStore + 'static,
{
  let detail = state
    .store
    .get_appointment(user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;
  Ok(Json(detail))
}

/// `POST /appointments/{id}/cancel`
pub async fn cancel<S>(
  State(state): State<ApiState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError>
where
  S: BookingStore + 'static,
{
  let appointment = state
    .store
    .set_appointment_status(Some(user.user_id), id, AppointmentStatus::Cancelled)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appointment))
}
