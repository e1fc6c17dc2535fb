//! Handlers for the public catalogue: establishments and their services.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/establishments` | Optional `?q=<name fragment>` |
//! | `GET`  | `/establishments/{id}` | 404 if not found |
//! | `GET`  | `/establishments/{id}/services` | Optional `?species=` |
//! | `GET`  | `/services` | `?q=&category=&species=&establishment_id=` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use petagende_core::{
  establishment::{Establishment, ServiceListing},
  search::{EstablishmentQuery, ServiceQuery},
  store::BookingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Treat `?q=` and friends with a blank value as absent. A non-blank value
/// is kept as sent.
fn present(v: Option<String>) -> Option<String> {
  v.filter(|s| !s.trim().is_empty())
}

// ─── Establishments ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EstablishmentParams {
  pub q: Option<String>,
}

/// `GET /establishments[?q=<fragment>]`
pub async fn list_establishments<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<EstablishmentParams>,
) -> Result<Json<Vec<Establishment>>, ApiError>
where
  S: BookingStore + 'static,
{
  let query = EstablishmentQuery { name: present(params.q), include_inactive: false };
  let found = state
    .store
    .search_establishments(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(found))
}

pub(crate) async fn require_establishment<S>(
  state: &ApiState<S>,
  id: Uuid,
) -> Result<Establishment, ApiError>
where
  S: BookingStore + 'static,
{
  state
    .store
    .get_establishment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("establishment {id} not found")))
}

/// `GET /establishments/{id}`
pub async fn get_establishment<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Establishment>, ApiError>
where
  S: BookingStore + 'static,
{
  Ok(Json(require_establishment(&state, id).await?))
}

// ─── Services ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SpeciesParams {
  pub species: Option<String>,
}

/// `GET /establishments/{id}/services[?species=<species>]`
pub async fn establishment_services<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<SpeciesParams>,
) -> Result<Json<Vec<ServiceListing>>, ApiError>
where
  S: BookingStore + 'static,
{
  require_establishment(&state, id).await?;
  let query = ServiceQuery {
    establishment_id: Some(id),
    species: present(params.species),
    ..ServiceQuery::default()
  };
  let found = state
    .store
    .search_services(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(found))
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceParams {
  pub q:                Option<String>,
  pub category:         Option<String>,
  pub species:          Option<String>,
  pub establishment_id: Option<Uuid>,
}

/// `GET /services`
pub async fn search_services<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ServiceParams>,
) -> Result<Json<Vec<ServiceListing>>, ApiError>
where
  S: BookingStore + 'static,
{
  let query = ServiceQuery {
    establishment_id: params.establishment_id,
    name:             present(params.q),
    category:         present(params.category),
    species:          present(params.species),
    include_inactive: false,
  };
  let found = state
    .store
    .search_services(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(found))
}
