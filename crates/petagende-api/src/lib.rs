//! JSON REST API for PetAgende.
//!
//! Exposes an axum [`Router`] backed by any
//! [`petagende_core::store::BookingStore`]. User-scoped routes authenticate
//! with `Authorization: Bearer <token>`; TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", petagende_api::api_router(state))
//! ```

pub mod appointments;
pub mod auth;
pub mod calendar;
pub mod catalogue;
pub mod error;
pub mod pets;
pub mod profile;
pub mod reviews;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::Duration;
use petagende_core::{calendar::BookingCalendar, store::BookingStore};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:       Arc<S>,
  pub calendar:    Arc<BookingCalendar>,
  /// How long a freshly issued session token stays valid.
  pub session_ttl: Duration,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, calendar: BookingCalendar, session_ttl: Duration) -> Self {
    Self { store, calendar: Arc::new(calendar), session_ttl }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      calendar:    Arc::clone(&self.calendar),
      session_ttl: self.session_ttl,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: BookingStore + 'static,
{
  Router::new()
    // Auth
    .route("/auth/signup", post(session::sign_up::<S>))
    .route("/auth/signin", post(session::sign_in::<S>))
    .route("/auth/signout", post(session::sign_out::<S>))
    .route("/auth/session", get(session::current::<S>))
    // Profile & pets
    .route("/profile", get(profile::get_own::<S>).put(profile::update_own::<S>))
    .route("/pets", get(pets::list::<S>).post(pets::create::<S>))
    .route(
      "/pets/{id}",
      get(pets::get_one::<S>).put(pets::update::<S>).delete(pets::remove::<S>),
    )
    // Catalogue
    .route("/establishments", get(catalogue::list_establishments::<S>))
    .route("/establishments/{id}", get(catalogue::get_establishment::<S>))
    .route("/establishments/{id}/services", get(catalogue::establishment_services::<S>))
    .route("/establishments/{id}/reviews", get(reviews::list::<S>))
    .route("/services", get(catalogue::search_services::<S>))
    .route("/calendar", get(calendar::handler::<S>))
    // Appointments & reviews
    .route("/appointments", get(appointments::list::<S>).post(appointments::book::<S>))
    .route("/appointments/{id}", get(appointments::get_one::<S>))
    .route("/appointments/{id}/cancel", post(appointments::cancel::<S>))
    .route("/reviews", post(reviews::create::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
