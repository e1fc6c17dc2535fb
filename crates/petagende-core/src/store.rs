//! The `BookingStore` trait: the repository abstraction over the system of
//! record.
//!
//! Implemented by storage backends (e.g. `petagende-store-sqlite`). The API
//! and server depend on this trait, not on a concrete backend. Every
//! user-scoped read and write takes the owning user's id and behaves as if
//! rows belonging to other users do not exist.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Session},
  appointment::{Appointment, AppointmentDetail, AppointmentStatus, Booking, NewAppointment},
  establishment::{Establishment, NewEstablishment, NewService, Service, ServiceListing},
  pet::{NewPet, Pet, PetPatch},
  profile::{Profile, ProfilePatch},
  review::{NewReview, Review},
  search::{EstablishmentQuery, ServiceQuery},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Coarse classification of a backend failure, used to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The input failed domain validation.
  Invalid,
  /// A referenced row does not exist (or is not visible to the caller).
  NotFound,
  /// The write contradicts existing state: slot taken, duplicate review,
  /// email in use, illegal status change.
  Conflict,
  /// Anything else: I/O, corrupt rows, driver errors.
  Internal,
}

/// Implemented by every backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a PetAgende backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait BookingStore: Send + Sync {
  type Error: StoreError;

  // ── Accounts & sessions ───────────────────────────────────────────────

  /// Create an account and its profile together. Fails with a conflict if
  /// the email is already registered.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<(Account, Profile), Self::Error>> + Send + '_;

  /// Look up an account by (already normalised) email.
  fn find_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns the session for `token_digest`, expired or not.
  fn get_session<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Returns `false` if no such session existed.
  fn delete_session<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn update_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  // ── Pets ──────────────────────────────────────────────────────────────

  fn add_pet(
    &self,
    owner_id: Uuid,
    input: NewPet,
  ) -> impl Future<Output = Result<Pet, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_pets(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Pet>, Self::Error>> + Send + '_;

  fn get_pet(
    &self,
    owner_id: Uuid,
    pet_id: Uuid,
  ) -> impl Future<Output = Result<Option<Pet>, Self::Error>> + Send + '_;

  fn update_pet(
    &self,
    owner_id: Uuid,
    pet_id: Uuid,
    patch: PetPatch,
  ) -> impl Future<Output = Result<Option<Pet>, Self::Error>> + Send + '_;

  /// Returns `false` if the pet did not exist or belongs to someone else.
  fn delete_pet(
    &self,
    owner_id: Uuid,
    pet_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Catalogue ─────────────────────────────────────────────────────────

  /// Insert, or replace when `input.establishment_id` names an existing row.
  /// Rating aggregates are preserved on replace.
  fn put_establishment(
    &self,
    input: NewEstablishment,
  ) -> impl Future<Output = Result<Establishment, Self::Error>> + Send + '_;

  fn get_establishment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Establishment>, Self::Error>> + Send + '_;

  /// Ordered by name.
  fn search_establishments<'a>(
    &'a self,
    query: &'a EstablishmentQuery,
  ) -> impl Future<Output = Result<Vec<Establishment>, Self::Error>> + Send + 'a;

  /// Insert, or replace when `input.service_id` names an existing row. The
  /// establishment must exist.
  fn put_service(
    &self,
    input: NewService,
  ) -> impl Future<Output = Result<Service, Self::Error>> + Send + '_;

  fn get_service(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Service>, Self::Error>> + Send + '_;

  /// Ordered by category, then name. Unless `include_inactive` is set, only
  /// active services of active establishments are returned.
  fn search_services<'a>(
    &'a self,
    query: &'a ServiceQuery,
  ) -> impl Future<Output = Result<Vec<ServiceListing>, Self::Error>> + Send + 'a;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Persist a new scheduled appointment.
  ///
  /// If `input.request_key` was already used by the same user, the existing
  /// appointment is returned with `replayed = true`. A scheduled appointment
  /// at the same establishment, date and start time is a conflict.
  fn book(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Booking, Self::Error>> + Send + '_;

  /// The appointment a user already booked under `request_key`, if any.
  fn find_booking(
    &self,
    user_id: Uuid,
    request_key: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  fn get_appointment(
    &self,
    user_id: Uuid,
    appointment_id: Uuid,
  ) -> impl Future<Output = Result<Option<AppointmentDetail>, Self::Error>> + Send + '_;

  /// Date descending, then start time descending.
  fn list_appointments(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AppointmentDetail>, Self::Error>> + Send + '_;

  /// Move an appointment to `status`. `user_id = None` is the operator path
  /// and skips the ownership check. Illegal moves (see
  /// [`AppointmentStatus::can_become`]) are conflicts.
  fn set_appointment_status(
    &self,
    user_id: Option<Uuid>,
    appointment_id: Uuid,
    status: AppointmentStatus,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Record a review of the user's own completed appointment and fold the
  /// rating into the establishment's aggregate. One review per appointment.
  fn add_review(
    &self,
    user_id: Uuid,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_reviews(
    &self,
    establishment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;
}
