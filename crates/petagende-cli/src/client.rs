//! Async HTTP client wrapping the PetAgende JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use petagende_core::{
  account::{Credentials, SessionGrant},
  appointment::{Appointment, AppointmentDetail, BookingRequest},
  calendar::CalendarView,
  establishment::{Establishment, ServiceListing},
  pet::{NewPet, Pet, PetPatch},
  profile::{Profile, ProfilePatch},
  review::{NewReview, Review},
  validate::SignUpForm,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the PetAgende API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Session token from `petagende signin`, if any.
  pub token:    Option<String>,
}

/// Filters for `GET /services`.
#[derive(Debug, Default, Serialize)]
pub struct ServiceFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub q:                Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub species:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub establishment_id: Option<Uuid>,
}

/// Async HTTP client for the PetAgende JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    tracing::debug!(%method, path, "request");
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send `req`, turning a non-success status into an error carrying the
  /// server's `{"error": …}` message.
  async fn send(req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned));
    Err(match (status, message) {
      (StatusCode::UNAUTHORIZED, _) if what != "POST /auth/signin" => {
        anyhow!("{what} → {status}: not signed in (run `petagende signin`)")
      }
      (_, Some(message)) => anyhow!("{what} → {status}: {message}"),
      (_, None) => anyhow!("{what} → {status}"),
    })
  }

  async fn json<T: DeserializeOwned>(req: RequestBuilder, what: &str) -> Result<T> {
    Self::send(req, what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response to {what}"))
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/signup`
  pub async fn sign_up(&self, form: &SignUpForm) -> Result<Profile> {
    Self::json(self.request(Method::POST, "/auth/signup").json(form), "POST /auth/signup").await
  }

  /// `POST /api/auth/signin`
  pub async fn sign_in(&self, creds: &Credentials) -> Result<SessionGrant> {
    Self::json(self.request(Method::POST, "/auth/signin").json(creds), "POST /auth/signin").await
  }

  /// `POST /api/auth/signout`
  pub async fn sign_out(&self) -> Result<()> {
    Self::send(self.request(Method::POST, "/auth/signout"), "POST /auth/signout").await?;
    Ok(())
  }

  /// `GET /api/auth/session`
  pub async fn session(&self) -> Result<Profile> {
    Self::json(self.request(Method::GET, "/auth/session"), "GET /auth/session").await
  }

  // ── Profile ───────────────────────────────────────────────────────────────

  /// `GET /api/profile`
  pub async fn profile(&self) -> Result<Profile> {
    Self::json(self.request(Method::GET, "/profile"), "GET /profile").await
  }

  /// `PUT /api/profile`
  pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Profile> {
    Self::json(self.request(Method::PUT, "/profile").json(patch), "PUT /profile").await
  }

  // ── Pets ──────────────────────────────────────────────────────────────────

  /// `GET /api/pets`
  pub async fn list_pets(&self) -> Result<Vec<Pet>> {
    Self::json(self.request(Method::GET, "/pets"), "GET /pets").await
  }

  /// `POST /api/pets`
  pub async fn add_pet(&self, pet: &NewPet) -> Result<Pet> {
    Self::json(self.request(Method::POST, "/pets").json(pet), "POST /pets").await
  }

  /// `PUT /api/pets/{id}`
  pub async fn update_pet(&self, id: Uuid, patch: &PetPatch) -> Result<Pet> {
    let path = format!("/pets/{id}");
    Self::json(self.request(Method::PUT, &path).json(patch), &format!("PUT {path}")).await
  }

  /// `DELETE /api/pets/{id}`
  pub async fn remove_pet(&self, id: Uuid) -> Result<()> {
    let path = format!("/pets/{id}");
    Self::send(self.request(Method::DELETE, &path), &format!("DELETE {path}")).await?;
    Ok(())
  }

  // ── Catalogue ─────────────────────────────────────────────────────────────

  /// `GET /api/establishments[?q=<query>]`
  pub async fn establishments(&self, query: Option<&str>) -> Result<Vec<Establishment>> {
    let mut req = self.request(Method::GET, "/establishments");
    if let Some(q) = query {
      req = req.query(&[("q", q)]);
    }
    Self::json(req, "GET /establishments").await
  }

  /// `GET /api/services`
  pub async fn services(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>> {
    Self::json(self.request(Method::GET, "/services").query(filter), "GET /services").await
  }

  /// `GET /api/establishments/{id}/reviews`
  pub async fn reviews(&self, establishment_id: Uuid) -> Result<Vec<Review>> {
    let path = format!("/establishments/{establishment_id}/reviews");
    Self::json(self.request(Method::GET, &path), &format!("GET {path}")).await
  }

  /// `GET /api/calendar`
  pub async fn calendar(&self) -> Result<CalendarView> {
    Self::json(self.request(Method::GET, "/calendar"), "GET /calendar").await
  }

  // ── Appointments & reviews ────────────────────────────────────────────────

  /// `GET /api/appointments`
  pub async fn appointments(&self) -> Result<Vec<AppointmentDetail>> {
    Self::json(self.request(Method::GET, "/appointments"), "GET /appointments").await
  }

  /// `GET /api/appointments/{id}`
  pub async fn appointment(&self, id: Uuid) -> Result<AppointmentDetail> {
    let path = format!("/appointments/{id}");
    Self::json(self.request(Method::GET, &path), &format!("GET {path}")).await
  }

  /// `POST /api/appointments`. The flag is `true` when the server replayed an
  /// earlier booking with the same request key.
  pub async fn book(&self, req: &BookingRequest) -> Result<(Appointment, bool)> {
    let resp =
      Self::send(self.request(Method::POST, "/appointments").json(req), "POST /appointments")
        .await?;
    let replayed = resp.status() == StatusCode::OK;
    let appointment = resp.json().await.context("deserialising appointment")?;
    Ok((appointment, replayed))
  }

  /// `POST /api/appointments/{id}/cancel`
  pub async fn cancel(&self, id: Uuid) -> Result<Appointment> {
    let path = format!("/appointments/{id}/cancel");
    Self::json(self.request(Method::POST, &path), &format!("POST {path}")).await
  }

  /// `POST /api/reviews`
  pub async fn review(&self, review: &NewReview) -> Result<Review> {
    Self::json(self.request(Method::POST, "/reviews").json(review), "POST /reviews").await
  }
}
