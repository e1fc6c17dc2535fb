//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::Duration;
use petagende_core::{
  appointment::AppointmentStatus,
  calendar::BookingCalendar,
  clock::MAX_DURATION_MINUTES,
  establishment::{Establishment, ListingStatus, NewEstablishment, NewService, Service},
  store::BookingStore,
};
use petagende_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiState, api_router};

struct Harness {
  app:   Router,
  store: Arc<SqliteStore>,
}

async fn harness() -> Harness { harness_with(BookingCalendar::default()).await }

async fn harness_with(calendar: BookingCalendar) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store.clone(), calendar, Duration::hours(1));
  Harness { app: api_router(state), store }
}

impl Harness {
  async fn call(
    &self,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn sign_up(&self, email: &str) -> (StatusCode, Value) {
    self
      .call(
        "POST",
        "/auth/signup",
        None,
        Some(json!({
          "email": email,
          "password": "segredo",
          "password_confirmation": "segredo",
          "name": "Ana Souza",
          "tax_id": "123.456.789-09",
        })),
      )
      .await
  }

  /// Sign up and sign in, returning a bearer token.
  async fn user(&self, email: &str) -> String {
    let (status, _) = self.sign_up(email).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = self
      .call(
        "POST",
        "/auth/signin",
        None,
        Some(json!({ "email": email, "password": "segredo" })),
      )
      .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
  }

  async fn pet(&self, token: &str, name: &str) -> String {
    let (status, body) = self
      .call("POST", "/pets", Some(token), Some(json!({ "name": name, "species": "dog" })))
      .await;
    assert_eq!(status, StatusCode::CREATED);
    body["pet_id"].as_str().unwrap().to_owned()
  }

  async fn shop(&self, name: &str, minutes: u32) -> (Establishment, Service) {
    let shop = self.store.put_establishment(NewEstablishment::new(name)).await.unwrap();
    let service = self.offer(&shop, |s| s.duration_minutes = minutes).await;
    (shop, service)
  }

  /// Upsert a "Banho" service at `shop`, adjusted by `edit`.
  async fn offer(&self, shop: &Establishment, edit: impl FnOnce(&mut NewService)) -> Service {
    let mut input = NewService {
      service_id:       None,
      establishment_id: shop.establishment_id,
      name:             "Banho".into(),
      description:      None,
      price:            60.0,
      duration_minutes: 45,
      category:         "banho".into(),
      species:          vec![],
      status:           ListingStatus::Active,
    };
    edit(&mut input);
    self.store.put_service(input).await.unwrap()
  }
}

fn booking(pet_id: &str, service: &Service, day: u32, time: &str) -> Value {
  json!({
    "pet_id": pet_id,
    "service_id": service.service_id,
    "day": day,
    "time": time,
  })
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_returns_profile_with_bare_tax_id() {
  let h = harness().await;
  let (status, body) = h.sign_up("ana@example.com").await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["name"], "Ana Souza");
  assert_eq!(body["tax_id"], "12345678909");
}

#[tokio::test]
async fn sign_up_validation_runs_before_any_write() {
  let h = harness().await;
  let (status, body) = h
    .call(
      "POST",
      "/auth/signup",
      None,
      Some(json!({
        "email": "ana@example.com",
        "password": "segredo",
        "password_confirmation": "segredo!",
        "name": "Ana",
      })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("match"));

  // The email is still free.
  let (status, _) = h.sign_up("ana@example.com").await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_sign_up_is_a_conflict() {
  let h = harness().await;
  h.sign_up("ana@example.com").await;
  let (status, _) = h.sign_up("ANA@example.com").await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let h = harness().await;
  h.sign_up("ana@example.com").await;
  let (status, body) = h
    .call(
      "POST",
      "/auth/signin",
      None,
      Some(json!({ "email": "ana@example.com", "password": "errado" })),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn session_lifecycle() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;

  let (status, body) = h.call("GET", "/auth/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Ana Souza");

  let (status, _) = h.call("POST", "/auth/signout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = h.call("GET", "/auth/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_routes_need_a_token() {
  let h = harness().await;
  for (method, uri) in [("GET", "/pets"), ("GET", "/profile"), ("GET", "/appointments")] {
    let (status, _) = h.call(method, uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
  }
  let (status, _) = h.call("GET", "/pets", Some("made-up"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Profile & pets ──────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_patch() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;

  let (status, body) = h
    .call(
      "PUT",
      "/profile",
      Some(&token),
      Some(json!({ "phone": "81999990000", "address": { "city": "Recife" } })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["phone"], "81999990000");
  assert_eq!(body["address"]["city"], "Recife");
  assert_eq!(body["name"], "Ana Souza");

  let (status, _) = h
    .call("PUT", "/profile", Some(&token), Some(json!({ "tax_id": "123" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pets_are_private_to_their_owner() {
  let h = harness().await;
  let ana = h.user("ana@example.com").await;
  let bia = h.user("bia@example.com").await;
  let rex = h.pet(&ana, "Rex").await;
  h.pet(&ana, "Mel").await;

  let (_, list) = h.call("GET", "/pets", Some(&ana), None).await;
  let names: Vec<_> = list.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
  assert_eq!(names, [json!("Mel"), json!("Rex")]);

  let uri = format!("/pets/{rex}");
  let (status, _) = h.call("GET", &uri, Some(&bia), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = h.call("DELETE", &uri, Some(&bia), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = h
    .call("PUT", &uri, Some(&ana), Some(json!({ "age": 3, "vaccinated": true })))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["age"], 3);
  assert_eq!(body["vaccinated"], true);

  let (status, _) = h.call("DELETE", &uri, Some(&ana), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = h.call("GET", &uri, Some(&ana), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_pet_name_is_rejected() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let (status, _) = h
    .call("POST", "/pets", Some(&token), Some(json!({ "name": " ", "species": "dog" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn establishment_name_filter_ignores_case() {
  let h = harness().await;
  h.shop("Pet Feliz", 30).await;
  h.shop("Clínica Amigo", 30).await;

  let (status, body) = h.call("GET", "/establishments?q=FELIZ", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body.as_array().unwrap().iter().map(|e| e["name"].clone()).collect();
  assert_eq!(names, [json!("Pet Feliz")]);

  let (_, body) = h.call("GET", "/establishments?q=", None, None).await;
  assert_eq!(body.as_array().unwrap().len(), 2);

  let (_, body) = h.call("GET", "/establishments?q=feliz%20", None, None).await;
  assert!(body.as_array().unwrap().is_empty());
  let (_, body) = h.call("GET", "/establishments?q=pet%20", None, None).await;
  assert_eq!(body[0]["name"], "Pet Feliz");

  let (status, _) = h
    .call("GET", &format!("/establishments/{}", Uuid::new_v4()), None, None)
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn services_embed_their_establishment() {
  let h = harness().await;
  let (shop, _) = h.shop("Pet Feliz", 30).await;

  let (status, body) = h.call("GET", "/services?q=banho", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["name"], "Banho");
  assert_eq!(body[0]["establishment"]["name"], "Pet Feliz");

  let (_, body) = h
    .call("GET", &format!("/establishments/{}/services", shop.establishment_id), None, None)
    .await;
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn calendar_lists_open_days_and_times() {
  let h = harness().await;
  let (status, body) = h.call("GET", "/calendar", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["year"], 2025);
  assert_eq!(body["month"], 6);
  assert_eq!(body["open_days"][0], 10);
  assert_eq!(body["open_days"].as_array().unwrap().len(), 21);
  assert_eq!(body["times"][0], "10:50");
}

// ─── Booking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_derives_the_end_time() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", 45).await;

  let (status, body) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 12, "14:30")))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["start"], "14:30");
  assert_eq!(body["end"], "15:15");
  assert_eq!(body["date"], "2025-06-12");
  assert_eq!(body["status"], "scheduled");
  assert_eq!(body["price"], 60.0);
}

#[tokio::test]
async fn late_slot_runs_past_midnight_unwrapped() {
  let calendar = BookingCalendar {
    times: vec!["23:50".parse().unwrap()],
    ..BookingCalendar::default()
  };
  let h = harness_with(calendar).await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", 30).await;

  let (status, body) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 12, "23:50")))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["end"], "24:20");
  assert_eq!(body["date"], "2025-06-12");
}

#[tokio::test]
async fn resubmitted_booking_is_replayed() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", 45).await;

  let mut req = booking(&pet, &service, 12, "10:50");
  req["request_key"] = json!(Uuid::new_v4());

  let (first, a) = h.call("POST", "/appointments", Some(&token), Some(req.clone())).await;
  let (second, b) = h.call("POST", "/appointments", Some(&token), Some(req)).await;
  assert_eq!(first, StatusCode::CREATED);
  assert_eq!(second, StatusCode::OK);
  assert_eq!(a["appointment_id"], b["appointment_id"]);

  let (_, history) = h.call("GET", "/appointments", Some(&token), None).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn replay_survives_later_catalogue_changes() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (shop, service) = h.shop("Pet Feliz", 45).await;

  let mut req = booking(&pet, &service, 12, "10:50");
  req["request_key"] = json!(Uuid::new_v4());
  let (first, a) = h.call("POST", "/appointments", Some(&token), Some(req.clone())).await;
  assert_eq!(first, StatusCode::CREATED);

  h.offer(&shop, |s| {
    s.service_id = Some(service.service_id);
    s.status = ListingStatus::Inactive;
  })
  .await;

  let (second, b) = h.call("POST", "/appointments", Some(&token), Some(req)).await;
  assert_eq!(second, StatusCode::OK);
  assert_eq!(a["appointment_id"], b["appointment_id"]);
  assert_eq!(b["end"], "11:35");

  // A fresh key still sees the inactive service.
  let (status, _) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 13, "10:50")))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_for_another_species_is_rejected() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let dog = h.pet(&token, "Rex").await;
  let shop = h.store.put_establishment(NewEstablishment::new("Gatil")).await.unwrap();
  let cats_only = h.offer(&shop, |s| s.species = vec!["cat".into()]).await;

  let (status, body) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&dog, &cats_only, 12, "10:50")))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("dog"));

  let (_, history) = h.call("GET", "/appointments", Some(&token), None).await;
  assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn inactive_establishment_cannot_be_booked() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (shop, service) = h.shop("Pet Feliz", 45).await;

  h.store
    .put_establishment(NewEstablishment {
      establishment_id: Some(shop.establishment_id),
      status: ListingStatus::Inactive,
      ..NewEstablishment::new("Pet Feliz")
    })
    .await
    .unwrap();

  let (status, _) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 12, "10:50")))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, history) = h.call("GET", "/appointments", Some(&token), None).await;
  assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn longest_service_reads_back_from_history() {
  let calendar = BookingCalendar {
    times: vec!["23:50".parse().unwrap()],
    ..BookingCalendar::default()
  };
  let h = harness_with(calendar).await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", MAX_DURATION_MINUTES).await;

  let (status, body) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 12, "23:50")))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["end"], "47:49");

  let (status, history) = h.call("GET", "/appointments", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history[0]["end"], "47:49");
}

#[tokio::test]
async fn invalid_days_and_times_are_rejected() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", 45).await;

  for (day, time) in [(31, "10:50"), (0, "10:50"), (5, "10:50"), (12, "12:00"), (12, "noon")] {
    let (status, _) = h
      .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, day, time)))
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "day {day} at {time}");
  }

  let (_, history) = h.call("GET", "/appointments", Some(&token), None).await;
  assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn booking_needs_own_pet_and_active_service() {
  let h = harness().await;
  let ana = h.user("ana@example.com").await;
  let bia = h.user("bia@example.com").await;
  let rex = h.pet(&ana, "Rex").await;
  let (shop, service) = h.shop("Pet Feliz", 45).await;

  let (status, _) = h
    .call("POST", "/appointments", Some(&bia), Some(booking(&rex, &service, 12, "10:50")))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  h.store
    .put_service(NewService {
      service_id:       Some(service.service_id),
      establishment_id: shop.establishment_id,
      name:             service.name.clone(),
      description:      None,
      price:            service.price,
      duration_minutes: service.duration_minutes,
      category:         service.category.clone(),
      species:          vec![],
      status:           ListingStatus::Inactive,
    })
    .await
    .unwrap();
  let (status, _) = h
    .call("POST", "/appointments", Some(&ana), Some(booking(&rex, &service, 12, "10:50")))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn taken_slot_conflicts_until_cancelled() {
  let h = harness().await;
  let ana = h.user("ana@example.com").await;
  let bia = h.user("bia@example.com").await;
  let rex = h.pet(&ana, "Rex").await;
  let mel = h.pet(&bia, "Mel").await;
  let (_, service) = h.shop("Pet Feliz", 45).await;

  let (_, first) = h
    .call("POST", "/appointments", Some(&ana), Some(booking(&rex, &service, 12, "11:00")))
    .await;
  let (status, body) = h
    .call("POST", "/appointments", Some(&bia), Some(booking(&mel, &service, 12, "11:00")))
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("already booked"));

  let id = first["appointment_id"].as_str().unwrap();
  let (status, _) = h
    .call("POST", &format!("/appointments/{id}/cancel"), Some(&bia), None)
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, body) = h
    .call("POST", &format!("/appointments/{id}/cancel"), Some(&ana), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "cancelled");

  let (status, _) = h
    .call("POST", "/appointments", Some(&bia), Some(booking(&mel, &service, 12, "11:00")))
    .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = h
    .call("POST", &format!("/appointments/{id}/cancel"), Some(&ana), None)
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn history_embeds_service_pet_and_establishment() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (_, service) = h.shop("Pet Feliz", 45).await;
  h.call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 11, "16:15")))
    .await;
  h.call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 20, "10:50")))
    .await;

  let (status, body) = h.call("GET", "/appointments", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["date"], "2025-06-20");
  assert_eq!(body[1]["date"], "2025-06-11");
  assert_eq!(body[0]["service"]["name"], "Banho");
  assert_eq!(body[0]["pet"]["name"], "Rex");
  assert_eq!(body[0]["establishment"]["name"], "Pet Feliz");
}

#[tokio::test]
async fn unreadable_bodies_get_json_errors() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;

  let (status, body) = h
    .call(
      "POST",
      "/reviews",
      Some(&token),
      Some(json!({ "appointment_id": Uuid::new_v4(), "rating": 300 })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, body) = h
    .call("POST", "/pets", Some(&token), Some(json!("just a string")))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reviews_require_a_completed_appointment() {
  let h = harness().await;
  let token = h.user("ana@example.com").await;
  let pet = h.pet(&token, "Rex").await;
  let (shop, service) = h.shop("Pet Feliz", 45).await;

  let (_, appt) = h
    .call("POST", "/appointments", Some(&token), Some(booking(&pet, &service, 12, "10:50")))
    .await;
  let appointment_id: Uuid = appt["appointment_id"].as_str().unwrap().parse().unwrap();
  let review = json!({ "appointment_id": appointment_id, "rating": 4, "comment": "Ótimo" });

  let (status, _) = h.call("POST", "/reviews", Some(&token), Some(review.clone())).await;
  assert_eq!(status, StatusCode::CONFLICT);

  h.store
    .set_appointment_status(None, appointment_id, AppointmentStatus::Completed)
    .await
    .unwrap();

  let (status, _) = h
    .call(
      "POST",
      "/reviews",
      Some(&token),
      Some(json!({ "appointment_id": appointment_id, "rating": 6 })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = h.call("POST", "/reviews", Some(&token), Some(review.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["rating"], 4);

  let (status, _) = h.call("POST", "/reviews", Some(&token), Some(review)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let uri = format!("/establishments/{}", shop.establishment_id);
  let (_, body) = h.call("GET", &uri, None, None).await;
  assert_eq!(body["rating_average"], 4.0);
  assert_eq!(body["rating_count"], 1);

  let (_, body) = h.call("GET", &format!("{uri}/reviews"), None, None).await;
  assert_eq!(body[0]["comment"], "Ótimo");
}
