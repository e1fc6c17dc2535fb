//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision so that
//! lexical order is chronological. Structured fields (addresses, photo and
//! species lists, opening hours) are compact JSON. UUIDs are hyphenated
//! lowercase strings. Times of day are `HH:MM`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use petagende_core::{
  account::{Account, Session},
  appointment::{Appointment, AppointmentDetail, PetSummary, ServiceSummary},
  clock::ClockTime,
  establishment::{Establishment, EstablishmentSummary, Service, ServiceListing},
  pet::Pet,
  profile::{Address, Profile},
  review::{Rating, Review},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn decode_time(s: &str) -> Result<ClockTime> {
  s.parse().map_err(|e| Error::Decode(format!("{e}")))
}

/// Decode any strum-backed enum column.
pub fn decode_enum<T: FromStr>(column: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {column}: {s:?}")))
}

fn decode_u32(column: &str, v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Decode(format!("{column} out of range: {v}")))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_address(a: Option<&Address>) -> Result<Option<String>> {
  a.map(serde_json::to_string).transpose().map_err(Error::from)
}

fn decode_address(s: Option<String>) -> Result<Option<Address>> {
  s.as_deref()
    .map(serde_json::from_str)
    .transpose()
    .map_err(Error::from)
}

pub fn encode_strings(v: &[String]) -> Result<String> { Ok(serde_json::to_string(v)?) }

fn decode_strings(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Column lists ────────────────────────────────────────────────────────────
//
// Each list is paired with a `Raw*::from_row` that reads the same columns in
// the same order starting at a given offset.

pub const PROFILE_COLUMNS: &str = "pr.profile_id, pr.user_id, pr.name, pr.phone, \
   pr.tax_id, pr.birth_date, pr.photo_url, pr.address_json, pr.created_at, \
   pr.updated_at";

pub const PET_COLUMNS: &str = "p.pet_id, p.owner_id, p.name, p.species, p.breed, \
   p.age, p.weight_kg, p.sex, p.color, p.notes, p.photo_url, p.vaccinated, \
   p.created_at, p.updated_at";

pub const ESTABLISHMENT_COLUMNS: &str = "e.establishment_id, e.name, \
   e.description, e.tax_id, e.phone, e.email, e.address_json, \
   e.opening_hours_json, e.photos_json, e.rating_average, e.rating_count, \
   e.status, e.created_at, e.updated_at";

pub const SERVICE_COLUMNS: &str = "s.service_id, s.establishment_id, s.name, \
   s.description, s.price, s.duration_minutes, s.category, s.species_json, \
   s.status, s.created_at, s.updated_at";
pub const SERVICE_COLUMN_COUNT: usize = 11;

pub const APPOINTMENT_COLUMNS: &str = "a.appointment_id, a.user_id, a.pet_id, \
   a.service_id, a.establishment_id, a.date, a.start_time, a.end_time, a.price, \
   a.notes, a.status, a.request_key, a.created_at, a.updated_at";
pub const APPOINTMENT_COLUMN_COUNT: usize = 14;

/// Embedded establishment columns for listings.
pub const ESTABLISHMENT_SUMMARY_COLUMNS: &str =
  "e.establishment_id, e.name, e.address_json, e.rating_average";

pub const REVIEW_COLUMNS: &str = "r.review_id, r.user_id, r.appointment_id, \
   r.establishment_id, r.rating, r.comment, r.created_at";

// ─── Accounts & sessions ─────────────────────────────────────────────────────

pub struct RawAccount {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawSession {
  pub token_digest: String,
  pub user_id:      String,
  pub created_at:   String,
  pub expires_at:   String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_digest: self.token_digest,
      user_id:      decode_uuid(&self.user_id)?,
      created_at:   decode_dt(&self.created_at)?,
      expires_at:   decode_dt(&self.expires_at)?,
    })
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

pub struct RawProfile {
  profile_id:   String,
  user_id:      String,
  name:         String,
  phone:        Option<String>,
  tax_id:       Option<String>,
  birth_date:   Option<String>,
  photo_url:    Option<String>,
  address_json: Option<String>,
  created_at:   String,
  updated_at:   String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:   row.get(0)?,
      user_id:      row.get(1)?,
      name:         row.get(2)?,
      phone:        row.get(3)?,
      tax_id:       row.get(4)?,
      birth_date:   row.get(5)?,
      photo_url:    row.get(6)?,
      address_json: row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id: decode_uuid(&self.profile_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      phone:      self.phone,
      tax_id:     self.tax_id,
      birth_date: self.birth_date.as_deref().map(decode_date).transpose()?,
      photo_url:  self.photo_url,
      address:    decode_address(self.address_json)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Pet ─────────────────────────────────────────────────────────────────────

pub struct RawPet {
  pet_id:     String,
  owner_id:   String,
  name:       String,
  species:    String,
  breed:      Option<String>,
  age:        Option<i64>,
  weight_kg:  Option<f64>,
  sex:        Option<String>,
  color:      Option<String>,
  notes:      Option<String>,
  photo_url:  Option<String>,
  vaccinated: bool,
  created_at: String,
  updated_at: String,
}

impl RawPet {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      pet_id:     row.get(0)?,
      owner_id:   row.get(1)?,
      name:       row.get(2)?,
      species:    row.get(3)?,
      breed:      row.get(4)?,
      age:        row.get(5)?,
      weight_kg:  row.get(6)?,
      sex:        row.get(7)?,
      color:      row.get(8)?,
      notes:      row.get(9)?,
      photo_url:  row.get(10)?,
      vaccinated: row.get(11)?,
      created_at: row.get(12)?,
      updated_at: row.get(13)?,
    })
  }

  pub fn into_pet(self) -> Result<Pet> {
    Ok(Pet {
      pet_id:     decode_uuid(&self.pet_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      species:    self.species,
      breed:      self.breed,
      age:        self.age.map(|a| decode_u32("age", a)).transpose()?,
      weight_kg:  self.weight_kg,
      sex:        self.sex.as_deref().map(|s| decode_enum("sex", s)).transpose()?,
      color:      self.color,
      notes:      self.notes,
      photo_url:  self.photo_url,
      vaccinated: self.vaccinated,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Establishment ───────────────────────────────────────────────────────────

pub struct RawEstablishment {
  establishment_id:   String,
  name:               String,
  description:        Option<String>,
  tax_id:             Option<String>,
  phone:              Option<String>,
  email:              Option<String>,
  address_json:       Option<String>,
  opening_hours_json: Option<String>,
  photos_json:        String,
  rating_average:     Option<f64>,
  rating_count:       i64,
  status:             String,
  created_at:         String,
  updated_at:         String,
}

impl RawEstablishment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      establishment_id:   row.get(0)?,
      name:               row.get(1)?,
      description:        row.get(2)?,
      tax_id:             row.get(3)?,
      phone:              row.get(4)?,
      email:              row.get(5)?,
      address_json:       row.get(6)?,
      opening_hours_json: row.get(7)?,
      photos_json:        row.get(8)?,
      rating_average:     row.get(9)?,
      rating_count:       row.get(10)?,
      status:             row.get(11)?,
      created_at:         row.get(12)?,
      updated_at:         row.get(13)?,
    })
  }

  pub fn into_establishment(self) -> Result<Establishment> {
    Ok(Establishment {
      establishment_id: decode_uuid(&self.establishment_id)?,
      name:             self.name,
      description:      self.description,
      tax_id:           self.tax_id,
      phone:            self.phone,
      email:            self.email,
      address:          decode_address(self.address_json)?,
      opening_hours:    self
        .opening_hours_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      photos:           decode_strings(&self.photos_json)?,
      rating_average:   self.rating_average,
      rating_count:     decode_u32("rating_count", self.rating_count)?,
      status:           decode_enum("establishment status", &self.status)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawEstablishmentSummary {
  establishment_id: String,
  name:             String,
  address_json:     Option<String>,
  rating_average:   Option<f64>,
}

impl RawEstablishmentSummary {
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      establishment_id: row.get(at)?,
      name:             row.get(at + 1)?,
      address_json:     row.get(at + 2)?,
      rating_average:   row.get(at + 3)?,
    })
  }

  fn into_summary(self) -> Result<EstablishmentSummary> {
    Ok(EstablishmentSummary {
      establishment_id: decode_uuid(&self.establishment_id)?,
      name:             self.name,
      address:          decode_address(self.address_json)?,
      rating_average:   self.rating_average,
    })
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct RawService {
  service_id:       String,
  establishment_id: String,
  name:             String,
  description:      Option<String>,
  price:            f64,
  duration_minutes: i64,
  category:         String,
  species_json:     String,
  status:           String,
  created_at:       String,
  updated_at:       String,
}

impl RawService {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      service_id:       row.get(0)?,
      establishment_id: row.get(1)?,
      name:             row.get(2)?,
      description:      row.get(3)?,
      price:            row.get(4)?,
      duration_minutes: row.get(5)?,
      category:         row.get(6)?,
      species_json:     row.get(7)?,
      status:           row.get(8)?,
      created_at:       row.get(9)?,
      updated_at:       row.get(10)?,
    })
  }

  pub fn into_service(self) -> Result<Service> {
    Ok(Service {
      service_id:       decode_uuid(&self.service_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      name:             self.name,
      description:      self.description,
      price:            self.price,
      duration_minutes: decode_u32("duration_minutes", self.duration_minutes)?,
      category:         self.category,
      species:          decode_strings(&self.species_json)?,
      status:           decode_enum("service status", &self.status)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// A `services` row joined with its establishment summary.
pub struct RawServiceListing {
  service:       RawService,
  establishment: RawEstablishmentSummary,
}

impl RawServiceListing {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      service:       RawService::from_row(row)?,
      establishment: RawEstablishmentSummary::from_row_at(row, SERVICE_COLUMN_COUNT)?,
    })
  }

  pub fn into_listing(self) -> Result<ServiceListing> {
    Ok(ServiceListing {
      service:       self.service.into_service()?,
      establishment: self.establishment.into_summary()?,
    })
  }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

pub struct RawAppointment {
  appointment_id:   String,
  user_id:          String,
  pet_id:           String,
  service_id:       String,
  establishment_id: String,
  date:             String,
  start_time:       String,
  end_time:         String,
  price:            f64,
  notes:            Option<String>,
  status:           String,
  request_key:      String,
  created_at:       String,
  updated_at:       String,
}

impl RawAppointment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment_id:   row.get(0)?,
      user_id:          row.get(1)?,
      pet_id:           row.get(2)?,
      service_id:       row.get(3)?,
      establishment_id: row.get(4)?,
      date:             row.get(5)?,
      start_time:       row.get(6)?,
      end_time:         row.get(7)?,
      price:            row.get(8)?,
      notes:            row.get(9)?,
      status:           row.get(10)?,
      request_key:      row.get(11)?,
      created_at:       row.get(12)?,
      updated_at:       row.get(13)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      appointment_id:   decode_uuid(&self.appointment_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      pet_id:           decode_uuid(&self.pet_id)?,
      service_id:       decode_uuid(&self.service_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      date:             decode_date(&self.date)?,
      start:            decode_time(&self.start_time)?,
      end:              decode_time(&self.end_time)?,
      price:            self.price,
      notes:            self.notes,
      status:           decode_enum("appointment status", &self.status)?,
      request_key:      decode_uuid(&self.request_key)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Columns appended after [`APPOINTMENT_COLUMNS`] for the history view.
pub const APPOINTMENT_DETAIL_EXTRA_COLUMNS: &str = "s.name, s.description, \
   p.name, p.species, p.photo_url, e.establishment_id, e.name, e.address_json, \
   e.rating_average";

/// Joins required by [`APPOINTMENT_DETAIL_EXTRA_COLUMNS`].
pub const APPOINTMENT_DETAIL_JOINS: &str = "
   JOIN services       s ON s.service_id       = a.service_id
   JOIN pets           p ON p.pet_id           = a.pet_id
   JOIN establishments e ON e.establishment_id = a.establishment_id";

pub struct RawAppointmentDetail {
  appointment:         RawAppointment,
  service_name:        String,
  service_description: Option<String>,
  pet_name:            String,
  pet_species:         String,
  pet_photo_url:       Option<String>,
  establishment:       RawEstablishmentSummary,
}

impl RawAppointmentDetail {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let at = APPOINTMENT_COLUMN_COUNT;
    Ok(Self {
      appointment:         RawAppointment::from_row(row)?,
      service_name:        row.get(at)?,
      service_description: row.get(at + 1)?,
      pet_name:            row.get(at + 2)?,
      pet_species:         row.get(at + 3)?,
      pet_photo_url:       row.get(at + 4)?,
      establishment:       RawEstablishmentSummary::from_row_at(row, at + 5)?,
    })
  }

  pub fn into_detail(self) -> Result<AppointmentDetail> {
    Ok(AppointmentDetail {
      appointment:   self.appointment.into_appointment()?,
      service:       ServiceSummary {
        name:        self.service_name,
        description: self.service_description,
      },
      pet:           PetSummary {
        name:      self.pet_name,
        species:   self.pet_species,
        photo_url: self.pet_photo_url,
      },
      establishment: self.establishment.into_summary()?,
    })
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

pub struct RawReview {
  review_id:        String,
  user_id:          String,
  appointment_id:   String,
  establishment_id: String,
  rating:           i64,
  comment:          Option<String>,
  created_at:       String,
}

impl RawReview {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:        row.get(0)?,
      user_id:          row.get(1)?,
      appointment_id:   row.get(2)?,
      establishment_id: row.get(3)?,
      rating:           row.get(4)?,
      comment:          row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    let stars = u8::try_from(self.rating)
      .ok()
      .and_then(|s| Rating::new(s).ok())
      .ok_or_else(|| Error::Decode(format!("rating out of range: {}", self.rating)))?;
    Ok(Review {
      review_id:        decode_uuid(&self.review_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      appointment_id:   decode_uuid(&self.appointment_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      rating:           stars,
      comment:          self.comment,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 123_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    let mut encoded = [encode_dt(a), encode_dt(b), encode_dt(c)];
    encoded.sort();
    assert_eq!(encoded, [encode_dt(b), encode_dt(a), encode_dt(c)]);
    assert_eq!(decode_dt(&encode_dt(a)).unwrap(), a);
  }

  #[test]
  fn rejects_unknown_enum_text() {
    use petagende_core::appointment::AppointmentStatus;
    assert!(decode_enum::<AppointmentStatus>("status", "agendado").is_err());
  }
}
