//! [`SqliteStore`]: the SQLite implementation of [`BookingStore`].

use std::path::Path;

use chrono::Utc;
use petagende_core::{
  account::{Account, NewAccount, Session},
  appointment::{Appointment, AppointmentDetail, AppointmentStatus, Booking, NewAppointment},
  establishment::{Establishment, NewEstablishment, NewService, Service, ServiceListing},
  pet::{NewPet, Pet, PetPatch},
  profile::{Profile, ProfilePatch},
  review::{NewReview, Review},
  search::{EstablishmentQuery, ServiceQuery},
  store::BookingStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    APPOINTMENT_COLUMNS, APPOINTMENT_DETAIL_EXTRA_COLUMNS, APPOINTMENT_DETAIL_JOINS,
    ESTABLISHMENT_COLUMNS, ESTABLISHMENT_SUMMARY_COLUMNS, PET_COLUMNS, PROFILE_COLUMNS,
    REVIEW_COLUMNS, RawAccount, RawAppointment, RawAppointmentDetail, RawEstablishment,
    RawPet, RawProfile, RawReview, RawService, RawServiceListing, RawSession,
    SERVICE_COLUMNS, decode_uuid, encode_address, encode_date, encode_dt, encode_strings,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A PetAgende store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row fetch helpers (run on the connection thread) ────────────────────────

fn fetch_profile(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawProfile>> {
  conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM profiles pr WHERE pr.user_id = ?1"),
      params![user_id],
      RawProfile::from_row,
    )
    .optional()
}

fn fetch_pet(
  conn: &Connection,
  owner_id: &str,
  pet_id: &str,
) -> rusqlite::Result<Option<RawPet>> {
  conn
    .query_row(
      &format!("SELECT {PET_COLUMNS} FROM pets p WHERE p.pet_id = ?1 AND p.owner_id = ?2"),
      params![pet_id, owner_id],
      RawPet::from_row,
    )
    .optional()
}

fn fetch_establishment(
  conn: &Connection,
  id: &str,
) -> rusqlite::Result<Option<RawEstablishment>> {
  conn
    .query_row(
      &format!(
        "SELECT {ESTABLISHMENT_COLUMNS} FROM establishments e WHERE e.establishment_id = ?1"
      ),
      params![id],
      RawEstablishment::from_row,
    )
    .optional()
}

fn fetch_service(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawService>> {
  conn
    .query_row(
      &format!("SELECT {SERVICE_COLUMNS} FROM services s WHERE s.service_id = ?1"),
      params![id],
      RawService::from_row,
    )
    .optional()
}

fn fetch_appointment(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawAppointment>> {
  conn
    .query_row(
      &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.appointment_id = ?1"),
      params![id],
      RawAppointment::from_row,
    )
    .optional()
}

/// The caller's appointment booked under `request_key`.
fn fetch_booking(
  conn: &Connection,
  user_id: &str,
  request_key: &str,
) -> rusqlite::Result<Option<RawAppointment>> {
  conn
    .query_row(
      &format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
         WHERE a.user_id = ?1 AND a.request_key = ?2"
      ),
      params![user_id, request_key],
      RawAppointment::from_row,
    )
    .optional()
}

/// `true` if `sql` (a `SELECT 1 ...`) returns a row.
fn exists(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, args, |_| Ok(())).optional()?.is_some())
}

// ─── Multi-step outcomes ─────────────────────────────────────────────────────

enum BookOutcome {
  Created,
  Replayed(RawAppointment),
  PetNotFound,
  SlotTaken,
}

enum StatusOutcome {
  NotFound,
  Illegal(AppointmentStatus),
  Corrupt(String),
  Updated(RawAppointment),
}

enum ReviewOutcome {
  AppointmentNotFound,
  NotCompleted,
  AlreadyReviewed,
  Created { establishment_id: String },
}

// ─── BookingStore impl ───────────────────────────────────────────────────────

impl BookingStore for SqliteStore {
  type Error = Error;

  // ── Accounts & sessions ───────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<(Account, Profile)> {
    let now = Utc::now();
    let account = Account {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      password_hash: input.password_hash,
      created_at:    now,
    };
    let profile = Profile {
      profile_id: Uuid::new_v4(),
      user_id:    account.user_id,
      name:       input.profile.name,
      phone:      None,
      tax_id:     input.profile.tax_id,
      birth_date: None,
      photo_url:  None,
      address:    None,
      created_at: now,
      updated_at: now,
    };

    let user_id_str    = encode_uuid(account.user_id);
    let profile_id_str = encode_uuid(profile.profile_id);
    let email          = account.email.clone();
    let password_hash  = account.password_hash.clone();
    let name           = profile.name.clone();
    let tax_id         = profile.tax_id.clone();
    let at_str         = encode_dt(now);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if exists(&tx, "SELECT 1 FROM accounts WHERE email = ?1", params![email])? {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO accounts (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![user_id_str, email, password_hash, at_str],
        )?;
        tx.execute(
          "INSERT INTO profiles (profile_id, user_id, name, tax_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![profile_id_str, user_id_str, name, tax_id, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(account.email));
    }
    tracing::info!(user_id = %account.user_id, "account created");
    Ok((account, profile))
  }

  async fn find_account(&self, email: &str) -> Result<Option<Account>> {
    let email = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, created_at
               FROM accounts WHERE email = ?1",
              params![email],
              |row| {
                Ok(RawAccount {
                  user_id:       row.get(0)?,
                  email:         row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    let digest      = session.token_digest;
    let user_id_str = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);
    let now_str     = encode_dt(Utc::now());

    let purged = self
      .conn
      .call(move |conn| {
        let purged =
          conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now_str])?;
        conn.execute(
          "INSERT INTO sessions (token_digest, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![digest, user_id_str, created_str, expires_str],
        )?;
        Ok(purged)
      })
      .await?;

    if purged > 0 {
      tracing::debug!(purged, "expired sessions removed");
    }
    Ok(())
  }

  async fn get_session(&self, token_digest: &str) -> Result<Option<Session>> {
    let digest = token_digest.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token_digest, user_id, created_at, expires_at
               FROM sessions WHERE token_digest = ?1",
              params![digest],
              |row| {
                Ok(RawSession {
                  token_digest: row.get(0)?,
                  user_id:      row.get(1)?,
                  created_at:   row.get(2)?,
                  expires_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_digest: &str) -> Result<bool> {
    let digest = token_digest.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE token_digest = ?1", params![digest])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_profile(conn, &id_str)?))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn update_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> Result<Option<Profile>> {
    let id_str       = encode_uuid(user_id);
    let birth_date   = patch.birth_date.map(encode_date);
    let address_json = encode_address(patch.address.as_ref())?;
    let now_str      = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE profiles SET
             name         = COALESCE(?2, name),
             phone        = COALESCE(?3, phone),
             tax_id       = COALESCE(?4, tax_id),
             birth_date   = COALESCE(?5, birth_date),
             photo_url    = COALESCE(?6, photo_url),
             address_json = COALESCE(?7, address_json),
             updated_at   = ?8
           WHERE user_id = ?1",
          params![
            id_str,
            patch.name,
            patch.phone,
            patch.tax_id,
            birth_date,
            patch.photo_url,
            address_json,
            now_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(fetch_profile(conn, &id_str)?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  // ── Pets ──────────────────────────────────────────────────────────────────

  async fn add_pet(&self, owner_id: Uuid, input: NewPet) -> Result<Pet> {
    let now = Utc::now();
    let pet = Pet {
      pet_id:     Uuid::new_v4(),
      owner_id,
      name:       input.name,
      species:    input.species,
      breed:      input.breed,
      age:        input.age,
      weight_kg:  input.weight_kg,
      sex:        input.sex,
      color:      input.color,
      notes:      input.notes,
      photo_url:  input.photo_url,
      vaccinated: input.vaccinated,
      created_at: now,
      updated_at: now,
    };

    let pet_id_str   = encode_uuid(pet.pet_id);
    let owner_id_str = encode_uuid(owner_id);
    let name         = pet.name.clone();
    let species      = pet.species.clone();
    let breed        = pet.breed.clone();
    let age          = pet.age.map(i64::from);
    let weight_kg    = pet.weight_kg;
    let sex          = pet.sex.map(|s| s.as_ref().to_owned());
    let color        = pet.color.clone();
    let notes        = pet.notes.clone();
    let photo_url    = pet.photo_url.clone();
    let vaccinated   = pet.vaccinated;
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pets (
             pet_id, owner_id, name, species, breed, age, weight_kg, sex,
             color, notes, photo_url, vaccinated, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
          params![
            pet_id_str,
            owner_id_str,
            name,
            species,
            breed,
            age,
            weight_kg,
            sex,
            color,
            notes,
            photo_url,
            vaccinated,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(pet_id = %pet.pet_id, %owner_id, "pet registered");
    Ok(pet)
  }

  async fn list_pets(&self, owner_id: Uuid) -> Result<Vec<Pet>> {
    let owner_id_str = encode_uuid(owner_id);

    let raws: Vec<RawPet> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PET_COLUMNS} FROM pets p
           WHERE p.owner_id = ?1
           ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(params![owner_id_str], RawPet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPet::into_pet).collect()
  }

  async fn get_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<Option<Pet>> {
    let owner_id_str = encode_uuid(owner_id);
    let pet_id_str   = encode_uuid(pet_id);
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_pet(conn, &owner_id_str, &pet_id_str)?))
      .await?;
    raw.map(RawPet::into_pet).transpose()
  }

  async fn update_pet(
    &self,
    owner_id: Uuid,
    pet_id: Uuid,
    patch: PetPatch,
  ) -> Result<Option<Pet>> {
    let owner_id_str = encode_uuid(owner_id);
    let pet_id_str   = encode_uuid(pet_id);
    let age          = patch.age.map(i64::from);
    let sex          = patch.sex.map(|s| s.as_ref().to_owned());
    let now_str      = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE pets SET
             name       = COALESCE(?3, name),
             species    = COALESCE(?4, species),
             breed      = COALESCE(?5, breed),
             age        = COALESCE(?6, age),
             weight_kg  = COALESCE(?7, weight_kg),
             sex        = COALESCE(?8, sex),
             color      = COALESCE(?9, color),
             notes      = COALESCE(?10, notes),
             photo_url  = COALESCE(?11, photo_url),
             vaccinated = COALESCE(?12, vaccinated),
             updated_at = ?13
           WHERE pet_id = ?1 AND owner_id = ?2",
          params![
            pet_id_str,
            owner_id_str,
            patch.name,
            patch.species,
            patch.breed,
            age,
            patch.weight_kg,
            sex,
            patch.color,
            patch.notes,
            patch.photo_url,
            patch.vaccinated,
            now_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(fetch_pet(conn, &owner_id_str, &pet_id_str)?)
      })
      .await?;

    raw.map(RawPet::into_pet).transpose()
  }

  async fn delete_pet(&self, owner_id: Uuid, pet_id: Uuid) -> Result<bool> {
    let owner_id_str = encode_uuid(owner_id);
    let pet_id_str   = encode_uuid(pet_id);

    // `None` means the delete hit a foreign-key constraint.
    let deleted: Option<bool> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "DELETE FROM pets WHERE pet_id = ?1 AND owner_id = ?2",
          params![pet_id_str, owner_id_str],
        ) {
          Ok(n) => Ok(Some(n > 0)),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(None)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    deleted.ok_or(Error::PetInUse(pet_id))
  }

  // ── Catalogue ─────────────────────────────────────────────────────────────

  async fn put_establishment(&self, input: NewEstablishment) -> Result<Establishment> {
    let id            = input.establishment_id.unwrap_or_else(Uuid::new_v4);
    let id_str        = encode_uuid(id);
    let address_json  = encode_address(input.address.as_ref())?;
    let hours_json    = input
      .opening_hours
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let photos_json   = encode_strings(&input.photos)?;
    let status_str    = input.status.as_ref().to_owned();
    let now_str       = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO establishments (
             establishment_id, name, description, tax_id, phone, email,
             address_json, opening_hours_json, photos_json, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
           ON CONFLICT(establishment_id) DO UPDATE SET
             name               = excluded.name,
             description        = excluded.description,
             tax_id             = excluded.tax_id,
             phone              = excluded.phone,
             email              = excluded.email,
             address_json       = excluded.address_json,
             opening_hours_json = excluded.opening_hours_json,
             photos_json        = excluded.photos_json,
             status             = excluded.status,
             updated_at         = excluded.updated_at",
          params![
            id_str,
            input.name,
            input.description,
            input.tax_id,
            input.phone,
            input.email,
            address_json,
            hours_json,
            photos_json,
            status_str,
            now_str,
          ],
        )?;
        Ok(fetch_establishment(conn, &id_str)?)
      })
      .await?;

    raw
      .ok_or(Error::EstablishmentNotFound(id))?
      .into_establishment()
  }

  async fn get_establishment(&self, id: Uuid) -> Result<Option<Establishment>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_establishment(conn, &id_str)?))
      .await?;
    raw.map(RawEstablishment::into_establishment).transpose()
  }

  async fn search_establishments(
    &self,
    query: &EstablishmentQuery,
  ) -> Result<Vec<Establishment>> {
    let include_inactive = query.include_inactive;

    let raws: Vec<RawEstablishment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ESTABLISHMENT_COLUMNS} FROM establishments e
           WHERE ?1 OR e.status = 'active'
           ORDER BY e.name COLLATE NOCASE, e.establishment_id"
        ))?;
        let rows = stmt
          .query_map(params![include_inactive], RawEstablishment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Name matching happens here rather than in SQL: LIKE folds ASCII only
    // and treats `%` and `_` in the query as wildcards.
    let mut found = Vec::new();
    for raw in raws {
      let establishment = raw.into_establishment()?;
      if query.matches(&establishment) {
        found.push(establishment);
      }
    }
    Ok(found)
  }

  async fn put_service(&self, input: NewService) -> Result<Service> {
    input.validate()?;

    let id                   = input.service_id.unwrap_or_else(Uuid::new_v4);
    let id_str               = encode_uuid(id);
    let establishment_id     = input.establishment_id;
    let establishment_id_str = encode_uuid(establishment_id);
    let species_json         = encode_strings(&input.species)?;
    let status_str           = input.status.as_ref().to_owned();
    let duration             = i64::from(input.duration_minutes);
    let now_str              = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !exists(
          &tx,
          "SELECT 1 FROM establishments WHERE establishment_id = ?1",
          params![establishment_id_str],
        )? {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO services (
             service_id, establishment_id, name, description, price,
             duration_minutes, category, species_json, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
           ON CONFLICT(service_id) DO UPDATE SET
             establishment_id = excluded.establishment_id,
             name             = excluded.name,
             description      = excluded.description,
             price            = excluded.price,
             duration_minutes = excluded.duration_minutes,
             category         = excluded.category,
             species_json     = excluded.species_json,
             status           = excluded.status,
             updated_at       = excluded.updated_at",
          params![
            id_str,
            establishment_id_str,
            input.name,
            input.description,
            input.price,
            duration,
            input.category,
            species_json,
            status_str,
            now_str,
          ],
        )?;
        let raw = fetch_service(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(Error::EstablishmentNotFound(establishment_id))?
      .into_service()
  }

  async fn get_service(&self, id: Uuid) -> Result<Option<Service>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_service(conn, &id_str)?))
      .await?;
    raw.map(RawService::into_service).transpose()
  }

  async fn search_services(&self, query: &ServiceQuery) -> Result<Vec<ServiceListing>> {
    let include_inactive = query.include_inactive;
    let establishment_id = query.establishment_id.map(encode_uuid);
    let category         = query.category.clone();

    let raws: Vec<RawServiceListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SERVICE_COLUMNS}, {ESTABLISHMENT_SUMMARY_COLUMNS}
           FROM services s
           JOIN establishments e ON e.establishment_id = s.establishment_id
           WHERE (?1 OR (s.status = 'active' AND e.status = 'active'))
             AND (?2 IS NULL OR s.establishment_id = ?2)
             AND (?3 IS NULL OR s.category = ?3)
           ORDER BY s.category, s.name COLLATE NOCASE, s.service_id"
        ))?;
        let rows = stmt
          .query_map(
            params![include_inactive, establishment_id, category],
            RawServiceListing::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut found = Vec::new();
    for raw in raws {
      let listing = raw.into_listing()?;
      if query.matches(&listing.service) {
        found.push(listing);
      }
    }
    Ok(found)
  }

  // ── Appointments ──────────────────────────────────────────────────────────

  async fn book(&self, input: NewAppointment) -> Result<Booking> {
    let now = Utc::now();
    let appointment = Appointment {
      appointment_id:   Uuid::new_v4(),
      user_id:          input.user_id,
      pet_id:           input.pet_id,
      service_id:       input.service_id,
      establishment_id: input.establishment_id,
      date:             input.date,
      start:            input.window.start,
      end:              input.window.end,
      price:            input.price,
      notes:            input.notes,
      status:           AppointmentStatus::Scheduled,
      request_key:      input.request_key,
      created_at:       now,
      updated_at:       now,
    };

    let appointment_id_str   = encode_uuid(appointment.appointment_id);
    let user_id_str          = encode_uuid(appointment.user_id);
    let pet_id_str           = encode_uuid(appointment.pet_id);
    let service_id_str       = encode_uuid(appointment.service_id);
    let establishment_id_str = encode_uuid(appointment.establishment_id);
    let date_str             = encode_date(appointment.date);
    let start_str            = appointment.start.to_string();
    let end_str              = appointment.end.to_string();
    let price                = appointment.price;
    let notes                = appointment.notes.clone();
    let status_str           = appointment.status.as_ref().to_owned();
    let request_key_str      = encode_uuid(appointment.request_key);
    let at_str               = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(raw) = fetch_booking(&tx, &user_id_str, &request_key_str)? {
          return Ok(BookOutcome::Replayed(raw));
        }

        if !exists(
          &tx,
          "SELECT 1 FROM pets WHERE pet_id = ?1 AND owner_id = ?2",
          params![pet_id_str, user_id_str],
        )? {
          return Ok(BookOutcome::PetNotFound);
        }

        if exists(
          &tx,
          "SELECT 1 FROM appointments
           WHERE establishment_id = ?1 AND date = ?2 AND start_time = ?3
             AND status = 'scheduled'",
          params![establishment_id_str, date_str, start_str],
        )? {
          return Ok(BookOutcome::SlotTaken);
        }

        tx.execute(
          "INSERT INTO appointments (
             appointment_id, user_id, pet_id, service_id, establishment_id,
             date, start_time, end_time, price, notes, status, request_key,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
          params![
            appointment_id_str,
            user_id_str,
            pet_id_str,
            service_id_str,
            establishment_id_str,
            date_str,
            start_str,
            end_str,
            price,
            notes,
            status_str,
            request_key_str,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(BookOutcome::Created)
      })
      .await?;

    match outcome {
      BookOutcome::Created => {
        tracing::info!(
          appointment_id = %appointment.appointment_id,
          establishment_id = %appointment.establishment_id,
          date = %appointment.date,
          start = %appointment.start,
          "appointment booked"
        );
        Ok(Booking { appointment, replayed: false })
      }
      BookOutcome::Replayed(raw) => {
        let appointment = raw.into_appointment()?;
        tracing::info!(
          appointment_id = %appointment.appointment_id,
          request_key = %appointment.request_key,
          "booking request replayed"
        );
        Ok(Booking { appointment, replayed: true })
      }
      BookOutcome::PetNotFound => Err(Error::PetNotFound(appointment.pet_id)),
      BookOutcome::SlotTaken => Err(Error::SlotTaken {
        establishment_id: appointment.establishment_id,
        date:             appointment.date,
        start:            appointment.start,
      }),
    }
  }

  async fn find_booking(
    &self,
    user_id: Uuid,
    request_key: Uuid,
  ) -> Result<Option<Appointment>> {
    let user_id_str     = encode_uuid(user_id);
    let request_key_str = encode_uuid(request_key);

    let raw = self
      .conn
      .call(move |conn| Ok(fetch_booking(conn, &user_id_str, &request_key_str)?))
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn get_appointment(
    &self,
    user_id: Uuid,
    appointment_id: Uuid,
  ) -> Result<Option<AppointmentDetail>> {
    let user_id_str        = encode_uuid(user_id);
    let appointment_id_str = encode_uuid(appointment_id);

    let raw: Option<RawAppointmentDetail> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPOINTMENT_COLUMNS}, {APPOINTMENT_DETAIL_EXTRA_COLUMNS}
                 FROM appointments a {APPOINTMENT_DETAIL_JOINS}
                 WHERE a.appointment_id = ?1 AND a.user_id = ?2"
              ),
              params![appointment_id_str, user_id_str],
              RawAppointmentDetail::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppointmentDetail::into_detail).transpose()
  }

  async fn list_appointments(&self, user_id: Uuid) -> Result<Vec<AppointmentDetail>> {
    let user_id_str = encode_uuid(user_id);

    let raws: Vec<RawAppointmentDetail> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPOINTMENT_COLUMNS}, {APPOINTMENT_DETAIL_EXTRA_COLUMNS}
           FROM appointments a {APPOINTMENT_DETAIL_JOINS}
           WHERE a.user_id = ?1
           ORDER BY a.date DESC, a.start_time DESC, a.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(params![user_id_str], RawAppointmentDetail::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAppointmentDetail::into_detail).collect()
  }

  async fn set_appointment_status(
    &self,
    user_id: Option<Uuid>,
    appointment_id: Uuid,
    status: AppointmentStatus,
  ) -> Result<Appointment> {
    let user_id_str        = user_id.map(encode_uuid);
    let appointment_id_str = encode_uuid(appointment_id);
    let status_str         = status.as_ref().to_owned();
    let now_str            = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<(String, String)> = tx
          .query_row(
            "SELECT user_id, status FROM appointments WHERE appointment_id = ?1",
            params![appointment_id_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((owner, current)) = current else {
          return Ok(StatusOutcome::NotFound);
        };
        if user_id_str.as_ref().is_some_and(|u| *u != owner) {
          return Ok(StatusOutcome::NotFound);
        }
        let Ok(current) = current.parse::<AppointmentStatus>() else {
          return Ok(StatusOutcome::Corrupt(current));
        };
        if !current.can_become(status) {
          return Ok(StatusOutcome::Illegal(current));
        }

        tx.execute(
          "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE appointment_id = ?1",
          params![appointment_id_str, status_str, now_str],
        )?;
        let raw = fetch_appointment(&tx, &appointment_id_str)?;
        tx.commit()?;
        Ok(match raw {
          Some(raw) => StatusOutcome::Updated(raw),
          None => StatusOutcome::NotFound,
        })
      })
      .await?;

    match outcome {
      StatusOutcome::Updated(raw) => {
        tracing::info!(%appointment_id, %status, "appointment status changed");
        raw.into_appointment()
      }
      StatusOutcome::NotFound => Err(Error::AppointmentNotFound(appointment_id)),
      StatusOutcome::Illegal(from) => Err(Error::IllegalStatusChange { from, to: status }),
      StatusOutcome::Corrupt(s) => {
        Err(Error::Decode(format!("unknown appointment status: {s:?}")))
      }
    }
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn add_review(&self, user_id: Uuid, input: NewReview) -> Result<Review> {
    let now                = Utc::now();
    let review_id          = Uuid::new_v4();
    let review_id_str      = encode_uuid(review_id);
    let user_id_str        = encode_uuid(user_id);
    let appointment_id     = input.appointment_id;
    let appointment_id_str = encode_uuid(appointment_id);
    let stars              = i64::from(input.rating.stars());
    let comment            = input.comment.clone();
    let at_str             = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(String, String, String)> = tx
          .query_row(
            "SELECT user_id, establishment_id, status FROM appointments
             WHERE appointment_id = ?1",
            params![appointment_id_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;
        let Some((owner, establishment_id, status)) = row else {
          return Ok(ReviewOutcome::AppointmentNotFound);
        };
        if owner != user_id_str {
          return Ok(ReviewOutcome::AppointmentNotFound);
        }
        if status != AppointmentStatus::Completed.as_ref() {
          return Ok(ReviewOutcome::NotCompleted);
        }
        if exists(
          &tx,
          "SELECT 1 FROM reviews WHERE appointment_id = ?1",
          params![appointment_id_str],
        )? {
          return Ok(ReviewOutcome::AlreadyReviewed);
        }

        tx.execute(
          "INSERT INTO reviews (
             review_id, user_id, appointment_id, establishment_id,
             rating, comment, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            review_id_str,
            user_id_str,
            appointment_id_str,
            establishment_id,
            stars,
            comment,
            at_str,
          ],
        )?;
        // Right-hand sides see the pre-update row.
        tx.execute(
          "UPDATE establishments SET
             rating_average = (COALESCE(rating_average, 0.0) * rating_count + ?2)
                              / (rating_count + 1.0),
             rating_count   = rating_count + 1,
             updated_at     = ?3
           WHERE establishment_id = ?1",
          params![establishment_id, stars, at_str],
        )?;
        tx.commit()?;
        Ok(ReviewOutcome::Created { establishment_id })
      })
      .await?;

    match outcome {
      ReviewOutcome::Created { establishment_id } => {
        let review = Review {
          review_id,
          user_id,
          appointment_id,
          establishment_id: decode_uuid(&establishment_id)?,
          rating: input.rating,
          comment: input.comment,
          created_at: now,
        };
        tracing::info!(
          review_id = %review.review_id,
          establishment_id = %review.establishment_id,
          rating = review.rating.stars(),
          "review recorded"
        );
        Ok(review)
      }
      ReviewOutcome::AppointmentNotFound => Err(Error::AppointmentNotFound(appointment_id)),
      ReviewOutcome::NotCompleted => Err(Error::NotCompleted(appointment_id)),
      ReviewOutcome::AlreadyReviewed => Err(Error::AlreadyReviewed(appointment_id)),
    }
  }

  async fn list_reviews(&self, establishment_id: Uuid) -> Result<Vec<Review>> {
    let establishment_id_str = encode_uuid(establishment_id);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews r
           WHERE r.establishment_id = ?1
           ORDER BY r.created_at DESC, r.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(params![establishment_id_str], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }
}
