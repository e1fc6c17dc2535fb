//! SQL schema for the PetAgende SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- lower-cased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a session token is ever stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES accounts(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id   TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL UNIQUE REFERENCES accounts(user_id),
    name         TEXT NOT NULL,
    phone        TEXT,
    tax_id       TEXT,
    birth_date   TEXT,                    -- YYYY-MM-DD
    photo_url    TEXT,
    address_json TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pets (
    pet_id     TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES accounts(user_id),
    name       TEXT NOT NULL,
    species    TEXT NOT NULL,
    breed      TEXT,
    age        INTEGER,
    weight_kg  REAL,
    sex        TEXT,                      -- 'male' | 'female'
    color      TEXT,
    notes      TEXT,
    photo_url  TEXT,
    vaccinated INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS establishments (
    establishment_id   TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    description        TEXT,
    tax_id             TEXT,
    phone              TEXT,
    email              TEXT,
    address_json       TEXT,
    opening_hours_json TEXT,
    photos_json        TEXT NOT NULL DEFAULT '[]',
    rating_average     REAL,
    rating_count       INTEGER NOT NULL DEFAULT 0,
    status             TEXT NOT NULL DEFAULT 'active',
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
    service_id       TEXT PRIMARY KEY,
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    name             TEXT NOT NULL,
    description      TEXT,
    price            REAL NOT NULL,
    duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
    category         TEXT NOT NULL,
    species_json     TEXT NOT NULL DEFAULT '[]',
    status           TEXT NOT NULL DEFAULT 'active',
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id   TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES accounts(user_id),
    pet_id           TEXT NOT NULL REFERENCES pets(pet_id),
    service_id       TEXT NOT NULL REFERENCES services(service_id),
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    date             TEXT NOT NULL,       -- YYYY-MM-DD
    start_time       TEXT NOT NULL,       -- HH:MM
    end_time         TEXT NOT NULL,       -- HH:MM, may exceed 23:59
    price            REAL NOT NULL,
    notes            TEXT,
    status           TEXT NOT NULL DEFAULT 'scheduled',
    request_key      TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (user_id, request_key)
);

-- One scheduled appointment per establishment slot. Cancelling frees it.
CREATE UNIQUE INDEX IF NOT EXISTS appointments_slot_idx
    ON appointments(establishment_id, date, start_time)
    WHERE status = 'scheduled';

CREATE TABLE IF NOT EXISTS reviews (
    review_id        TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES accounts(user_id),
    appointment_id   TEXT NOT NULL UNIQUE REFERENCES appointments(appointment_id),
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    rating           INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment          TEXT,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS pets_owner_idx              ON pets(owner_id);
CREATE INDEX IF NOT EXISTS services_establishment_idx  ON services(establishment_id);
CREATE INDEX IF NOT EXISTS appointments_user_idx       ON appointments(user_id);
CREATE INDEX IF NOT EXISTS reviews_establishment_idx   ON reviews(establishment_id);

PRAGMA user_version = 1;
";
