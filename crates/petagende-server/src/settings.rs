//! Server configuration: an optional TOML file layered under `PETAGENDE_*`
//! environment variables.
//!
//! Nested keys use a double underscore, e.g.
//! `PETAGENDE_CALENDAR__FIRST_OPEN_DAY=10`. `PETAGENDE_CALENDAR__TIMES` takes
//! a space-separated list.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, ensure};
use petagende_core::calendar::BookingCalendar;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: i64,
  #[serde(default)]
  pub calendar:          BookingCalendar,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("petagende.db") }

fn default_session_ttl_hours() -> i64 { 24 * 7 }

impl ServerConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("PETAGENDE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(" ")
          .with_list_parse_key("calendar.times"),
      )
      .build()
      .context("failed to read configuration")?;

    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    ensure!(self.session_ttl_hours > 0, "session_ttl_hours must be positive");
    ensure!(
      self.calendar.days_in_month().is_some(),
      "calendar month {}-{} does not exist",
      self.calendar.year,
      self.calendar.month
    );
    ensure!(!self.calendar.open_days().is_empty(), "calendar has no open days");
    ensure!(!self.calendar.times.is_empty(), "calendar offers no start times");
    Ok(())
  }

  pub fn session_ttl(&self) -> chrono::Duration { chrono::Duration::hours(self.session_ttl_hours) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~` expanded to the user's home.
  pub fn resolved_store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}
