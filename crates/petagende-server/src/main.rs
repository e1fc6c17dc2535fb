//! petagende-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `PETAGENDE_*`
//! environment variables, opens the SQLite store and then either serves the
//! JSON API or runs an operator command against the store.

mod seed;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use petagende_api::{ApiState, api_router};
use petagende_core::{appointment::AppointmentStatus, store::BookingStore};
use petagende_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "PetAgende booking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,
  /// Import establishments and their services from a JSON catalogue.
  Seed {
    catalogue: PathBuf,
  },
  /// Move an appointment to a new status, e.g. mark it completed.
  SetStatus {
    appointment_id: Uuid,
    status:         AppointmentStatus,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::Seed { catalogue } => {
      let json = std::fs::read_to_string(&catalogue)
        .with_context(|| format!("failed to read {catalogue:?}"))?;
      let report = seed::import(&store, seed::parse(&json)?).await?;
      println!(
        "imported {} establishments and {} services",
        report.establishments, report.services
      );
      Ok(())
    }
    Command::SetStatus { appointment_id, status } => {
      let appointment = store
        .set_appointment_status(None, appointment_id, status)
        .await
        .with_context(|| format!("failed to set appointment {appointment_id} to {status}"))?;
      println!(
        "{} {} {} {}",
        appointment.appointment_id, appointment.date, appointment.start, appointment.status
      );
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let state = ApiState::new(Arc::new(store), cfg.calendar.clone(), cfg.session_ttl());

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!(
    year = cfg.calendar.year,
    month = cfg.calendar.month,
    first_open_day = cfg.calendar.first_open_day,
    "booking calendar loaded"
  );
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      tracing::info!("shutting down");
    })
    .await
    .context("server error")?;

  Ok(())
}
