//! `petagende`: command-line client for the PetAgende booking API.
//!
//! # Usage
//!
//! ```text
//! petagende --url http://localhost:8080 signup --email ana@example.com --name "Ana Souza"
//! petagende --config ~/.config/petagende.toml signin --email ana@example.com
//! petagende establishments feliz
//! petagende book --pet <id> --service <id> --day 12 --time 14:30
//! ```

mod client;
mod output;
mod prompt;
mod wizard;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ServiceFilter};
use petagende_core::{
  account::Credentials,
  appointment::AppointmentStatus,
  flow::{Action, Screen, Tab},
  pet::{NewPet, PetPatch, PetSex},
  profile::{Address, ProfilePatch},
  review::{NewReview, Rating},
  validate::{SignUpForm, normalize_email, normalize_tax_id},
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "petagende", about = "Book pet care from the terminal")]
struct Args {
  /// Path to a TOML config file (url, token). `signin` stores its token here.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the PetAgende server (default: http://localhost:8080).
  #[arg(long, env = "PETAGENDE_URL", global = true)]
  url: Option<String>,

  /// Session token from `signin`.
  #[arg(long, env = "PETAGENDE_TOKEN", global = true, hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account. Prompts for the password.
  Signup {
    #[arg(long)]
    email:  String,
    #[arg(long)]
    name:   String,
    /// CPF, with or without punctuation.
    #[arg(long)]
    tax_id: Option<String>,
  },
  /// Sign in. Prompts for the password.
  Signin {
    #[arg(long)]
    email: String,
  },
  Signout,
  /// Show who the current token belongs to.
  Whoami,
  Profile {
    #[command(subcommand)]
    command: ProfileCommand,
  },
  Pets {
    #[command(subcommand)]
    command: PetsCommand,
  },
  /// List establishments, optionally filtered by a name fragment.
  Establishments {
    query: Option<String>,
  },
  /// Search services of active establishments.
  Services {
    #[arg(long)]
    query:         Option<String>,
    #[arg(long)]
    category:      Option<String>,
    #[arg(long)]
    species:       Option<String>,
    #[arg(long)]
    establishment: Option<Uuid>,
  },
  /// Show the bookable days and start times.
  Calendar,
  /// Book an appointment. Missing choices are prompted for.
  Book {
    #[arg(long)]
    pet:         Option<Uuid>,
    #[arg(long)]
    service:     Option<Uuid>,
    /// Day of the bookable month.
    #[arg(long)]
    day:         Option<u32>,
    /// Start time, HH:MM, from the calendar's list.
    #[arg(long)]
    time:        Option<String>,
    #[arg(long)]
    notes:       Option<String>,
    /// Reuse a key to make a retried booking return the original.
    #[arg(long)]
    request_key: Option<Uuid>,
  },
  /// List your appointments, newest first.
  Appointments,
  /// Cancel a scheduled appointment.
  Cancel {
    id: Uuid,
  },
  /// Review a completed appointment.
  Review {
    appointment_id: Uuid,
    /// 1 to 5 stars.
    #[arg(long)]
    rating:         u8,
    #[arg(long)]
    comment:        Option<String>,
  },
  /// List an establishment's reviews.
  Reviews {
    establishment_id: Uuid,
  },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
  Show,
  /// Change the given fields; the rest stay as they are.
  Edit {
    #[arg(long)]
    name:        Option<String>,
    #[arg(long)]
    phone:       Option<String>,
    #[arg(long)]
    tax_id:      Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date:  Option<NaiveDate>,
    #[arg(long)]
    photo_url:   Option<String>,
    #[command(flatten)]
    address:     AddressArgs,
  },
}

#[derive(clap::Args, Debug)]
struct AddressArgs {
  #[arg(long)]
  street:      Option<String>,
  #[arg(long)]
  number:      Option<String>,
  #[arg(long)]
  district:    Option<String>,
  #[arg(long)]
  city:        Option<String>,
  #[arg(long)]
  state:       Option<String>,
  #[arg(long)]
  postal_code: Option<String>,
}

impl AddressArgs {
  fn into_address(self) -> Option<Address> {
    let address = Address {
      street:      self.street,
      number:      self.number,
      district:    self.district,
      city:        self.city,
      state:       self.state,
      postal_code: self.postal_code,
    };
    (address != Address::default()).then_some(address)
  }
}

#[derive(clap::Args, Debug)]
struct PetFields {
  #[arg(long)]
  breed:      Option<String>,
  #[arg(long)]
  age:        Option<u32>,
  #[arg(long)]
  weight:     Option<f64>,
  /// male or female
  #[arg(long)]
  sex:        Option<PetSex>,
  #[arg(long)]
  color:      Option<String>,
  #[arg(long)]
  notes:      Option<String>,
  #[arg(long)]
  photo_url:  Option<String>,
}

#[derive(Subcommand, Debug)]
enum PetsCommand {
  List,
  Add {
    name:       String,
    species:    String,
    #[command(flatten)]
    fields:     PetFields,
    #[arg(long)]
    vaccinated: bool,
  },
  Edit {
    id:         Uuid,
    #[arg(long)]
    name:       Option<String>,
    #[arg(long)]
    species:    Option<String>,
    #[command(flatten)]
    fields:     PetFields,
    #[arg(long)]
    vaccinated: Option<bool>,
  },
  Remove {
    id: Uuid,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Serialize, Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  token: Option<String>,
}

impl ConfigFile {
  fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    if !path.exists() {
      return Ok(Self::default());
    }
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }

  fn save(&self, path: &Path) -> Result<()> {
    let raw = toml::to_string(self).context("serialising config file")?;
    std::fs::write(path, raw).with_context(|| format!("writing config file {}", path.display()))
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let mut file_cfg = ConfigFile::load(args.config.as_deref())?;

  // Flags and environment override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args.token.or_else(|| file_cfg.token.clone()),
  };
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Signup { email, name, tax_id } => {
      let password = prompt::ask("Password")?;
      let password_confirmation = prompt::ask("Confirm password")?;
      let form = SignUpForm { email, password, password_confirmation, name, tax_id };
      // Reject locally before anything is sent.
      form.clone().validate()?;
      let profile = client.sign_up(&form).await?;
      println!("account created for {}; sign in with `petagende signin`", profile.name);
    }
    Command::Signin { email } => {
      let email = normalize_email(&email)?;
      let password = prompt::ask("Password")?;
      let grant = client.sign_in(&Credentials { email, password }).await?;
      println!("signed in as {} until {}", grant.profile.name, grant.expires_at);
      match args.config.as_deref() {
        Some(path) => {
          file_cfg.token = Some(grant.token);
          file_cfg.save(path)?;
          println!("token saved to {}", path.display());
        }
        None => println!("export PETAGENDE_TOKEN={}", grant.token),
      }
    }
    Command::Signout => {
      client.sign_out().await?;
      if let Some(path) = args.config.as_deref()
        && file_cfg.token.take().is_some()
      {
        file_cfg.save(path)?;
      }
      println!("signed out");
    }
    Command::Whoami => println!("{}", output::profile(&client.session().await?)),
    Command::Profile { command } => profile(&client, command).await?,
    Command::Pets { command } => pets(&client, command).await?,
    Command::Establishments { query } => {
      for e in client.establishments(query.as_deref()).await? {
        println!("{}", output::establishment(&e));
      }
    }
    Command::Services { query, category, species, establishment } => {
      let filter = ServiceFilter { q: query, category, species, establishment_id: establishment };
      for listing in client.services(&filter).await? {
        println!("{}", output::service(&listing));
      }
    }
    Command::Calendar => println!("{}", output::calendar(&client.calendar().await?)),
    Command::Book { pet, service, day, time, notes, request_key } => {
      let presets = wizard::Presets { pet, service, day, time, notes, request_key };
      wizard::run(&client, presets).await?;
    }
    Command::Appointments => {
      for detail in client.appointments().await? {
        println!("{}", output::appointment_detail(&detail));
      }
    }
    Command::Cancel { id } => println!("{}", output::appointment(&client.cancel(id).await?)),
    Command::Review { appointment_id, rating, comment } => {
      review(&client, appointment_id, rating, comment).await?;
    }
    Command::Reviews { establishment_id } => {
      for r in client.reviews(establishment_id).await? {
        println!("{}", output::review(&r));
      }
    }
  }

  Ok(())
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

async fn profile(client: &ApiClient, command: ProfileCommand) -> Result<()> {
  let profile = match command {
    ProfileCommand::Show => client.profile().await?,
    ProfileCommand::Edit { name, phone, tax_id, birth_date, photo_url, address } => {
      let patch = ProfilePatch {
        name,
        phone,
        tax_id: tax_id.as_deref().map(normalize_tax_id).transpose()?,
        birth_date,
        photo_url,
        address: address.into_address(),
      };
      patch.validate()?;
      client.update_profile(&patch).await?
    }
  };
  println!("{}", output::profile(&profile));
  Ok(())
}

async fn pets(client: &ApiClient, command: PetsCommand) -> Result<()> {
  match command {
    PetsCommand::List => {
      for p in client.list_pets().await? {
        println!("{}", output::pet(&p));
      }
    }
    PetsCommand::Add { name, species, fields, vaccinated } => {
      let pet = NewPet {
        breed: fields.breed,
        age: fields.age,
        weight_kg: fields.weight,
        sex: fields.sex,
        color: fields.color,
        notes: fields.notes,
        photo_url: fields.photo_url,
        vaccinated,
        ..NewPet::new(name, species)
      };
      pet.validate()?;
      println!("{}", output::pet(&client.add_pet(&pet).await?));
    }
    PetsCommand::Edit { id, name, species, fields, vaccinated } => {
      let patch = PetPatch {
        name,
        species,
        breed: fields.breed,
        age: fields.age,
        weight_kg: fields.weight,
        sex: fields.sex,
        color: fields.color,
        notes: fields.notes,
        photo_url: fields.photo_url,
        vaccinated,
      };
      patch.validate()?;
      println!("{}", output::pet(&client.update_pet(id, &patch).await?));
    }
    PetsCommand::Remove { id } => {
      client.remove_pet(id).await?;
      println!("removed {id}");
    }
  }
  Ok(())
}

/// Walks the flow from the appointment list to the review screen.
async fn review(
  client: &ApiClient,
  appointment_id: Uuid,
  rating: u8,
  comment: Option<String>,
) -> Result<()> {
  let rating = Rating::new(rating)?;
  let detail = client.appointment(appointment_id).await?;
  let status = detail.appointment.status;
  if status != AppointmentStatus::Completed {
    bail!("appointment {appointment_id} is {status}; only completed appointments can be reviewed");
  }

  let screen = Screen::Home
    .apply(Action::Navigate(Tab::Appointments))?
    .apply(Action::ReviewRequested {
      appointment_id,
      establishment_id: detail.establishment.establishment_id,
    })?;

  let review = client
    .review(&NewReview { appointment_id, rating, comment })
    .await?;
  screen.apply(Action::ReviewSubmitted)?;

  println!("reviewed {}: {}", detail.establishment.name, output::review(&review));
  Ok(())
}
