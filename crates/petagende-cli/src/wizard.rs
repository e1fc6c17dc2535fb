//! `petagende book`: the booking wizard.
//!
//! Walks the flow router from pet selection through service selection to the
//! calendar. Each step is answered by its command-line flag when one was
//! given and by a prompt otherwise; answering `b` steps back.

use anyhow::{Result, bail};
use petagende_core::{
  appointment::BookingRequest,
  calendar::BookingCalendar,
  clock::ClockTime,
  flow::{Action, Screen, Tab},
};
use uuid::Uuid;

use crate::{
  client::{ApiClient, ServiceFilter},
  output,
  prompt::{self, Choice},
};

/// Answers supplied up front. Each is used once, the first time its step is
/// reached.
#[derive(Debug, Default)]
pub struct Presets {
  pub pet:         Option<Uuid>,
  pub service:     Option<Uuid>,
  pub day:         Option<u32>,
  pub time:        Option<String>,
  pub notes:       Option<String>,
  pub request_key: Option<Uuid>,
}

pub async fn run(client: &ApiClient, mut presets: Presets) -> Result<()> {
  let view = client.calendar().await?;
  let calendar = view.calendar;
  // One key per booking attempt, kept across back-and-forth.
  let request_key = presets.request_key.unwrap_or_else(Uuid::new_v4);

  let mut screen = Screen::Home.apply(Action::Navigate(Tab::Book))?;
  let mut booked = false;

  loop {
    let action = match screen {
      Screen::PetSelection => match presets.pet.take() {
        Some(id) => Action::PetChosen(id),
        None => pick_pet(client).await?,
      },
      Screen::ServiceSelection { pet_id } => match presets.service.take() {
        Some(id) => Action::ServiceChosen(id),
        None => pick_service(client, pet_id).await?,
      },
      Screen::Calendar { pet_id, service_id } => {
        let Some((day, time)) = pick_slot(&calendar, &mut presets)? else {
          screen = screen.apply(Action::Back)?;
          continue;
        };
        let request = BookingRequest {
          pet_id,
          service_id,
          day,
          time: time.to_string(),
          notes: presets.notes.take(),
          request_key: Some(request_key),
        };
        let (appointment, replayed) = client.book(&request).await?;
        if replayed {
          println!("already booked:");
        } else {
          println!("booked:");
        }
        println!("{}", output::appointment(&appointment));
        booked = true;
        Action::Booked
      }
      Screen::Home => break,
      other => bail!("booking cannot continue from {other}"),
    };
    screen = screen.apply(action)?;
  }

  if !booked {
    println!("booking abandoned");
  }
  Ok(())
}

async fn pick_pet(client: &ApiClient) -> Result<Action> {
  let pets = client.list_pets().await?;
  if pets.is_empty() {
    bail!("no pets registered; add one with `petagende pets add`");
  }
  let items: Vec<_> = pets.iter().map(|p| format!("{} ({})", p.name, p.species)).collect();
  Ok(match prompt::choose("Pet", &items)? {
    Choice::Item(i) => Action::PetChosen(pets[i].pet_id),
    Choice::Back => Action::Back,
  })
}

async fn pick_service(client: &ApiClient, pet_id: Uuid) -> Result<Action> {
  let species = client
    .list_pets()
    .await?
    .into_iter()
    .find(|p| p.pet_id == pet_id)
    .map(|p| p.species);
  let Some(species) = species else {
    bail!("pet {pet_id} not found");
  };

  let listings = client
    .services(&ServiceFilter { species: Some(species.clone()), ..ServiceFilter::default() })
    .await?;
  if listings.is_empty() {
    println!("no services available for {species}");
    return Ok(Action::Back);
  }
  let items: Vec<_> = listings.iter().map(output::service).collect();
  Ok(match prompt::choose("Service", &items)? {
    Choice::Item(i) => Action::ServiceChosen(listings[i].service.service_id),
    Choice::Back => Action::Back,
  })
}

/// Resolve the day and start time. `None` means the user stepped back.
fn pick_slot(calendar: &BookingCalendar, presets: &mut Presets) -> Result<Option<(u32, ClockTime)>> {
  let day = match presets.day.take() {
    Some(day) => {
      calendar.date_for_day(day)?;
      day
    }
    None => {
      let open = calendar.open_days();
      let (first, last) = (open.first().copied().unwrap_or(1), open.last().copied().unwrap_or(1));
      loop {
        let answer = prompt::ask(&format!("Day ({first}-{last}, b to go back)"))?;
        if matches!(prompt::parse_choice(&answer, 0), Some(Choice::Back)) {
          return Ok(None);
        }
        match parse_day(calendar, &answer) {
          Ok(day) => break day,
          Err(e) => println!("{e}"),
        }
      }
    }
  };

  let time = match presets.time.take() {
    Some(raw) => calendar.offered_time(&raw)?,
    None => {
      let items: Vec<_> = calendar.times.iter().map(ToString::to_string).collect();
      match prompt::choose("Time", &items)? {
        Choice::Item(i) => calendar.times[i],
        Choice::Back => return Ok(None),
      }
    }
  };

  Ok(Some((day, time)))
}

/// Parse a typed day and check the calendar opens it.
pub fn parse_day(calendar: &BookingCalendar, raw: &str) -> Result<u32> {
  let Ok(day) = raw.trim().parse::<u32>() else {
    bail!("{raw:?} is not a day of the month");
  };
  calendar.date_for_day(day)?;
  Ok(day)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn typed_days_are_checked_against_the_calendar() {
    let cal = BookingCalendar::default();
    assert_eq!(parse_day(&cal, " 12 ").unwrap(), 12);
    assert!(parse_day(&cal, "9").is_err());
    assert!(parse_day(&cal, "31").is_err());
    assert!(parse_day(&cal, "doze").is_err());
  }

  #[test]
  fn preset_slot_skips_prompts() {
    let cal = BookingCalendar::default();
    let mut presets = Presets {
      day: Some(12),
      time: Some("14:30".into()),
      ..Presets::default()
    };
    let (day, time) = pick_slot(&cal, &mut presets).unwrap().unwrap();
    assert_eq!(day, 12);
    assert_eq!(time.to_string(), "14:30");
    assert!(presets.day.is_none() && presets.time.is_none());
  }

  #[test]
  fn preset_time_off_the_list_is_an_error() {
    let cal = BookingCalendar::default();
    let mut presets = Presets {
      day: Some(12),
      time: Some("12:00".into()),
      ..Presets::default()
    };
    assert!(pick_slot(&cal, &mut presets).is_err());
  }
}
