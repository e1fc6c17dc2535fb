//! Plain-text rendering of API records for the terminal.

use petagende_core::{
  appointment::{Appointment, AppointmentDetail},
  calendar::CalendarView,
  establishment::{Establishment, ServiceListing},
  pet::Pet,
  profile::Profile,
  review::Review,
  validate::format_tax_id,
};

fn stars(rating: Option<f64>, count: u32) -> String {
  match rating {
    Some(avg) => format!("★ {avg:.1} ({count})"),
    None => "no reviews".to_owned(),
  }
}

fn price(value: f64) -> String { format!("R$ {value:.2}") }

pub fn profile(p: &Profile) -> String {
  let mut lines = vec![format!("{} ({})", p.name, p.user_id)];
  if let Some(tax_id) = &p.tax_id {
    lines.push(format!("CPF:     {}", format_tax_id(tax_id)));
  }
  if let Some(phone) = &p.phone {
    lines.push(format!("Phone:   {phone}"));
  }
  if let Some(birth) = p.birth_date {
    lines.push(format!("Born:    {birth}"));
  }
  if let Some(address) = &p.address {
    lines.push(format!("Address: {}", address.one_line()));
  }
  lines.join("\n")
}

pub fn pet(p: &Pet) -> String {
  let mut parts = vec![p.species.clone()];
  parts.extend(p.breed.clone());
  if let Some(age) = p.age {
    parts.push(format!("{age}y"));
  }
  if let Some(kg) = p.weight_kg {
    parts.push(format!("{kg}kg"));
  }
  if p.vaccinated {
    parts.push("vaccinated".to_owned());
  }
  format!("{}  {} ({})", p.pet_id, p.name, parts.join(", "))
}

pub fn establishment(e: &Establishment) -> String {
  let address = e.address.as_ref().map(|a| a.one_line()).unwrap_or_default();
  format!(
    "{}  {}  {}  {}",
    e.establishment_id,
    e.name,
    stars(e.rating_average, e.rating_count),
    address
  )
  .trim_end()
  .to_owned()
}

pub fn service(l: &ServiceListing) -> String {
  let s = &l.service;
  format!(
    "{}  {} [{}] {} min, {} @ {}",
    s.service_id,
    s.name,
    s.category,
    s.duration_minutes,
    price(s.price),
    l.establishment.name
  )
}

pub fn appointment(a: &Appointment) -> String {
  format!(
    "{}  {} {}-{}  {}  {}",
    a.appointment_id,
    a.date,
    a.start,
    a.end,
    price(a.price),
    a.status
  )
}

pub fn appointment_detail(d: &AppointmentDetail) -> String {
  let a = &d.appointment;
  format!(
    "{}  {} {}-{}  {} for {} at {}  {}  {}",
    a.appointment_id,
    a.date,
    a.start,
    a.end,
    d.service.name,
    d.pet.name,
    d.establishment.name,
    price(a.price),
    a.status
  )
}

pub fn review(r: &Review) -> String {
  let filled = usize::from(r.rating.stars());
  let bar = format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled));
  match &r.comment {
    Some(comment) => format!("{}  {bar}  {comment}", r.created_at.format("%Y-%m-%d")),
    None => format!("{}  {bar}", r.created_at.format("%Y-%m-%d")),
  }
}

pub fn calendar(c: &CalendarView) -> String {
  let days: Vec<_> = c.open_days.iter().map(u32::to_string).collect();
  let times: Vec<_> = c.calendar.times.iter().map(ToString::to_string).collect();
  format!(
    "{}-{:02}\nOpen days: {}\nTimes:     {}",
    c.calendar.year,
    c.calendar.month,
    days.join(" "),
    times.join(" ")
  )
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use petagende_core::{
    appointment::AppointmentStatus,
    calendar::BookingCalendar,
    review::Rating,
  };
  use uuid::Uuid;

  use super::*;

  #[test]
  fn appointment_shows_unwrapped_window() {
    let now = Utc::now();
    let a = Appointment {
      appointment_id:   Uuid::nil(),
      user_id:          Uuid::nil(),
      pet_id:           Uuid::nil(),
      service_id:       Uuid::nil(),
      establishment_id: Uuid::nil(),
      date:             NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
      start:            "23:50".parse().unwrap(),
      end:              "24:20".parse().unwrap(),
      price:            60.0,
      notes:            None,
      status:           AppointmentStatus::Scheduled,
      request_key:      Uuid::nil(),
      created_at:       now,
      updated_at:       now,
    };
    assert!(appointment(&a).ends_with("2025-06-12 23:50-24:20  R$ 60.00  scheduled"));
  }

  #[test]
  fn review_renders_star_bar() {
    let r = Review {
      review_id:        Uuid::nil(),
      user_id:          Uuid::nil(),
      appointment_id:   Uuid::nil(),
      establishment_id: Uuid::nil(),
      rating:           Rating::new(3).unwrap(),
      comment:          Some("bom".into()),
      created_at:       Utc::now(),
    };
    assert!(review(&r).contains("★★★☆☆  bom"));
  }

  #[test]
  fn calendar_lists_days_and_times() {
    let view = CalendarView::from(&BookingCalendar::default());
    let text = calendar(&view);
    assert!(text.starts_with("2025-06\nOpen days: 10 11"));
    assert!(text.ends_with("Times:     10:50 10:55 11:00 11:05 14:00 14:30 15:00 16:15"));
  }
}
