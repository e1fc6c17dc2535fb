//! The bookable calendar: one month, a first open day, and a fixed list of
//! candidate start times offered on every open day.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, clock::ClockTime};

/// Which days and start times a booking may choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCalendar {
  pub year:           i32,
  /// 1-based month.
  pub month:          u32,
  /// Days before this one are closed.
  #[serde(default = "default_first_open_day")]
  pub first_open_day: u32,
  #[serde(default = "default_times")]
  pub times:          Vec<ClockTime>,
}

fn default_first_open_day() -> u32 { 1 }

fn default_times() -> Vec<ClockTime> {
  ["10:50", "10:55", "11:00", "11:05", "14:00", "14:30", "15:00", "16:15"]
    .iter()
    .filter_map(|t| t.parse().ok())
    .collect()
}

impl Default for BookingCalendar {
  fn default() -> Self {
    Self {
      year:           2025,
      month:          6,
      first_open_day: 10,
      times:          default_times(),
    }
  }
}

impl BookingCalendar {
  /// Number of days in the configured month, or `None` if the month itself
  /// is out of range.
  pub fn days_in_month(&self) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
    let next = if self.month == 12 {
      NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
    } else {
      NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
  }

  /// Days a client may offer, in order.
  pub fn open_days(&self) -> Vec<u32> {
    let last = self.days_in_month().unwrap_or(0);
    (self.first_open_day.max(1)..=last).collect()
  }

  /// Resolve a day-of-month to a real calendar date.
  pub fn date_for_day(&self, day: u32) -> Result<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or(
      Error::InvalidDate { year: self.year, month: self.month, day },
    )?;
    if date.day() < self.first_open_day {
      return Err(Error::DayClosed { day, first_open: self.first_open_day });
    }
    Ok(date)
  }

  /// Parse a start time and check it is one of the candidate times.
  pub fn offered_time(&self, raw: &str) -> Result<ClockTime> {
    let time: ClockTime = raw.parse()?;
    if !self.times.contains(&time) {
      return Err(Error::TimeNotOffered(time.to_string()));
    }
    Ok(time)
  }
}

/// What `GET /calendar` returns: the configuration plus the days it opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarView {
  #[serde(flatten)]
  pub calendar:  BookingCalendar,
  pub open_days: Vec<u32>,
}

impl From<&BookingCalendar> for CalendarView {
  fn from(calendar: &BookingCalendar) -> Self {
    Self { open_days: calendar.open_days(), calendar: calendar.clone() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn june_has_thirty_days() {
    let cal = BookingCalendar::default();
    assert_eq!(cal.days_in_month(), Some(30));
    assert_eq!(cal.open_days().first(), Some(&10));
    assert_eq!(cal.open_days().last(), Some(&30));
  }

  #[test]
  fn december_rolls_into_next_year() {
    let cal = BookingCalendar { month: 12, ..BookingCalendar::default() };
    assert_eq!(cal.days_in_month(), Some(31));
  }

  #[test]
  fn impossible_days_are_rejected() {
    let cal = BookingCalendar { first_open_day: 1, ..BookingCalendar::default() };
    assert!(matches!(cal.date_for_day(31), Err(Error::InvalidDate { day: 31, .. })));
    assert!(matches!(cal.date_for_day(0), Err(Error::InvalidDate { .. })));
    assert_eq!(
      cal.date_for_day(30).unwrap(),
      NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    );
  }

  #[test]
  fn closed_days_are_rejected() {
    let cal = BookingCalendar::default();
    assert_eq!(
      cal.date_for_day(9),
      Err(Error::DayClosed { day: 9, first_open: 10 })
    );
    assert!(cal.date_for_day(10).is_ok());
  }

  #[test]
  fn only_candidate_times_are_offered() {
    let cal = BookingCalendar::default();
    assert_eq!(cal.offered_time("14:30").unwrap().to_string(), "14:30");
    assert_eq!(
      cal.offered_time("14:31"),
      Err(Error::TimeNotOffered("14:31".into()))
    );
    assert!(matches!(cal.offered_time("noon"), Err(Error::InvalidTime(_))));
  }

  #[test]
  fn deserialises_with_defaults() {
    let cal: BookingCalendar =
      serde_json::from_str(r#"{"year":2026,"month":2}"#).unwrap();
    assert_eq!(cal.first_open_day, 1);
    assert_eq!(cal.times.len(), 8);
    assert_eq!(cal.days_in_month(), Some(28));
  }
}
