//! Time-of-day values and appointment window derivation.
//!
//! Appointment times are stored and exchanged as zero-padded `HH:MM` strings.
//! A derived end time is plain minute-of-day arithmetic: it is never wrapped
//! past midnight and never rolls the appointment over to the next calendar
//! day, so `23:50` plus 30 minutes is `24:20`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Longest bookable service. A window never spans more than one day.
pub const MAX_DURATION_MINUTES: u32 = MINUTES_PER_DAY - 1;

// ─── ClockTime ───────────────────────────────────────────────────────────────

/// A time of day measured in minutes since midnight.
///
/// Values at or beyond [`MINUTES_PER_DAY`] are representable on purpose: they
/// are what an unguarded end-time derivation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
  minutes: u32,
}

impl ClockTime {
  /// Build from an hour and minute pair. Minutes must be below 60; hours are
  /// not bounded.
  pub fn from_hm(hours: u32, minutes: u32) -> Result<Self> {
    let invalid = || Error::InvalidTime(format!("{hours}:{minutes}"));
    if minutes >= 60 {
      return Err(invalid());
    }
    let total = hours
      .checked_mul(60)
      .and_then(|m| m.checked_add(minutes))
      .ok_or_else(invalid)?;
    Ok(Self { minutes: total })
  }

  pub const fn from_minutes(minutes: u32) -> Self { Self { minutes } }

  /// Minutes since midnight.
  pub const fn minutes(self) -> u32 { self.minutes }

  pub const fn hour(self) -> u32 { self.minutes / 60 }

  pub const fn minute(self) -> u32 { self.minutes % 60 }

  /// `true` for `00:00` through `23:59`.
  pub const fn is_within_day(self) -> bool { self.minutes < MINUTES_PER_DAY }

  /// Add whole minutes, carrying minute overflow into hours. No wraparound;
  /// `None` only when the sum leaves the `u32` range.
  pub const fn plus_minutes(self, minutes: u32) -> Option<Self> {
    match self.minutes.checked_add(minutes) {
      Some(minutes) => Some(Self { minutes }),
      None => None,
    }
  }
}

impl fmt::Display for ClockTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour(), self.minute())
  }
}

impl FromStr for ClockTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidTime(s.to_owned());
    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;

    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(h) || m.len() != 2 || !all_digits(m) {
      return Err(invalid());
    }

    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;
    Self::from_hm(hours, minutes).map_err(|_| invalid())
  }
}

impl Serialize for ClockTime {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for ClockTime {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

// ─── SlotWindow ──────────────────────────────────────────────────────────────

/// The start and end of an appointment on its booking date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
  pub start: ClockTime,
  pub end:   ClockTime,
}

impl SlotWindow {
  /// `end = start + duration_minutes`. Durations above
  /// [`MAX_DURATION_MINUTES`] are rejected.
  pub fn derive(start: ClockTime, duration_minutes: u32) -> Result<Self> {
    let too_long = || Error::DurationOutOfRange {
      got: duration_minutes,
      max: MAX_DURATION_MINUTES,
    };
    if duration_minutes > MAX_DURATION_MINUTES {
      return Err(too_long());
    }
    let end = start.plus_minutes(duration_minutes).ok_or_else(too_long)?;
    Ok(Self { start, end })
  }

  pub fn duration_minutes(&self) -> u32 { self.end.minutes() - self.start.minutes() }

  /// The end lies after midnight of the booking date. The stored end time
  /// keeps the unwrapped value (e.g. `24:20`).
  pub fn crosses_midnight(&self) -> bool { self.end.minutes() > MINUTES_PER_DAY }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(s: &str) -> ClockTime { s.parse().unwrap() }

  #[test]
  fn parses_and_formats_zero_padded() {
    assert_eq!(t("9:05").to_string(), "09:05");
    assert_eq!(t("00:00").minutes(), 0);
    assert_eq!(t("16:15").minutes(), 16 * 60 + 15);
  }

  #[test]
  fn rejects_malformed_times() {
    for bad in ["", "10", "10:5", "10:60", "ab:cd", "-1:00", "10:00:00", ":30", "99999999:00"] {
      assert!(bad.parse::<ClockTime>().is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn afternoon_window() {
    let w = SlotWindow::derive(t("14:30"), 45).unwrap();
    assert_eq!(w.start.to_string(), "14:30");
    assert_eq!(w.end.to_string(), "15:15");
    assert!(!w.crosses_midnight());
  }

  #[test]
  fn late_window_is_not_wrapped() {
    let w = SlotWindow::derive(t("23:50"), 30).unwrap();
    assert_eq!(w.end.to_string(), "24:20");
    assert!(w.crosses_midnight());
    // The unwrapped string still parses back to the same value.
    assert_eq!(t("24:20"), w.end);
  }

  #[test]
  fn ending_exactly_at_midnight_does_not_cross() {
    let w = SlotWindow::derive(t("23:00"), 60).unwrap();
    assert_eq!(w.end.to_string(), "24:00");
    assert!(!w.crosses_midnight());
  }

  #[test]
  fn end_decomposes_back_to_minute_sum() {
    for start in (0..MINUTES_PER_DAY).step_by(37) {
      for d in [0, 1, 15, 59, 60, 61, 90, 239, 1439] {
        let start = ClockTime::from_minutes(start);
        if start.minutes() + d >= MINUTES_PER_DAY {
          continue;
        }
        let end = SlotWindow::derive(start, d).unwrap().end;
        let reparsed = t(&end.to_string());
        assert_eq!(reparsed.hour() * 60 + reparsed.minute(), start.minutes() + d);
        assert_eq!(SlotWindow { start, end }.duration_minutes(), d);
      }
    }
  }

  #[test]
  fn every_formatted_value_parses_back() {
    for minutes in [0, 1439, 1440, 60_650, 5_999_999, u32::MAX] {
      let time = ClockTime::from_minutes(minutes);
      assert_eq!(t(&time.to_string()), time, "{time}");
    }
    assert_eq!(ClockTime::from_minutes(60_650).to_string(), "1010:50");
  }

  #[test]
  fn oversized_durations_are_rejected() {
    assert!(SlotWindow::derive(t("10:50"), MAX_DURATION_MINUTES).is_ok());
    assert_eq!(
      SlotWindow::derive(t("10:50"), 60_000),
      Err(Error::DurationOutOfRange { got: 60_000, max: MAX_DURATION_MINUTES })
    );
    assert!(SlotWindow::derive(t("10:50"), u32::MAX).is_err());
    assert_eq!(ClockTime::from_minutes(u32::MAX).plus_minutes(1), None);
  }

  #[test]
  fn serde_uses_hh_mm_strings() {
    let json = serde_json::to_string(&t("08:05")).unwrap();
    assert_eq!(json, "\"08:05\"");
    let back: ClockTime = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t("08:05"));
    assert!(serde_json::from_str::<ClockTime>("\"8h05\"").is_err());
  }
}
