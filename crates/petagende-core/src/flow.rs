//! The booking-flow router.
//!
//! A finite state machine over the application's screens. Selections made
//! along the way (pet, service, the appointment under review) travel as typed
//! payloads on the state rather than as loose globals.

use std::fmt;

use uuid::Uuid;

use crate::{Error, Result};

/// Top-level destinations reachable from any signed-in screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Home,
  Search,
  Profile,
  Appointments,
  /// Start a booking.
  Book,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  SignIn,
  SignUp,
  Home,
  Search,
  Profile,
  Appointments,
  PetSelection,
  ServiceSelection { pet_id: Uuid },
  Calendar { pet_id: Uuid, service_id: Uuid },
  Review { appointment_id: Uuid, establishment_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  OpenSignUp,
  SignedUp,
  SignedIn,
  SignOut,
  Back,
  Navigate(Tab),
  PetChosen(Uuid),
  ServiceChosen(Uuid),
  Booked,
  ReviewRequested { appointment_id: Uuid, establishment_id: Uuid },
  ReviewSubmitted,
}

impl Screen {
  pub fn is_signed_in(&self) -> bool { !matches!(self, Self::SignIn | Self::SignUp) }

  /// Apply `action`, returning the next screen or an error naming the
  /// rejected transition.
  pub fn apply(self, action: Action) -> Result<Screen> {
    use Screen as S;

    let next = match (self, action) {
      (S::SignIn, Action::OpenSignUp) => Some(S::SignUp),
      (S::SignUp, Action::Back | Action::SignedUp) => Some(S::SignIn),
      (S::SignIn, Action::SignedIn) => Some(S::Home),

      (s, Action::SignOut) if s.is_signed_in() => Some(S::SignIn),
      (s, Action::Navigate(tab)) if s.is_signed_in() => Some(match tab {
        Tab::Home => S::Home,
        Tab::Search => S::Search,
        Tab::Profile => S::Profile,
        Tab::Appointments => S::Appointments,
        Tab::Book => S::PetSelection,
      }),

      (S::PetSelection, Action::PetChosen(pet_id)) => {
        Some(S::ServiceSelection { pet_id })
      }
      (S::PetSelection, Action::Back) => Some(S::Home),
      (S::ServiceSelection { pet_id }, Action::ServiceChosen(service_id)) => {
        Some(S::Calendar { pet_id, service_id })
      }
      (S::ServiceSelection { .. }, Action::Back) => Some(S::PetSelection),
      (S::Calendar { pet_id, .. }, Action::Back) => {
        Some(S::ServiceSelection { pet_id })
      }
      (S::Calendar { .. }, Action::Booked) => Some(S::Home),

      (
        S::Appointments,
        Action::ReviewRequested { appointment_id, establishment_id },
      ) => Some(S::Review { appointment_id, establishment_id }),
      (S::Review { .. }, Action::Back | Action::ReviewSubmitted) => Some(S::Home),

      _ => None,
    };

    next.ok_or_else(|| Error::InvalidTransition {
      from:   self.to_string(),
      action: format!("{action:?}"),
    })
  }
}

impl fmt::Display for Screen {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::SignIn => "sign-in",
      Self::SignUp => "sign-up",
      Self::Home => "home",
      Self::Search => "search",
      Self::Profile => "profile",
      Self::Appointments => "appointments",
      Self::PetSelection => "pet-selection",
      Self::ServiceSelection { .. } => "service-selection",
      Self::Calendar { .. } => "calendar",
      Self::Review { .. } => "review",
    };
    f.write_str(name)
  }
}
