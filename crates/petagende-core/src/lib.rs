//! Core types and trait definitions for PetAgende.
//!
//! This crate is free of HTTP and database dependencies. It holds the domain
//! records, the booking arithmetic, form validation, the booking-flow router
//! and the [`store::BookingStore`] abstraction every backend implements.

#![allow(async_fn_in_trait)]

pub mod account;
pub mod appointment;
pub mod calendar;
pub mod clock;
pub mod error;
pub mod establishment;
pub mod flow;
pub mod pet;
pub mod profile;
pub mod review;
pub mod search;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
