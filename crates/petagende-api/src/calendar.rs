//! `GET /calendar`: the bookable month, its open days and candidate times.

use axum::{Json, extract::State};
use petagende_core::{calendar::CalendarView, store::BookingStore};

use crate::ApiState;

pub async fn handler<S>(State(state): State<ApiState<S>>) -> Json<CalendarView>
where
  S: BookingStore + 'static,
{
  Json(CalendarView::from(state.calendar.as_ref()))
}
