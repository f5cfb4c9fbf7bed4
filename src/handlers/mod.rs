pub mod availability;
pub mod health;
pub mod schedule;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, NaiveTime, Weekday};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/availability", post(availability::common_availability))
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route("/api/users/:id", get(users::get_user))
        .route(
            "/api/users/:id/weekly-availability",
            get(schedule::list_weekly_rules),
        )
        .route(
            "/api/users/:id/date-overrides",
            get(schedule::list_date_overrides),
        )
        .route("/api/users/:id/events", get(schedule::list_events))
        .route(
            "/api/weekly-availability",
            post(schedule::create_weekly_rule),
        )
        .route("/api/date-overrides", post(schedule::create_date_override))
        .route("/api/events", post(schedule::create_event))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

pub(crate) fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| AppError::Validation(format!("invalid time: {s} (expected HH:MM)")))
}

pub(crate) fn parse_day(s: &str) -> Result<Weekday, AppError> {
    s.parse()
        .map_err(|_| AppError::Validation(format!("invalid day of week: {s}")))
}
