use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{parse_date, parse_day, parse_time};
use crate::models::{DateOverride, Event, WeeklyRule};
use crate::state::AppState;

fn ensure_user(conn: &Connection, user_id: i64) -> Result<(), AppError> {
    match queries::get_user(conn, user_id)? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("user {user_id}"))),
    }
}

fn ensure_ordered(start: NaiveTime, end: NaiveTime) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct DateFilter {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct DayFilter {
    pub day: Option<String>,
}

// ── Weekly availability ──

#[derive(Deserialize)]
pub struct CreateWeeklyRuleRequest {
    pub user_id: i64,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize)]
pub struct WeeklyRuleResponse {
    id: i64,
    user_id: i64,
    day_of_week: String,
    start_time: String,
    end_time: String,
}

impl From<WeeklyRule> for WeeklyRuleResponse {
    fn from(rule: WeeklyRule) -> Self {
        Self {
            id: rule.id,
            user_id: rule.user_id,
            day_of_week: queries::fmt_day(rule.day),
            start_time: queries::fmt_time(rule.start),
            end_time: queries::fmt_time(rule.end),
        }
    }
}

// POST /api/weekly-availability
pub async fn create_weekly_rule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateWeeklyRuleRequest>,
) -> Result<Json<WeeklyRuleResponse>, AppError> {
    let day = parse_day(&body.day_of_week)?;
    let start = parse_time(&body.start_time)?;
    let end = parse_time(&body.end_time)?;
    ensure_ordered(start, end)?;

    let rule = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, body.user_id)?;
        queries::create_weekly_rule(&db, body.user_id, day, start, end)?
    };

    Ok(Json(rule.into()))
}

// GET /api/users/:id/weekly-availability
pub async fn list_weekly_rules(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(filter): Query<DayFilter>,
) -> Result<Json<Vec<WeeklyRuleResponse>>, AppError> {
    let day = filter.day.as_deref().map(parse_day).transpose()?;

    let rules = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, user_id)?;
        queries::weekly_rules_for_user(&db, user_id, day)?
    };

    Ok(Json(rules.into_iter().map(WeeklyRuleResponse::from).collect()))
}

// ── Date overrides ──

#[derive(Deserialize)]
pub struct CreateDateOverrideRequest {
    pub user_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize)]
pub struct DateOverrideResponse {
    id: i64,
    user_id: i64,
    date: String,
    start_time: String,
    end_time: String,
}

impl From<DateOverride> for DateOverrideResponse {
    fn from(over: DateOverride) -> Self {
        Self {
            id: over.id,
            user_id: over.user_id,
            date: queries::fmt_date(over.date),
            start_time: queries::fmt_time(over.start),
            end_time: queries::fmt_time(over.end),
        }
    }
}

// POST /api/date-overrides
pub async fn create_date_override(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDateOverrideRequest>,
) -> Result<Json<DateOverrideResponse>, AppError> {
    let date = parse_date(&body.date)?;
    let start = parse_time(&body.start_time)?;
    let end = parse_time(&body.end_time)?;
    ensure_ordered(start, end)?;

    let over = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, body.user_id)?;
        queries::create_date_override(&db, body.user_id, date, start, end)?
    };

    Ok(Json(over.into()))
}

// GET /api/users/:id/date-overrides
pub async fn list_date_overrides(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<Vec<DateOverrideResponse>>, AppError> {
    let date = filter.date.as_deref().map(parse_date).transpose()?;

    let overrides = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, user_id)?;
        queries::date_overrides_for_user(&db, user_id, date)?
    };

    Ok(Json(
        overrides.into_iter().map(DateOverrideResponse::from).collect(),
    ))
}

// ── Events ──

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub user_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize)]
pub struct EventResponse {
    id: i64,
    user_id: i64,
    date: String,
    start_time: String,
    end_time: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            date: queries::fmt_date(event.date),
            start_time: queries::fmt_time(event.start),
            end_time: queries::fmt_time(event.end),
        }
    }
}

// POST /api/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let date = parse_date(&body.date)?;
    let start = parse_time(&body.start_time)?;
    let end = parse_time(&body.end_time)?;
    ensure_ordered(start, end)?;

    let event = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, body.user_id)?;
        queries::create_event(&db, body.user_id, date, start, end)?
    };

    Ok(Json(event.into()))
}

// GET /api/users/:id/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(filter): Query<DateFilter>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let date = filter.date.as_deref().map(parse_date).transpose()?;

    let events = {
        let db = state.db.lock().unwrap();
        ensure_user(&db, user_id)?;
        queries::events_for_user(&db, user_id, date)?
    };

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
