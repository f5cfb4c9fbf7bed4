use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::SqliteStore;
use crate::errors::AppError;
use crate::handlers::parse_date;
use crate::services::availability::{self, AvailabilityQuery, EngineOptions};
use crate::state::AppState;

// POST /availability
#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub user_ids: Vec<i64>,
    /// [start_date, end_date], both inclusive, as YYYY-MM-DD.
    pub date_range: [String; 2],
    pub timezone: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub availability: BTreeMap<String, Vec<String>>,
}

pub async fn common_availability(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    if body.user_ids.is_empty() {
        return Err(AppError::Validation("user_ids must not be empty".to_string()));
    }

    let query = AvailabilityQuery {
        user_ids: body.user_ids,
        start_date: parse_date(&body.date_range[0])?,
        end_date: parse_date(&body.date_range[1])?,
        timezone: body.timezone,
    };
    let opts = EngineOptions {
        slot_minutes: state.config.slot_minutes,
        conflict_policy: state.config.conflict_policy,
    };

    let availability = {
        let db = state.db.lock().unwrap();
        availability::common_availability(&SqliteStore::new(&db), &query, &opts)?
    };

    Ok(Json(AvailabilityResponse { availability }))
}
