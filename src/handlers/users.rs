use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::time;
use crate::state::AppState;

#[derive(Serialize)]
pub struct UserResponse {
    id: i64,
    name: String,
    timezone: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            timezone: user.timezone,
        }
    }
}

// POST /api/users
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub timezone: String,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    // Reject unknown zone names at the boundary; the engine relies on every
    // stored zone parsing cleanly.
    time::parse_zone(&body.timezone)?;

    let user = {
        let db = state.db.lock().unwrap();
        queries::create_user(&db, name, &body.timezone)?
    };

    tracing::info!(user_id = user.id, "created user");
    Ok(Json(user.into()))
}

// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = {
        let db = state.db.lock().unwrap();
        queries::list_users(&db)?
    };

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = {
        let db = state.db.lock().unwrap();
        queries::get_user(&db, id)?
    };

    match user {
        Some(user) => Ok(Json(user.into())),
        None => Err(AppError::NotFound(format!("user {id}"))),
    }
}
