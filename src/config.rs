use std::env;

use crate::services::availability::ConflictPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub slot_minutes: i64,
    pub conflict_policy: ConflictPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "freetime.db".to_string()),
            slot_minutes: env::var("SLOT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(30),
            conflict_policy: env::var("CONFLICT_POLICY")
                .map(|v| ConflictPolicy::parse(&v))
                .unwrap_or_default(),
        }
    }
}
