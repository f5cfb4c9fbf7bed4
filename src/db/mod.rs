pub mod migrations;
pub mod queries;

use anyhow::Context;
use chrono::{NaiveDate, Weekday};
use rusqlite::Connection;

use crate::models::{DateOverride, Event, User, WeeklyRule};
use crate::services::availability::ScheduleStore;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Read-only adapter the availability engine queries through.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleStore for SqliteStore<'_> {
    fn user(&self, id: i64) -> anyhow::Result<Option<User>> {
        queries::get_user(self.conn, id)
    }

    fn weekly_rules(&self, user_id: i64, day: Weekday) -> anyhow::Result<Vec<WeeklyRule>> {
        queries::weekly_rules_for_user(self.conn, user_id, Some(day))
    }

    fn date_overrides(&self, user_id: i64, date: NaiveDate) -> anyhow::Result<Vec<DateOverride>> {
        queries::date_overrides_for_user(self.conn, user_id, Some(date))
    }

    fn events(&self, user_id: i64, date: NaiveDate) -> anyhow::Result<Vec<Event>> {
        queries::events_for_user(self.conn, user_id, Some(date))
    }
}
