use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::{params, Connection};

use crate::models::{DateOverride, Event, User, WeeklyRule};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

pub fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn fmt_time(time: NaiveTime) -> String {
    time.format(TIME_FMT).to_string()
}

pub fn fmt_day(day: Weekday) -> String {
    day.to_string().to_lowercase()
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("malformed date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT).with_context(|| format!("malformed time: {s}"))
}

fn parse_day(s: &str) -> anyhow::Result<Weekday> {
    s.parse().map_err(|_| anyhow!("malformed day of week: {s}"))
}

// ── Users ──

pub fn create_user(conn: &Connection, name: &str, timezone: &str) -> anyhow::Result<User> {
    conn.execute(
        "INSERT INTO users (name, timezone) VALUES (?1, ?2)",
        params![name, timezone],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        timezone: timezone.to_string(),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT id, name, timezone FROM users WHERE id = ?1")?;

    let result = stmt.query_row(params![id], |row| {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            timezone: row.get(2)?,
        })
    });

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name, timezone FROM users ORDER BY id ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            timezone: row.get(2)?,
        })
    })?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

// ── Weekly availability ──

pub fn create_weekly_rule(
    conn: &Connection,
    user_id: i64,
    day: Weekday,
    start: NaiveTime,
    end: NaiveTime,
) -> anyhow::Result<WeeklyRule> {
    conn.execute(
        "INSERT INTO weekly_availability (user_id, day_of_week, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, fmt_day(day), fmt_time(start), fmt_time(end)],
    )?;
    Ok(WeeklyRule {
        id: conn.last_insert_rowid(),
        user_id,
        day,
        start,
        end,
    })
}

pub fn weekly_rules_for_user(
    conn: &Connection,
    user_id: i64,
    day: Option<Weekday>,
) -> anyhow::Result<Vec<WeeklyRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, day_of_week, start_time, end_time FROM weekly_availability
         WHERE user_id = ?1 AND (?2 IS NULL OR day_of_week = ?2)
         ORDER BY start_time ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![user_id, day.map(fmt_day)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut rules = vec![];
    for row in rows {
        let (id, user_id, day, start, end) = row?;
        rules.push(WeeklyRule {
            id,
            user_id,
            day: parse_day(&day)?,
            start: parse_time(&start)?,
            end: parse_time(&end)?,
        });
    }
    Ok(rules)
}

// ── Date overrides ──

pub fn create_date_override(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> anyhow::Result<DateOverride> {
    conn.execute(
        "INSERT INTO date_overrides (user_id, date, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, fmt_date(date), fmt_time(start), fmt_time(end)],
    )?;
    Ok(DateOverride {
        id: conn.last_insert_rowid(),
        user_id,
        date,
        start,
        end,
    })
}

pub fn date_overrides_for_user(
    conn: &Connection,
    user_id: i64,
    date: Option<NaiveDate>,
) -> anyhow::Result<Vec<DateOverride>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, start_time, end_time FROM date_overrides
         WHERE user_id = ?1 AND (?2 IS NULL OR date = ?2)
         ORDER BY date ASC, start_time ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![user_id, date.map(fmt_date)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut overrides = vec![];
    for row in rows {
        let (id, user_id, date, start, end) = row?;
        overrides.push(DateOverride {
            id,
            user_id,
            date: parse_date(&date)?,
            start: parse_time(&start)?,
            end: parse_time(&end)?,
        });
    }
    Ok(overrides)
}

// ── Events ──

pub fn create_event(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> anyhow::Result<Event> {
    conn.execute(
        "INSERT INTO events (user_id, date, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, fmt_date(date), fmt_time(start), fmt_time(end)],
    )?;
    Ok(Event {
        id: conn.last_insert_rowid(),
        user_id,
        date,
        start,
        end,
    })
}

pub fn events_for_user(
    conn: &Connection,
    user_id: i64,
    date: Option<NaiveDate>,
) -> anyhow::Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, start_time, end_time FROM events
         WHERE user_id = ?1 AND (?2 IS NULL OR date = ?2)
         ORDER BY date ASC, start_time ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![user_id, date.map(fmt_date)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut events = vec![];
    for row in rows {
        let (id, user_id, date, start, end) = row?;
        events.push(Event {
            id,
            user_id,
            date: parse_date(&date)?,
            start: parse_time(&start)?,
            end: parse_time(&end)?,
        });
    }
    Ok(events)
}
