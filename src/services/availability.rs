use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use chrono_tz::Tz;

use crate::errors::AppError;
use crate::models::{DateOverride, Event, User, WeeklyRule};
use crate::services::intersect;
use crate::services::slots;
use crate::services::time::{self, TimeInterval};

/// Read-only view of persisted schedules. The engine only ever queries; it
/// performs no writes and keeps no state across requests.
pub trait ScheduleStore {
    fn user(&self, id: i64) -> anyhow::Result<Option<User>>;
    fn weekly_rules(&self, user_id: i64, day: Weekday) -> anyhow::Result<Vec<WeeklyRule>>;
    fn date_overrides(&self, user_id: i64, date: NaiveDate) -> anyhow::Result<Vec<DateOverride>>;
    fn events(&self, user_id: i64, date: NaiveDate) -> anyhow::Result<Vec<Event>>;
}

/// What happens to a free window that overlaps an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// The window is removed whole, never clipped. A user free 09:00-17:00
    /// with a 12:00-12:30 event loses the entire day.
    #[default]
    Drop,
    /// The overlapping sub-range is cut out, splitting the window if the
    /// event falls in the middle.
    Clip,
}

impl ConflictPolicy {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "clip" => ConflictPolicy::Clip,
            _ => ConflictPolicy::Drop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Drop => "drop",
            ConflictPolicy::Clip => "clip",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub slot_minutes: i64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            conflict_policy: ConflictPolicy::Drop,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub user_ids: Vec<i64>,
    /// Inclusive on both ends.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// IANA zone name the result is expressed in.
    pub timezone: String,
}

/// One user's free intervals for one date, in the target zone.
///
/// Candidates are the union of weekly rules matching the date's weekday and
/// overrides matching the exact date (overrides add, they do not replace).
/// Every candidate and event is converted from the user's home zone before
/// comparison; events are then subtracted per the conflict policy.
pub fn resolve_user_day(
    store: &dyn ScheduleStore,
    user: &User,
    date: NaiveDate,
    target: Tz,
    policy: ConflictPolicy,
) -> Result<Vec<TimeInterval>, AppError> {
    let home = time::parse_zone(&user.timezone)?;

    let mut windows: Vec<TimeInterval> = Vec::new();
    for rule in store.weekly_rules(user.id, date.weekday())? {
        windows.push(time::zoned_interval(date, rule.start, rule.end, home, target));
    }
    for over in store.date_overrides(user.id, date)? {
        windows.push(time::zoned_interval(date, over.start, over.end, home, target));
    }

    for event in store.events(user.id, date)? {
        let busy = time::zoned_interval(date, event.start, event.end, home, target);
        windows = subtract(windows, &busy, policy);
        if windows.is_empty() {
            break;
        }
    }

    Ok(windows)
}

fn subtract(windows: Vec<TimeInterval>, busy: &TimeInterval, policy: ConflictPolicy) -> Vec<TimeInterval> {
    match policy {
        ConflictPolicy::Drop => windows
            .into_iter()
            .filter(|w| !intersect::overlaps(w, busy))
            .collect(),
        ConflictPolicy::Clip => {
            let mut out = Vec::new();
            for window in windows {
                if !intersect::overlaps(&window, busy) {
                    out.push(window);
                    continue;
                }
                if window.start < busy.start {
                    out.push(TimeInterval::new(window.start.clone(), busy.start.clone()));
                }
                if busy.end < window.end {
                    out.push(TimeInterval::new(busy.end.clone(), window.end.clone()));
                }
            }
            out
        }
    }
}

/// Common free slots across all requested users over an inclusive date range.
///
/// Users are resolved before any date processing; an unknown id fails the
/// whole request. The result maps `DD-MM-YYYY` to slot labels and is sparse:
/// dates with no common slot are absent, never an empty list.
pub fn common_availability(
    store: &dyn ScheduleStore,
    query: &AvailabilityQuery,
    opts: &EngineOptions,
) -> Result<BTreeMap<String, Vec<String>>, AppError> {
    if query.end_date < query.start_date {
        return Err(AppError::InvalidDateRange {
            start: query.start_date,
            end: query.end_date,
        });
    }
    let target = time::parse_zone(&query.timezone)?;

    let mut users = Vec::with_capacity(query.user_ids.len());
    let mut missing = Vec::new();
    for id in &query.user_ids {
        match store.user(*id)? {
            Some(user) => users.push(user),
            None => missing.push(*id),
        }
    }
    if !missing.is_empty() {
        return Err(AppError::UserNotFound(missing));
    }

    let mut availability = BTreeMap::new();
    let mut date = query.start_date;
    while date <= query.end_date {
        let mut per_user = Vec::with_capacity(users.len());
        for user in &users {
            per_user.push(resolve_user_day(store, user, date, target, opts.conflict_policy)?);
        }

        let common = intersect::intersect_all(&per_user);

        let labels: Vec<String> = common
            .iter()
            .flat_map(|window| slots::slots(window, opts.slot_minutes).map(|s| slots::label(&s)))
            .collect();

        if labels.is_empty() {
            tracing::debug!(%date, "no common availability");
        } else {
            availability.insert(date.format("%d-%m-%Y").to_string(), labels);
        }

        date += Duration::days(1);
    }

    Ok(availability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, queries, SqliteStore};
    use rusqlite::Connection;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> chrono::NaiveTime {
        chrono::NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn query(ids: &[i64], day: &str, tz: &str) -> AvailabilityQuery {
        AvailabilityQuery {
            user_ids: ids.to_vec(),
            start_date: date(day),
            end_date: date(day),
            timezone: tz.to_string(),
        }
    }

    // 2025-06-16 is a Monday throughout.

    #[test]
    fn test_common_slots_two_users() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        let b = queries::create_user(&conn, "Bob", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("12:00")).unwrap();
        queries::create_weekly_rule(&conn, b.id, Weekday::Mon, t("10:00"), t("11:30")).unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id, b.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.get("16-06-2025").unwrap(),
            &vec!["10:00am-10:30am", "10:30am-11:00am", "11:00am-11:30am"]
        );
    }

    #[test]
    fn test_event_drops_entire_window() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        let b = queries::create_user(&conn, "Bob", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("12:00")).unwrap();
        queries::create_weekly_rule(&conn, b.id, Weekday::Mon, t("10:00"), t("11:30")).unwrap();
        // A 30-minute event wipes Alice's whole 09:00-12:00 window under the
        // drop policy, so the date disappears from the result.
        queries::create_event(&conn, a.id, date("2025-06-16"), t("10:00"), t("10:30")).unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id, b.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_event_clips_window_under_clip_policy() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        let b = queries::create_user(&conn, "Bob", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("12:00")).unwrap();
        queries::create_weekly_rule(&conn, b.id, Weekday::Mon, t("10:00"), t("11:30")).unwrap();
        queries::create_event(&conn, a.id, date("2025-06-16"), t("10:00"), t("10:30")).unwrap();

        let store = SqliteStore::new(&conn);
        let opts = EngineOptions {
            conflict_policy: ConflictPolicy::Clip,
            ..EngineOptions::default()
        };
        let result =
            common_availability(&store, &query(&[a.id, b.id], "2025-06-16", "UTC"), &opts).unwrap();

        assert_eq!(
            result.get("16-06-2025").unwrap(),
            &vec!["10:30am-11:00am", "11:00am-11:30am"]
        );
    }

    #[test]
    fn test_override_adds_to_weekly_rules() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();
        queries::create_date_override(&conn, a.id, date("2025-06-16"), t("14:00"), t("15:00"))
            .unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.get("16-06-2025").unwrap(),
            &vec![
                "09:00am-09:30am",
                "09:30am-10:00am",
                "02:00pm-02:30pm",
                "02:30pm-03:00pm"
            ]
        );
    }

    #[test]
    fn test_cross_timezone_intersection() {
        let conn = setup_db();
        // Alice's 09:00-17:00 in New York is 13:00-21:00 UTC on 2025-06-16.
        let a = queries::create_user(&conn, "Alice", "America/New_York").unwrap();
        let b = queries::create_user(&conn, "Bob", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("17:00")).unwrap();
        queries::create_weekly_rule(&conn, b.id, Weekday::Mon, t("13:00"), t("15:00")).unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id, b.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.get("16-06-2025").unwrap(),
            &vec![
                "01:00pm-01:30pm",
                "01:30pm-02:00pm",
                "02:00pm-02:30pm",
                "02:30pm-03:00pm"
            ]
        );
    }

    #[test]
    fn test_self_overlapping_rules_keep_duplicate_slots() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        let b = queries::create_user(&conn, "Bob", "UTC").unwrap();
        // Alice has the same window twice; the pairwise intersection emits it
        // once per pair and the duplicates survive into the slot list.
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();
        queries::create_weekly_rule(&conn, b.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id, b.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.get("16-06-2025").unwrap(),
            &vec![
                "09:00am-09:30am",
                "09:30am-10:00am",
                "09:00am-09:30am",
                "09:30am-10:00am"
            ]
        );
    }

    #[test]
    fn test_multi_day_range_is_sparse() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();

        let store = SqliteStore::new(&conn);
        let q = AvailabilityQuery {
            user_ids: vec![a.id],
            start_date: date("2025-06-16"),
            end_date: date("2025-06-18"),
            timezone: "UTC".to_string(),
        };
        let result = common_availability(&store, &q, &EngineOptions::default()).unwrap();

        // Only Monday has rules; Tuesday and Wednesday are absent, not empty.
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("16-06-2025"));
    }

    #[test]
    fn test_unknown_user_rejected_up_front() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();

        let store = SqliteStore::new(&conn);
        let err = common_availability(
            &store,
            &query(&[a.id, 999], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::UserNotFound(ids) if ids == vec![999]));
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();

        let store = SqliteStore::new(&conn);
        let q = AvailabilityQuery {
            user_ids: vec![a.id],
            start_date: date("2025-06-18"),
            end_date: date("2025-06-16"),
            timezone: "UTC".to_string(),
        };
        let err = common_availability(&store, &q, &EngineOptions::default()).unwrap_err();

        assert!(matches!(err, AppError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_bad_target_timezone_rejected() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();

        let store = SqliteStore::new(&conn);
        let err = common_availability(
            &store,
            &query(&[a.id], "2025-06-16", "Not/AZone"),
            &EngineOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidTimezone(_)));
    }

    #[test]
    fn test_bad_home_timezone_rejected() {
        let conn = setup_db();
        // Bypass API validation: write a corrupt zone straight to the row.
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        conn.execute("UPDATE users SET timezone = 'Nowhere/Land' WHERE id = ?1", [a.id])
            .unwrap();
        queries::create_weekly_rule(&conn, a.id, Weekday::Mon, t("09:00"), t("10:00")).unwrap();

        let store = SqliteStore::new(&conn);
        let err = common_availability(
            &store,
            &query(&[a.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidTimezone(_)));
    }

    #[test]
    fn test_malformed_rule_passes_through_as_degenerate() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();
        // end before start: upstream data-integrity problem, not a crash
        conn.execute(
            "INSERT INTO weekly_availability (user_id, day_of_week, start_time, end_time)
             VALUES (?1, 'mon', '12:00', '09:00')",
            [a.id],
        )
        .unwrap();

        let store = SqliteStore::new(&conn);
        let result = common_availability(
            &store,
            &query(&[a.id], "2025-06-16", "UTC"),
            &EngineOptions::default(),
        )
        .unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_resolver_has_no_candidates_without_rules() {
        let conn = setup_db();
        let a = queries::create_user(&conn, "Alice", "UTC").unwrap();

        let store = SqliteStore::new(&conn);
        let target = time::parse_zone("UTC").unwrap();
        let free =
            resolve_user_day(&store, &a, date("2025-06-16"), target, ConflictPolicy::Drop).unwrap();
        assert!(free.is_empty());
    }
}
