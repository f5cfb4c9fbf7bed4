use chrono::{NaiveDate, NaiveTime, Weekday};

/// Recurring availability bound to a day of week, every week.
#[derive(Debug, Clone)]
pub struct WeeklyRule {
    pub id: i64,
    pub user_id: i64,
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Availability bound to one specific calendar date. Overrides add to the
/// weekly rules for that date, they do not replace them.
#[derive(Debug, Clone)]
pub struct DateOverride {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}
