use chrono::{NaiveDate, NaiveTime};

/// A busy interval that subtracts from a user's availability on one date.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}
