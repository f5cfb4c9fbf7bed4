use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::errors::AppError;

/// A closed-open span of zone-aware instants. `end <= start` is a degenerate
/// interval: it never overlaps anything and quantizes to zero slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn in_zone(&self, tz: Tz) -> TimeInterval {
        TimeInterval::new(self.start.with_timezone(&tz), self.end.with_timezone(&tz))
    }
}

pub fn parse_zone(name: &str) -> Result<Tz, AppError> {
    name.parse()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}

/// Pin a wall-clock datetime to a zone. Ambiguous local times (clock
/// fall-back) take the earlier offset; times inside a spring-forward gap
/// shift ahead to the next time that exists on the local clock.
pub fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = local;
    for _ in 0..26 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earlier, _) => return earlier,
            LocalResult::None => candidate += Duration::minutes(30),
        }
    }
    // Unreachable for any tzdb gap short of a dateline jump.
    tz.from_utc_datetime(&local)
}

/// Build the interval for a schedule row: wall-clock `start..end` on `date`
/// in the `from` zone, expressed in the `to` zone.
pub fn zoned_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    from: Tz,
    to: Tz,
) -> TimeInterval {
    TimeInterval::new(
        localize(from, date.and_time(start)).with_timezone(&to),
        localize(from, date.and_time(end)).with_timezone(&to),
    )
}
