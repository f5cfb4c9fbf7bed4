use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::services::time::TimeInterval;

/// Lazy tiling of a free window into fixed-duration bookable slots.
///
/// Slots advance from the window start in `step` increments; a trailing
/// remainder shorter than `step` is discarded. Cloning before iteration
/// restarts the sequence from the window start.
#[derive(Debug, Clone)]
pub struct Slots {
    cursor: DateTime<Tz>,
    end: DateTime<Tz>,
    step: Duration,
}

pub fn slots(window: &TimeInterval, minutes: i64) -> Slots {
    Slots {
        cursor: window.start.clone(),
        end: window.end.clone(),
        // a non-positive step would never terminate
        step: Duration::minutes(minutes.max(1)),
    }
}

impl Iterator for Slots {
    type Item = TimeInterval;

    fn next(&mut self) -> Option<TimeInterval> {
        let slot_end = self.cursor.clone() + self.step;
        if slot_end > self.end {
            return None;
        }
        let slot = TimeInterval::new(self.cursor.clone(), slot_end.clone());
        self.cursor = slot_end;
        Some(slot)
    }
}

/// Render a slot as "09:00am-09:30am": lowercase 12-hour clock, no separator
/// before the am/pm marker, hyphen between start and end.
pub fn label(slot: &TimeInterval) -> String {
    format!(
        "{}-{}",
        slot.start.format("%I:%M%P"),
        slot.end.format("%I:%M%P")
    )
}
