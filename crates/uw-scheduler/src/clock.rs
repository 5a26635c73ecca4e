use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Minutes in one story day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// The game clock: whole minutes since midnight of day 0.
///
/// Only the scheduler advances it, and never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameClock {
    minute: i64,
}

impl GameClock {
    /// A clock reading `minute`.
    pub fn new(minute: i64) -> Self {
        Self { minute }
    }

    /// Current minute.
    pub fn now(&self) -> i64 {
        self.minute
    }

    /// Move forward to `minute`. Earlier values are ignored.
    pub fn advance_to(&mut self, minute: i64) {
        self.minute = self.minute.max(minute);
    }

    /// Day number, starting at 0.
    pub fn day(&self) -> i64 {
        self.minute.div_euclid(MINUTES_PER_DAY)
    }

    /// Time of day.
    pub fn time_of_day(&self) -> NaiveTime {
        time_of_day(self.minute)
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minute(self.minute))
    }
}

/// Wall time for an absolute minute, wrapping at midnight.
pub fn time_of_day(minute: i64) -> NaiveTime {
    let of_day = minute.rem_euclid(MINUTES_PER_DAY);
    let secs = u32::try_from(of_day * 60).unwrap_or(0);
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}

/// Format an absolute minute as "9:05 AM".
pub fn format_minute(minute: i64) -> String {
    time_of_day(minute).format("%-I:%M %p").to_string()
}

/// Format a span of minutes as "2 hours and 5 minutes".
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    match (hours, rest) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} and {}", plural(h, "hour"), plural(m, "minute")),
    }
}
