//! Weekly time slot model.
//!
//! A slot is a fixed one-hour staffing window identified by day and start
//! hour. Slot identity is stable across the whole pipeline: the `Display`
//! form (`"Monday 9 AM - 10 AM"`) is the label that ingestion derives from
//! spreadsheet headers and that report writers consume.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Day of the week, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All seven days, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// English day name.
    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A one-hour weekly staffing window.
///
/// Uniquely identified by day and start hour (0-23). Ordering is canonical
/// (day, then hour) and is the deterministic iteration order used by the
/// schedulers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Slot {
    /// Day of the week.
    pub day: Weekday,
    /// Start hour, 24-hour clock (0-23). The window ends one hour later.
    pub start_hour: u8,
}

impl Slot {
    /// Creates a slot at the given day and start hour.
    pub fn new(day: Weekday, start_hour: u8) -> Self {
        Self { day, start_hour }
    }

    /// Generates the hourly slots of one day over a half-open hour range.
    ///
    /// `Slot::block(Weekday::Monday, 9..12)` yields the 9-10, 10-11 and
    /// 11-12 windows.
    pub fn block(day: Weekday, hours: Range<u8>) -> Vec<Slot> {
        hours.map(|h| Slot::new(day, h)).collect()
    }

    /// End hour of the window (start + 1, 24-hour clock).
    #[inline]
    pub fn end_hour(&self) -> u8 {
        self.start_hour + 1
    }
}

/// Formats an hour on the 12-hour clock ("9 AM", "12 PM", "8 PM").
fn fmt_hour(hour: u8) -> String {
    match hour {
        0 | 24 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h if h < 12 => format!("{h} AM"),
        h => format!("{} PM", h - 12),
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}",
            self.day,
            fmt_hour(self.start_hour),
            fmt_hour(self.end_hour())
        )
    }
}
