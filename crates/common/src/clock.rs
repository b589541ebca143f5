//! Wall-clock access for job timestamps.
//!
//! Two things in a render job depend on "now": the date-token fallback when
//! a texture path carries no date segment, and the timestamp embedded in
//! the artifact file name. Both read time through [`Clock`] so tests can
//! pin it.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// `YYYYMMDD`, the format of a date token.
pub const DATE_TOKEN_FORMAT: &str = "%Y%m%d";

/// `YYYYMMDD_HHMMSS`, the format of an artifact timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Source of local wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Today's date as an 8-digit token.
    fn date_token(&self) -> String {
        self.now().format(DATE_TOKEN_FORMAT).to_string()
    }

    /// Current time as `YYYYMMDD_HHMMSS`.
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a fixed instant (for tests and replays).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }

    /// Build from calendar components. Returns `None` for an invalid date/time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, min, sec))
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }
}

/// A clock shifted by a whole number of seconds from another clock.
///
/// Used when an artifact name collides and the next free second is tried.
#[derive(Debug)]
pub struct OffsetClock<'a> {
    inner: &'a dyn Clock,
    offset_secs: i64,
}

impl<'a> OffsetClock<'a> {
    pub fn new(inner: &'a dyn Clock, offset_secs: i64) -> Self {
        Self { inner, offset_secs }
    }
}

impl Clock for OffsetClock<'_> {
    fn now(&self) -> NaiveDateTime {
        self.inner.now() + chrono::Duration::seconds(self.offset_secs)
    }
}

/// Whether `token` is exactly eight ASCII digits.
pub fn is_date_token(token: &str) -> bool {
    token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit())
}
