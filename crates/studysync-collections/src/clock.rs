//! Wall-clock access in the viewer's local timezone

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use parking_lot::Mutex;

/// Source of "now"
pub trait Clock: Send + Sync + 'static {
    /// Local date and time
    fn now(&self) -> NaiveDateTime;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    /// Local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Local calendar date as `YYYY-MM-DD`
    fn today_key(&self) -> String {
        date_key(self.today())
    }

    /// Local hour of day, 0..24
    fn hour(&self) -> u32 {
        self.now().hour()
    }

    /// Today's index in the Monday = 0 .. Sunday = 6 week
    fn weekday_index(&self) -> u8 {
        monday_index(self.today())
    }
}

/// `YYYY-MM-DD` for a date
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Map a date onto Monday = 0 .. Sunday = 6
///
/// The platform convention counts Sunday as 0; Sunday becomes 6 and every
/// other day shifts down by one.
#[must_use]
pub fn monday_index(date: NaiveDate) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let from_sunday = date.weekday().num_days_from_sunday() as u8;
    if from_sunday == 0 {
        6
    } else {
        from_sunday - 1
    }
}

/// The host clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Clock frozen at `now`
    #[must_use]
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move to `now`
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    /// Advance by `delta`
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }

    fn now_millis(&self) -> i64 {
        self.now.lock().and_utc().timestamp_millis()
    }
}
