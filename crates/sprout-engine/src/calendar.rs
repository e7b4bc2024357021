//! Clock and calendar abstraction.
//!
//! Pool dates are plain local calendar dates, so every component must
//! agree on what "today" means. This trait is the single source of
//! that answer; the daemon injects a [`LocalCalendar`] with its
//! configured UTC offset, tests inject a [`FixedCalendar`].

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

const DAY_SECS: i64 = 86_400;

/// A clock plus the fixed offset that turns it into local dates.
pub trait Calendar {
    /// Current Unix time in seconds.
    fn now(&self) -> i64;

    /// Offset applied when deriving local dates.
    fn offset(&self) -> FixedOffset;

    /// Today's local calendar date.
    fn today(&self) -> NaiveDate {
        let local = self.now() + i64::from(self.offset().local_minus_utc());
        NaiveDate::default() + Duration::days(local.div_euclid(DAY_SECS))
    }

    /// The Sunday starting the current week. Weekly pool dates key on
    /// this.
    fn week_start(&self) -> NaiveDate {
        let today = self.today();
        today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
    }

    /// Unix time of local midnight starting `date`.
    fn midnight(&self, date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
            - i64::from(self.offset().local_minus_utc())
    }

    /// End of the current local day.
    fn day_end(&self) -> i64 {
        self.midnight(self.today() + Duration::days(1))
    }

    /// End of the current 7-day week window.
    fn week_end(&self) -> i64 {
        self.midnight(self.week_start() + Duration::days(7))
    }
}

/// The real clock with a configurable UTC offset.
#[derive(Clone, Copy, Debug)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    /// Build from a whole-hour UTC offset. Out-of-range offsets fall
    /// back to UTC.
    pub fn new(utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Calendar for LocalCalendar {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// A pinned clock for tests: noon UTC on a chosen date.
#[derive(Clone, Copy, Debug)]
pub struct FixedCalendar {
    now: i64,
}

impl FixedCalendar {
    pub fn at(date: NaiveDate) -> Self {
        Self {
            now: date.and_time(NaiveTime::MIN).and_utc().timestamp() + DAY_SECS / 2,
        }
    }

    pub fn set(&mut self, date: NaiveDate) {
        *self = Self::at(date);
    }

    pub fn advance_days(&mut self, days: i64) {
        self.now += days * DAY_SECS;
    }
}

impl Calendar for FixedCalendar {
    fn now(&self) -> i64 {
        self.now
    }

    fn offset(&self) -> FixedOffset {
        Utc.fix()
    }
}
