//! Calendar clock
//!
//! The only place the service reads wall-clock time for calendar dates.
//! Everything downstream receives "today" as a plain `NaiveDate`.

use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Source of "today" in a fixed time zone
#[derive(Debug, Clone)]
pub struct Clock {
    offset: FixedOffset,
    pinned: Option<NaiveDate>,
}

impl Clock {
    /// Clock for a zone `utc_offset_minutes` east of UTC.
    ///
    /// Offsets outside +-24h fall back to UTC.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let seconds = utc_offset_minutes.saturating_mul(60);
        let offset = FixedOffset::east_opt(seconds).unwrap_or_else(|| {
            tracing::warn!(utc_offset_minutes, "Invalid UTC offset, using UTC");
            Utc.fix()
        });
        Self {
            offset,
            pinned: None,
        }
    }

    /// Clock that always reports `today` (for tests and replays)
    pub fn fixed(today: NaiveDate) -> Self {
        Self {
            offset: Utc.fix(),
            pinned: Some(today),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current local time
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Current calendar date in this zone
    pub fn today(&self) -> NaiveDate {
        self.pinned.unwrap_or_else(|| self.now().date_naive())
    }

    /// Delay from `now` until the next local `hour:minute`
    pub fn until_next(&self, now: DateTime<FixedOffset>, hour: u32, minute: u32) -> Duration {
        let Some(at) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            return Duration::from_secs(24 * 60 * 60);
        };

        let today = now.date_naive();
        let mut target = self.offset.from_local_datetime(&today.and_time(at)).single();
        if target.map_or(true, |t| t <= now) {
            target = today
                .checked_add_days(Days::new(1))
                .and_then(|d| self.offset.from_local_datetime(&d.and_time(at)).single());
        }

        target
            .and_then(|t| (t - now).to_std().ok())
            .unwrap_or(Duration::from_secs(24 * 60 * 60))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0)
    }
}
