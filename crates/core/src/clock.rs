use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day at the business location.
    fn today_in(&self, zone: Tz) -> NaiveDate {
        self.now().with_timezone(&zone).date_naive()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and the call simulator.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    pub fn advance(&self, by: Duration) {
        match self.now.lock() {
            Ok(mut now) => *now += by,
            Err(poisoned) => *poisoned.into_inner() += by,
        }
    }

    pub fn set(&self, value: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut now) => *now = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{Clock, ManualClock};

    #[test]
    fn manual_clock_advances_and_reports_local_day() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap());

        // 03:00 UTC is still the previous evening in Chicago.
        assert_eq!(
            clock.today_in(chrono_tz::America::Chicago),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        );

        clock.advance(Duration::hours(6));
        assert_eq!(
            clock.today_in(chrono_tz::America::Chicago),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }
}
