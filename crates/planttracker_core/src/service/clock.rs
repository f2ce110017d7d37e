//! Time sources for timestamps and "today" comparisons.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Supplies the current instant and calendar day.
pub trait Clock {
    fn now(&self) -> Timestamp;

    /// Calendar day used for status and countdown derivation.
    fn today(&self) -> Date {
        self.now().to_zoned(TimeZone::UTC).date()
    }
}

/// Wall clock; `today` follows the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn today(&self) -> Date {
        Timestamp::now().to_zoned(TimeZone::system()).date()
    }
}

/// Frozen clock for deterministic callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: Timestamp,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now }
    }

    /// Noon UTC on `day`, so `today()` is `day`.
    pub fn on(day: Date) -> Self {
        let now = day
            .at(12, 0, 0, 0)
            .to_zoned(TimeZone::UTC)
            .map(|zoned| zoned.timestamp())
            .unwrap_or(Timestamp::UNIX_EPOCH);
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn today(&self) -> Date {
        (**self).today()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use jiff::civil::date;

    #[test]
    fn fixed_clock_today_matches_requested_day() {
        let clock = FixedClock::on(date(2024, 5, 1));
        assert_eq!(clock.today(), date(2024, 5, 1));
    }
}
