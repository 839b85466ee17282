//! Time source abstraction

use chrono::{DateTime, NaiveDate, Utc};

/// Wall-clock time, injectable so lifecycle and quota rules can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
