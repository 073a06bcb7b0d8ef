use chrono::{Local, NaiveDateTime, SubsecRound};

/// Source of "now" for everything that reasons about days and durations.
///
/// Instants are wall-clock times of the venue, truncated to milliseconds so
/// that what is stored is exactly what elapsed times are computed from.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(3)
    }
}
