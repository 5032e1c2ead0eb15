//! Current-instant providers.
//!
//! Resolution of `today` reads the clock through the [`Clock`] trait, so tests
//! and reproducible CLI runs can pin "now" with a [`FixedClock`].

use chrono::{Local, NaiveDateTime};

/// Source of the current instant (local wall-clock time).
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The operating system clock, read in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
