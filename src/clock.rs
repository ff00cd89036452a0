//! Injectable time source
//!
//! Loan status depends on "now". Services read it from a [`Clock`] instead of
//! calling `Utc::now()` directly so that status derivation stays deterministic
//! under test.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
