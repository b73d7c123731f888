//! Wall-clock source.
//!
//! Handlers read the current instant through [`Clock`] so formatting can be
//! tested against a fixed point in time.

use chrono::{DateTime, Utc};

/// Port for getting the current time.
pub trait Clock: Send + Sync {
    /// Get the current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock using the OS time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(timestamp: i64, micros: u32) -> Self {
        Self {
            instant: DateTime::from_timestamp(timestamp, micros * 1_000)
                .expect("timestamp out of range"),
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_current() {
        let before = Utc::now();
        let now = SystemClock::new().now();
        assert!(now >= before);
        assert!((now - before).num_seconds() < 1);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(1_700_000_000, 250);
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
        assert_eq!(clock.now().timestamp_subsec_micros(), 250);
    }
}
