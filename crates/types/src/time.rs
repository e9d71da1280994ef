//! Simulated clock values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A point on the simulated clock, in minutes since the replication started.
///
/// Values are finite and non-negative; they come from the validated
/// configuration and from exponential variates, which satisfy both. Unlike
/// `f64`, `SimTime` is totally ordered so it can key the event queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(f64);

impl SimTime {
    /// Start of every replication.
    pub const ZERO: Self = SimTime(0.0);

    /// Create from a number of simulated minutes.
    pub fn from_minutes(minutes: f64) -> Self {
        debug_assert!(
            minutes.is_finite() && minutes >= 0.0,
            "simulated time must be finite and non-negative, got {minutes}"
        );
        SimTime(minutes)
    }

    /// Get the raw number of minutes.
    pub fn as_minutes(self) -> f64 {
        self.0
    }

    /// Minutes elapsed from `earlier` to `self`.
    ///
    /// Negative when `earlier` is actually later.
    pub fn minutes_since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    fn add(self, minutes: f64) -> SimTime {
        SimTime::from_minutes(self.0 + minutes)
    }
}

impl Sub for SimTime {
    type Output = f64;

    fn sub(self, rhs: SimTime) -> f64 {
        self.minutes_since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}", self.0)
    }
}
