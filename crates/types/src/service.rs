//! Services offered by the department and the wards patients are routed to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Treatment ward, decided at triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ward {
    /// Emergency Department.
    Ed,
    /// Acute Care Unit.
    Acu,
}

impl Ward {
    /// The doctor service that treats this ward.
    pub fn service(self) -> Service {
        match self {
            Ward::Ed => Service::Ed,
            Ward::Acu => Service::Acu,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Ward::Ed => "ed",
            Ward::Acu => "acu",
        }
    }
}

impl fmt::Display for Ward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A service step, each backed by its own staff pool.
///
/// The order of [`Service::ALL`] is the order patients move through the
/// department; the two treatment services are alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Registration at reception (receptionists).
    Registration,
    /// Triage (nurses).
    Triage,
    /// ED consultation (ED doctors).
    Ed,
    /// ACU consultation (ACU doctors).
    Acu,
}

impl Service {
    /// All services, in pool index order.
    pub const ALL: [Service; 4] = [
        Service::Registration,
        Service::Triage,
        Service::Ed,
        Service::Acu,
    ];

    /// Dense index, usable for per-service arrays.
    pub fn index(self) -> usize {
        match self {
            Service::Registration => 0,
            Service::Triage => 1,
            Service::Ed => 2,
            Service::Acu => 3,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Service::Registration => "registration",
            Service::Triage => "triage",
            Service::Ed => "ed",
            Service::Acu => "acu",
        }
    }

    /// The ward this service treats, if it is a treatment service.
    pub fn ward(self) -> Option<Ward> {
        match self {
            Service::Ed => Some(Ward::Ed),
            Service::Acu => Some(Ward::Acu),
            Service::Registration | Service::Triage => None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
