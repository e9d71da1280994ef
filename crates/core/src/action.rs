//! Actions emitted by patient state machines.

use crate::EventKind;
use edflow_types::{Observation, Service};

/// Work the runner performs on behalf of a patient.
///
/// Actions are executed in the order they are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Ask the pool behind `service` for a unit.
    Request(Service),

    /// Give a unit back to the pool behind `service`.
    Release(Service),

    /// Schedule an event for this patient `delay` minutes from now.
    Schedule { delay: f64, kind: EventKind },

    /// The patient left the department.
    Depart(Observation),
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Request(_) => "Request",
            Action::Release(_) => "Release",
            Action::Schedule { .. } => "Schedule",
            Action::Depart(_) => "Depart",
        }
    }
}
