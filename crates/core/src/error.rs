//! Error types for the simulation core.

use edflow_types::{ConfigError, PatientId, Service, SimTime};
use thiserror::Error;

/// Internal consistency failures.
///
/// Any of these means the simulation state is corrupt. The replication that
/// hit it is abandoned; it is never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    /// An event would run before the current clock.
    #[error("Event at {event} precedes current clock {now}")]
    EventInPast { now: SimTime, event: SimTime },

    /// A pool was released while no unit was busy.
    #[error("Release of {service} pool with zero busy units at {now}")]
    ReleaseWithoutBusy { service: Service, now: SimTime },

    /// A patient received an input its current state cannot accept.
    #[error("{patient} cannot handle {input} while {state}")]
    InvalidTransition {
        patient: PatientId,
        state: String,
        input: String,
    },

    /// An event or grant targeted a patient that is not in the department.
    #[error("Unknown {0}")]
    UnknownPatient(PatientId),
}

/// Errors surfaced at the replication boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal logic defect.
    #[error("Scheduling invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}
