//! Core abstractions for the patient-flow simulation.
//!
//! Patient processes are synchronous state machines: the runner feeds them
//! [`PatientInput`]s and executes the [`Action`]s they return. Nothing in this
//! crate touches the clock, the event queue or the staff pools directly.

mod action;
mod error;
mod event;
mod traits;

pub use action::Action;
pub use error::{InvariantViolation, SimulationError};
pub use event::{ArrivalSource, Event, EventKind, PatientInput};
pub use traits::{StateMachine, VariateSource};
