//! Core traits for state machines.

use crate::{Action, InvariantViolation};
use edflow_types::{Service, SimTime, Ward};

/// Source of random variates.
///
/// Every random decision in a replication goes through this trait, so the
/// same source state always yields the same sequence of draws.
pub trait VariateSource {
    /// Time until the next patient arrives.
    fn next_inter_arrival(&mut self) -> f64;

    /// Duration of one service step.
    fn next_service_time(&mut self, service: Service) -> f64;

    /// Ward chosen at triage.
    fn next_triage_outcome(&mut self) -> Ward;
}

/// A state machine that processes inputs.
///
/// - **Synchronous**: No async, no `.await`
/// - **Deterministic**: Same state + input + variates = same actions
/// - **Pure-ish**: Mutates self, but never touches the clock, queue or pools
///
/// # Example
///
/// ```ignore
/// patient.set_time(now);
/// let actions = patient.handle(PatientInput::Arrived, &mut streams)?;
/// for action in actions {
///     runner.execute(patient.id(), action)?;
/// }
/// ```
pub trait StateMachine {
    /// Input type accepted by [`StateMachine::handle`].
    type Input;

    /// Process an input, returning actions for the runner to execute.
    ///
    /// Returns an error when the input is not valid in the current state.
    fn handle(
        &mut self,
        input: Self::Input,
        variates: &mut dyn VariateSource,
    ) -> Result<Vec<Action>, InvariantViolation>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call.
    fn set_time(&mut self, now: SimTime);

    /// Get the time last set via `set_time()`.
    fn now(&self) -> SimTime;
}
