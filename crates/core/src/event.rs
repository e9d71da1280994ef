//! Scheduled events and the inputs they become.

use edflow_types::{PatientId, Service};
use std::fmt;

/// How an arrival entered the event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrivalSource {
    /// Drawn from the arrival process; dispatching it schedules the next one.
    Generated,
    /// Injected by the caller at a fixed time; does not chain.
    Scripted,
}

/// Kind of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A patient walks in.
    Arrival(ArrivalSource),
    /// Registration finished.
    ReceptionDone,
    /// Triage finished.
    TriageDone,
    /// ED or ACU consultation finished.
    TreatmentDone,
}

impl EventKind {
    /// The completion event for a service step.
    pub fn completion_of(service: Service) -> Self {
        match service {
            Service::Registration => EventKind::ReceptionDone,
            Service::Triage => EventKind::TriageDone,
            Service::Ed | Service::Acu => EventKind::TreatmentDone,
        }
    }

    /// Get a human-readable name for this event kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::Arrival(_) => "Arrival",
            EventKind::ReceptionDone => "ReceptionDone",
            EventKind::TriageDone => "TriageDone",
            EventKind::TreatmentDone => "TreatmentDone",
        }
    }
}

/// A pending event. Its time lives in the queue key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub patient: PatientId,
}

impl Event {
    pub fn new(kind: EventKind, patient: PatientId) -> Self {
        Self { kind, patient }
    }
}

/// Input delivered to a patient's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientInput {
    /// The patient walked in.
    Arrived,
    /// A unit of the given pool was handed to the patient.
    Acquired(Service),
    /// Registration finished.
    ReceptionDone,
    /// Triage finished.
    TriageDone,
    /// Consultation finished.
    TreatmentDone,
}

impl From<EventKind> for PatientInput {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Arrival(_) => PatientInput::Arrived,
            EventKind::ReceptionDone => PatientInput::ReceptionDone,
            EventKind::TriageDone => PatientInput::TriageDone,
            EventKind::TreatmentDone => PatientInput::TreatmentDone,
        }
    }
}

impl fmt::Display for PatientInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientInput::Arrived => f.write_str("Arrived"),
            PatientInput::Acquired(service) => write!(f, "Acquired({service})"),
            PatientInput::ReceptionDone => f.write_str("ReceptionDone"),
            PatientInput::TriageDone => f.write_str("TriageDone"),
            PatientInput::TreatmentDone => f.write_str("TreatmentDone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_events() {
        assert_eq!(
            EventKind::completion_of(Service::Registration),
            EventKind::ReceptionDone
        );
        assert_eq!(
            EventKind::completion_of(Service::Triage),
            EventKind::TriageDone
        );
        assert_eq!(
            EventKind::completion_of(Service::Acu),
            EventKind::TreatmentDone
        );
    }

    #[test]
    fn test_event_kind_to_input() {
        assert_eq!(
            PatientInput::from(EventKind::Arrival(ArrivalSource::Scripted)),
            PatientInput::Arrived
        );
        assert_eq!(
            PatientInput::from(EventKind::TreatmentDone),
            PatientInput::TreatmentDone
        );
    }
}
