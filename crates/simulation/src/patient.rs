//! Per-patient state machine.
//!
//! A patient walks through registration, triage and one treatment ward:
//!
//! ```text
//! Arrived → WaitingReception → InReception → WaitingTriage → InTriage
//!         → WaitingTreatment(ward) → InTreatment(ward) → Departed
//! ```
//!
//! The ward is drawn when the triage nurse is acquired and never changes
//! afterwards. Every step records entry (joined the queue), start (acquired a
//! unit) and exit (released it).

use edflow_core::{Action, EventKind, InvariantViolation, PatientInput, StateMachine, VariateSource};
use edflow_types::{
    IncompleteJourney, Observation, PartialStage, PatientId, Service, SimTime, StageTimes, Ward,
};

/// Where a patient is in the department.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientState {
    Arrived,
    WaitingReception,
    InReception,
    WaitingTriage,
    /// Ward already chosen, applied once triage finishes.
    InTriage(Ward),
    WaitingTreatment(Ward),
    InTreatment(Ward),
    Departed,
}

/// Step indices into [`PatientProcess::stages`].
const RECEPTION: usize = 0;
const TRIAGE: usize = 1;
const TREATMENT: usize = 2;

/// One patient's journey.
#[derive(Debug, Clone)]
pub struct PatientProcess {
    id: PatientId,
    arrival_time: SimTime,
    now: SimTime,
    state: PatientState,
    ward: Option<Ward>,
    stages: [Option<PartialStage>; 3],
}

impl PatientProcess {
    /// A patient walking in at `arrival_time`.
    pub fn new(id: PatientId, arrival_time: SimTime) -> Self {
        Self {
            id,
            arrival_time,
            now: arrival_time,
            state: PatientState::Arrived,
            ward: None,
            stages: [None; 3],
        }
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    pub fn state(&self) -> PatientState {
        self.state
    }

    /// Ward chosen at triage, once drawn.
    pub fn ward(&self) -> Option<Ward> {
        self.ward
    }

    pub fn is_departed(&self) -> bool {
        self.state == PatientState::Departed
    }

    /// The steps reached so far, for a patient cut off by the horizon.
    pub fn into_incomplete(self) -> IncompleteJourney {
        IncompleteJourney {
            patient: self.id,
            arrival_time: self.arrival_time,
            ward: self.ward,
            stages: self.stages.into_iter().flatten().collect(),
        }
    }

    fn enter(&mut self, step: usize, service: Service) {
        self.stages[step] = Some(PartialStage {
            service,
            entry: self.now,
            start: None,
            exit: None,
        });
    }

    fn start(&mut self, step: usize) {
        if let Some(stage) = self.stages[step].as_mut() {
            stage.start = Some(self.now);
        }
    }

    /// Start `step` and schedule its completion after a fresh service time.
    fn begin_service(
        &mut self,
        step: usize,
        service: Service,
        variates: &mut dyn VariateSource,
    ) -> Action {
        self.start(step);
        Action::Schedule {
            delay: variates.next_service_time(service),
            kind: EventKind::completion_of(service),
        }
    }

    fn exit(&mut self, step: usize) {
        if let Some(stage) = self.stages[step].as_mut() {
            stage.exit = Some(self.now);
        }
    }

    fn completed(&self, step: usize) -> Result<StageTimes, InvariantViolation> {
        match self.stages[step] {
            Some(PartialStage {
                entry,
                start: Some(start),
                exit: Some(exit),
                ..
            }) => Ok(StageTimes { entry, start, exit }),
            _ => Err(self.invalid("Depart")),
        }
    }

    fn invalid(&self, input: impl ToString) -> InvariantViolation {
        InvariantViolation::InvalidTransition {
            patient: self.id,
            state: format!("{:?}", self.state),
            input: input.to_string(),
        }
    }

    fn depart(&mut self, ward: Ward) -> Result<Observation, InvariantViolation> {
        Ok(Observation::new(
            self.id,
            ward,
            self.arrival_time,
            self.completed(RECEPTION)?,
            self.completed(TRIAGE)?,
            self.completed(TREATMENT)?,
        ))
    }
}

impl StateMachine for PatientProcess {
    type Input = PatientInput;

    fn handle(
        &mut self,
        input: PatientInput,
        variates: &mut dyn VariateSource,
    ) -> Result<Vec<Action>, InvariantViolation> {
        let actions = match (self.state, input) {
            (PatientState::Arrived, PatientInput::Arrived) => {
                self.enter(RECEPTION, Service::Registration);
                self.state = PatientState::WaitingReception;
                vec![Action::Request(Service::Registration)]
            }

            (PatientState::WaitingReception, PatientInput::Acquired(Service::Registration)) => {
                self.state = PatientState::InReception;
                vec![self.begin_service(RECEPTION, Service::Registration, variates)]
            }

            (PatientState::InReception, PatientInput::ReceptionDone) => {
                self.exit(RECEPTION);
                self.enter(TRIAGE, Service::Triage);
                self.state = PatientState::WaitingTriage;
                vec![
                    Action::Release(Service::Registration),
                    Action::Request(Service::Triage),
                ]
            }

            (PatientState::WaitingTriage, PatientInput::Acquired(Service::Triage)) => {
                let schedule = self.begin_service(TRIAGE, Service::Triage, variates);
                let ward = variates.next_triage_outcome();
                self.ward = Some(ward);
                self.state = PatientState::InTriage(ward);
                vec![schedule]
            }

            (PatientState::InTriage(ward), PatientInput::TriageDone) => {
                self.exit(TRIAGE);
                self.enter(TREATMENT, ward.service());
                self.state = PatientState::WaitingTreatment(ward);
                vec![
                    Action::Release(Service::Triage),
                    Action::Request(ward.service()),
                ]
            }

            (PatientState::WaitingTreatment(ward), PatientInput::Acquired(service))
                if service == ward.service() =>
            {
                self.state = PatientState::InTreatment(ward);
                vec![self.begin_service(TREATMENT, service, variates)]
            }

            (PatientState::InTreatment(ward), PatientInput::TreatmentDone) => {
                self.exit(TREATMENT);
                let observation = self.depart(ward)?;
                self.state = PatientState::Departed;
                vec![
                    Action::Release(ward.service()),
                    Action::Depart(observation),
                ]
            }

            (_, input) => return Err(self.invalid(input)),
        };

        Ok(actions)
    }

    fn set_time(&mut self, now: SimTime) {
        self.now = now;
    }

    fn now(&self) -> SimTime {
        self.now
    }
}
