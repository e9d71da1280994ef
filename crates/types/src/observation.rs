//! Records produced by a replication.

use crate::{PatientId, Service, SimTime, Ward};
use serde::{Deserialize, Serialize};

/// Timestamps of one completed service step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTimes {
    /// Joined the wait queue.
    pub entry: SimTime,
    /// Acquired a staff unit.
    pub start: SimTime,
    /// Released the staff unit.
    pub exit: SimTime,
}

impl StageTimes {
    /// Time spent queueing for the step.
    pub fn wait(&self) -> f64 {
        self.start - self.entry
    }

    /// Time spent being served.
    pub fn service(&self) -> f64 {
        self.exit - self.start
    }
}

/// A departed patient's journey.
///
/// Created once when the patient leaves treatment; never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub patient: PatientId,
    pub ward: Ward,
    pub arrival_time: SimTime,
    pub departure_time: SimTime,
    pub wait_reception: f64,
    pub wait_triage: f64,
    pub wait_treatment: f64,
    pub reception: StageTimes,
    pub triage: StageTimes,
    pub treatment: StageTimes,
}

impl Observation {
    /// Build the record from the three completed stages.
    pub fn new(
        patient: PatientId,
        ward: Ward,
        arrival_time: SimTime,
        reception: StageTimes,
        triage: StageTimes,
        treatment: StageTimes,
    ) -> Self {
        Self {
            patient,
            ward,
            arrival_time,
            departure_time: treatment.exit,
            wait_reception: reception.wait(),
            wait_triage: triage.wait(),
            wait_treatment: treatment.wait(),
            reception,
            triage,
            treatment,
        }
    }

    /// Total time from arrival to departure.
    pub fn time_in_system(&self) -> f64 {
        self.departure_time - self.arrival_time
    }

    /// Wait for the ED doctor, if routed to ED.
    pub fn wait_ed(&self) -> Option<f64> {
        (self.ward == Ward::Ed).then_some(self.wait_treatment)
    }

    /// Wait for the ACU doctor, if routed to ACU.
    pub fn wait_acu(&self) -> Option<f64> {
        (self.ward == Ward::Acu).then_some(self.wait_treatment)
    }

    /// Timestamps of the step served by `service`, if the patient used it.
    pub fn stage(&self, service: Service) -> Option<&StageTimes> {
        match service {
            Service::Registration => Some(&self.reception),
            Service::Triage => Some(&self.triage),
            Service::Ed | Service::Acu if service.ward() == Some(self.ward) => {
                Some(&self.treatment)
            }
            Service::Ed | Service::Acu => None,
        }
    }
}

/// A step reached by a patient who did not depart before the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialStage {
    pub service: Service,
    pub entry: SimTime,
    pub start: Option<SimTime>,
    pub exit: Option<SimTime>,
}

/// A patient still in the department when the replication stopped.
///
/// Holds only the steps actually reached; nothing is filled in for the rest.
/// Kept out of every statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteJourney {
    pub patient: PatientId,
    pub arrival_time: SimTime,
    pub ward: Option<Ward>,
    pub stages: Vec<PartialStage>,
}

/// State of a staff pool right after a change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSample {
    pub time: SimTime,
    pub busy: u32,
    pub queue_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(entry: f64, start: f64, exit: f64) -> StageTimes {
        StageTimes {
            entry: SimTime::from_minutes(entry),
            start: SimTime::from_minutes(start),
            exit: SimTime::from_minutes(exit),
        }
    }

    #[test]
    fn test_observation_waits() {
        let obs = Observation::new(
            PatientId(4),
            Ward::Acu,
            SimTime::from_minutes(10.0),
            stage(10.0, 11.0, 13.0),
            stage(13.0, 13.0, 20.0),
            stage(20.0, 25.5, 60.0),
        );

        assert_eq!(obs.wait_reception, 1.0);
        assert_eq!(obs.wait_triage, 0.0);
        assert_eq!(obs.wait_treatment, 5.5);
        assert_eq!(obs.wait_ed(), None);
        assert_eq!(obs.wait_acu(), Some(5.5));
        assert_eq!(obs.time_in_system(), 50.0);
        assert!(obs.stage(Service::Ed).is_none());
        assert_eq!(obs.stage(Service::Acu).map(|s| s.service()), Some(34.5));
    }
}
