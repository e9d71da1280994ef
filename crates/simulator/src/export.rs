//! Flat row shapes for persisting replication results.
//!
//! One [`PatientRow`] per patient that arrived after warm-up (departed or
//! not) and one [`QueueRow`] per pool and bin. Rows are written as JSON
//! lines by [`write_json_lines`]; any other serde format works on the same
//! structs.

use crate::error::BatchError;
use edflow_simulation::ReplicationResult;
use edflow_types::{IncompleteJourney, Observation, Service, SimTime, StageTimes, Ward};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One patient's journey. Steps the patient never reached, and the wait
/// for the ward they were not routed to, are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRow {
    pub run: u32,
    pub patient: u64,
    pub ward: Option<Ward>,
    pub arrival: f64,
    pub reception_entry: Option<f64>,
    pub reception_start: Option<f64>,
    pub reception_exit: Option<f64>,
    pub triage_entry: Option<f64>,
    pub triage_start: Option<f64>,
    pub triage_exit: Option<f64>,
    pub treatment_entry: Option<f64>,
    pub treatment_start: Option<f64>,
    pub treatment_exit: Option<f64>,
    pub exit: Option<f64>,
    pub wait_reception: Option<f64>,
    pub wait_triage: Option<f64>,
    pub wait_ed: Option<f64>,
    pub wait_acu: Option<f64>,
    /// Whether the patient departed before the horizon.
    pub complete: bool,
}

/// Mean queue length of one pool over one bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRow {
    pub run: u32,
    pub service: Service,
    pub bin_start: f64,
    pub bin_end: f64,
    pub mean_queue_len: f64,
}

/// Timestamps of one step, each possibly missing.
#[derive(Default, Clone, Copy)]
struct StageCells {
    entry: Option<f64>,
    start: Option<f64>,
    exit: Option<f64>,
}

impl StageCells {
    fn wait(&self) -> Option<f64> {
        Some(self.start? - self.entry?)
    }
}

impl From<&StageTimes> for StageCells {
    fn from(stage: &StageTimes) -> Self {
        Self {
            entry: Some(stage.entry.as_minutes()),
            start: Some(stage.start.as_minutes()),
            exit: Some(stage.exit.as_minutes()),
        }
    }
}

impl PatientRow {
    fn build(
        run: u32,
        patient: u64,
        ward: Option<Ward>,
        arrival: SimTime,
        stages: [StageCells; 3],
        complete: bool,
    ) -> Self {
        let [reception, triage, treatment] = stages;
        let treatment_wait = treatment.wait();
        Self {
            run,
            patient,
            ward,
            arrival: arrival.as_minutes(),
            reception_entry: reception.entry,
            reception_start: reception.start,
            reception_exit: reception.exit,
            triage_entry: triage.entry,
            triage_start: triage.start,
            triage_exit: triage.exit,
            treatment_entry: treatment.entry,
            treatment_start: treatment.start,
            treatment_exit: treatment.exit,
            exit: if complete { treatment.exit } else { None },
            wait_reception: reception.wait(),
            wait_triage: triage.wait(),
            wait_ed: treatment_wait.filter(|_| ward == Some(Ward::Ed)),
            wait_acu: treatment_wait.filter(|_| ward == Some(Ward::Acu)),
            complete,
        }
    }

    pub fn from_observation(run: u32, observation: &Observation) -> Self {
        Self::build(
            run,
            observation.patient.0,
            Some(observation.ward),
            observation.arrival_time,
            [
                (&observation.reception).into(),
                (&observation.triage).into(),
                (&observation.treatment).into(),
            ],
            true,
        )
    }

    pub fn from_incomplete(run: u32, journey: &IncompleteJourney) -> Self {
        let mut stages = [StageCells::default(); 3];
        for stage in &journey.stages {
            let slot = match stage.service {
                Service::Registration => 0,
                Service::Triage => 1,
                Service::Ed | Service::Acu => 2,
            };
            stages[slot] = StageCells {
                entry: Some(stage.entry.as_minutes()),
                start: stage.start.map(SimTime::as_minutes),
                exit: stage.exit.map(SimTime::as_minutes),
            };
        }
        Self::build(
            run,
            journey.patient.0,
            journey.ward,
            journey.arrival_time,
            stages,
            false,
        )
    }
}

/// Patient rows of one replication: departed patients first, in departure
/// order, then incomplete journeys.
pub fn patient_rows(result: &ReplicationResult) -> impl Iterator<Item = PatientRow> + '_ {
    let run = result.replication.get();
    result
        .observations
        .iter()
        .map(move |o| PatientRow::from_observation(run, o))
        .chain(
            result
                .incomplete
                .iter()
                .map(move |j| PatientRow::from_incomplete(run, j)),
        )
}

/// Queue rows of one replication, pool by pool.
pub fn queue_rows(result: &ReplicationResult) -> impl Iterator<Item = QueueRow> + '_ {
    let run = result.replication.get();
    result.queues.iter().flat_map(move |series| {
        series.bins.iter().map(move |bin| QueueRow {
            run,
            service: series.service,
            bin_start: bin.start.as_minutes(),
            bin_end: bin.end.as_minutes(),
            mean_queue_len: bin.mean_queue_len,
        })
    })
}

/// Write rows as newline-delimited JSON. Returns the number of rows written.
pub fn write_json_lines<W, T>(
    mut writer: W,
    rows: impl IntoIterator<Item = T>,
) -> Result<usize, BatchError>
where
    W: Write,
    T: Serialize,
{
    let mut written = 0;
    for row in rows {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edflow_types::{PartialStage, PatientId};

    fn at(minutes: f64) -> SimTime {
        SimTime::from_minutes(minutes)
    }

    fn stage(entry: f64, start: f64, exit: f64) -> StageTimes {
        StageTimes {
            entry: at(entry),
            start: at(start),
            exit: at(exit),
        }
    }

    #[test]
    fn test_observation_row_leaves_other_ward_empty() {
        let observation = Observation::new(
            PatientId(3),
            Ward::Ed,
            at(10.0),
            stage(10.0, 12.0, 14.0),
            stage(14.0, 14.0, 19.0),
            stage(19.0, 25.0, 55.0),
        );
        let row = PatientRow::from_observation(7, &observation);

        assert_eq!(row.run, 7);
        assert_eq!(row.patient, 3);
        assert_eq!(row.wait_reception, Some(2.0));
        assert_eq!(row.wait_triage, Some(0.0));
        assert_eq!(row.wait_ed, Some(6.0));
        assert_eq!(row.wait_acu, None);
        assert_eq!(row.exit, Some(55.0));
        assert!(row.complete);
    }

    #[test]
    fn test_incomplete_row_has_only_reached_steps() {
        let journey = IncompleteJourney {
            patient: PatientId(9),
            arrival_time: at(100.0),
            ward: None,
            stages: vec![
                PartialStage {
                    service: Service::Registration,
                    entry: at(100.0),
                    start: Some(at(101.0)),
                    exit: Some(at(103.0)),
                },
                PartialStage {
                    service: Service::Triage,
                    entry: at(103.0),
                    start: None,
                    exit: None,
                },
            ],
        };
        let row = PatientRow::from_incomplete(0, &journey);

        assert_eq!(row.reception_exit, Some(103.0));
        assert_eq!(row.wait_reception, Some(1.0));
        assert_eq!(row.triage_entry, Some(103.0));
        assert_eq!(row.triage_start, None);
        assert_eq!(row.wait_triage, None);
        assert_eq!(row.treatment_entry, None);
        assert_eq!(row.exit, None);
        assert!(!row.complete);
    }

    #[test]
    fn test_write_json_lines() {
        let rows = [
            QueueRow {
                run: 0,
                service: Service::Triage,
                bin_start: 0.0,
                bin_end: 60.0,
                mean_queue_len: 1.5,
            },
            QueueRow {
                run: 0,
                service: Service::Acu,
                bin_start: 60.0,
                bin_end: 120.0,
                mean_queue_len: 0.0,
            },
        ];
        let mut buffer = Vec::new();
        let written = write_json_lines(&mut buffer, rows.iter()).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buffer).unwrap();
        let parsed: Vec<QueueRow> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, rows);
        assert!(text.contains("\"service\":\"triage\""));
    }
}
