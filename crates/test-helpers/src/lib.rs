//! Test helpers for edflow.
//!
//! Provides a scripted [`VariateSource`] so patient flows can be driven with
//! exact durations and ward outcomes, plus small configuration fixtures.

use edflow_core::VariateSource;
use edflow_types::{Service, SimConfig, Ward};
use std::collections::VecDeque;

/// Duration returned once a script runs dry.
pub const DEFAULT_DURATION: f64 = 1.0;

/// A variate source that replays fixed values.
///
/// Each kind of draw has its own queue. An exhausted queue falls back to
/// [`DEFAULT_DURATION`] for durations and to [`Ward::Ed`] for outcomes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVariates {
    inter_arrivals: VecDeque<f64>,
    service_times: [VecDeque<f64>; 4],
    outcomes: VecDeque<Ward>,
    outcomes_drawn: usize,
}

impl ScriptedVariates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append inter-arrival times.
    pub fn with_inter_arrivals(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.inter_arrivals.extend(values);
        self
    }

    /// Append service times for one service.
    pub fn with_service_times(
        mut self,
        service: Service,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        self.service_times[service.index()].extend(values);
        self
    }

    /// Append triage outcomes.
    pub fn with_outcomes(mut self, values: impl IntoIterator<Item = Ward>) -> Self {
        self.outcomes.extend(values);
        self
    }

    /// How many triage outcomes have been drawn.
    pub fn outcomes_drawn(&self) -> usize {
        self.outcomes_drawn
    }
}

impl VariateSource for ScriptedVariates {
    fn next_inter_arrival(&mut self) -> f64 {
        self.inter_arrivals.pop_front().unwrap_or(DEFAULT_DURATION)
    }

    fn next_service_time(&mut self, service: Service) -> f64 {
        self.service_times[service.index()]
            .pop_front()
            .unwrap_or(DEFAULT_DURATION)
    }

    fn next_triage_outcome(&mut self) -> Ward {
        self.outcomes_drawn += 1;
        self.outcomes.pop_front().unwrap_or(Ward::Ed)
    }
}

/// One unit in every pool, no warm-up, a 100 minute run.
pub fn single_server_config() -> SimConfig {
    SimConfig::new()
        .with_staffing(1, 1, 1, 1)
        .with_warm_up(0.0)
        .with_sim_duration(100.0)
        .with_bin_size(10.0)
        .with_replications(1)
}

/// A short, busy configuration for fast multi-replication tests.
pub fn short_run_config(seed: u64) -> SimConfig {
    SimConfig::new()
        .with_staffing(1, 2, 3, 2)
        .with_inter_arrival_time(4.0)
        .with_mean_service_time(Service::Registration, 2.0)
        .with_mean_service_time(Service::Triage, 5.0)
        .with_mean_service_time(Service::Ed, 15.0)
        .with_mean_service_time(Service::Acu, 20.0)
        .with_p_ed(0.5)
        .with_warm_up(60.0)
        .with_sim_duration(480.0)
        .with_bin_size(60.0)
        .with_replications(8)
        .with_seed(seed)
}
