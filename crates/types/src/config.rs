//! Simulation configuration.
//!
//! All durations are simulated minutes. The configuration is immutable once a
//! batch starts; [`SimConfig::validate`] is called exactly once at startup and
//! every replication trusts the result.

use crate::{Service, SimTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, detected before any replication runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A mean duration is zero, negative or not a number.
    #[error("Mean {field} must be positive, got {value}")]
    NonPositiveMean { field: &'static str, value: f64 },

    /// A staff pool has no units.
    #[error("Capacity {field} must be at least 1")]
    ZeroCapacity { field: &'static str },

    /// ED routing probability outside `[0, 1]`.
    #[error("p_ed must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    /// Negative warm-up period.
    #[error("warm_up must be non-negative, got {0}")]
    NegativeWarmUp(f64),

    /// Zero or negative measured run length.
    #[error("sim_duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    /// Zero or negative queue-length bin width.
    #[error("bin_size must be positive, got {0}")]
    NonPositiveBinSize(f64),

    /// A batch with no replications.
    #[error("n_sims must be at least 1")]
    ZeroReplications,
}

/// Configuration for a simulation batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Receptionists handling registration.
    pub n_receptionists: u32,

    /// Triage nurses.
    pub n_nurses: u32,

    /// Doctors in the ED ward.
    pub n_ed_doctors: u32,

    /// Doctors in the ACU ward.
    pub n_acu_doctors: u32,

    /// Mean registration time.
    pub mean_reception_time: f64,

    /// Mean triage time.
    pub mean_triage_time: f64,

    /// Mean ED consultation time.
    pub mean_ed_consult_time: f64,

    /// Mean ACU consultation time.
    pub mean_acu_consult_time: f64,

    /// Mean time between patient arrivals.
    pub inter_arrival_time: f64,

    /// Probability that triage routes a patient to the ED ward.
    pub p_ed: f64,

    /// Number of replications in a batch.
    pub n_sims: u32,

    /// Length of the discarded warm-up period.
    pub warm_up: f64,

    /// Length of the measured period after warm-up.
    pub sim_duration: f64,

    /// Width of queue-length bins.
    pub bin_size: f64,

    /// Base seed; each replication derives its own stream from it.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_receptionists: 1,
            n_nurses: 2,
            n_ed_doctors: 5,
            n_acu_doctors: 4,
            mean_reception_time: 2.0,
            mean_triage_time: 5.0,
            mean_ed_consult_time: 30.0,
            mean_acu_consult_time: 40.0,
            inter_arrival_time: 5.0,
            p_ed: 0.6,
            n_sims: 10,
            warm_up: 1440.0,
            sim_duration: 2880.0,
            bin_size: 60.0,
            seed: 12345,
        }
    }
}

impl SimConfig {
    /// Create a configuration with default staffing and timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staff count of every pool.
    pub fn with_staffing(mut self, receptionists: u32, nurses: u32, ed: u32, acu: u32) -> Self {
        self.n_receptionists = receptionists;
        self.n_nurses = nurses;
        self.n_ed_doctors = ed;
        self.n_acu_doctors = acu;
        self
    }

    /// Set the staff count of one pool.
    pub fn with_capacity(mut self, service: Service, capacity: u32) -> Self {
        match service {
            Service::Registration => self.n_receptionists = capacity,
            Service::Triage => self.n_nurses = capacity,
            Service::Ed => self.n_ed_doctors = capacity,
            Service::Acu => self.n_acu_doctors = capacity,
        }
        self
    }

    /// Set the mean service time of one service.
    pub fn with_mean_service_time(mut self, service: Service, mean: f64) -> Self {
        match service {
            Service::Registration => self.mean_reception_time = mean,
            Service::Triage => self.mean_triage_time = mean,
            Service::Ed => self.mean_ed_consult_time = mean,
            Service::Acu => self.mean_acu_consult_time = mean,
        }
        self
    }

    /// Set the mean inter-arrival time.
    pub fn with_inter_arrival_time(mut self, mean: f64) -> Self {
        self.inter_arrival_time = mean;
        self
    }

    /// Set the ED routing probability.
    pub fn with_p_ed(mut self, p_ed: f64) -> Self {
        self.p_ed = p_ed;
        self
    }

    /// Set the number of replications.
    pub fn with_replications(mut self, n_sims: u32) -> Self {
        self.n_sims = n_sims;
        self
    }

    /// Set the warm-up period.
    pub fn with_warm_up(mut self, warm_up: f64) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Set the measured period.
    pub fn with_sim_duration(mut self, sim_duration: f64) -> Self {
        self.sim_duration = sim_duration;
        self
    }

    /// Set the queue-length bin width.
    pub fn with_bin_size(mut self, bin_size: f64) -> Self {
        self.bin_size = bin_size;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Staff count of the pool behind `service`.
    pub fn capacity(&self, service: Service) -> u32 {
        match service {
            Service::Registration => self.n_receptionists,
            Service::Triage => self.n_nurses,
            Service::Ed => self.n_ed_doctors,
            Service::Acu => self.n_acu_doctors,
        }
    }

    /// Mean service time of `service`.
    pub fn mean_service_time(&self, service: Service) -> f64 {
        match service {
            Service::Registration => self.mean_reception_time,
            Service::Triage => self.mean_triage_time,
            Service::Ed => self.mean_ed_consult_time,
            Service::Acu => self.mean_acu_consult_time,
        }
    }

    /// Clock value at which the measured window opens.
    pub fn warm_up_end(&self) -> SimTime {
        SimTime::from_minutes(self.warm_up)
    }

    /// Clock value at which every replication stops.
    pub fn horizon(&self) -> SimTime {
        SimTime::from_minutes(self.warm_up + self.sim_duration)
    }

    /// Queue-length bins `(start, end)` covering `[warm_up, horizon]`.
    ///
    /// Bins are `bin_size` wide and start at `warm_up`; the last one is cut
    /// at the horizon. Every bin has positive width, even when floating-point
    /// steps land a grid point on the horizon. Empty for a non-positive
    /// `bin_size`.
    pub fn bin_grid(&self) -> Vec<(SimTime, SimTime)> {
        if !(self.bin_size.is_finite() && self.bin_size > 0.0) {
            return Vec::new();
        }
        let from = self.warm_up_end();
        let to = self.horizon();
        (0u64..)
            .map(|i| from + i as f64 * self.bin_size)
            .take_while(|&start| start < to)
            .map(|start| (start, (start + self.bin_size).min(to)))
            .collect()
    }

    /// Number of queue-length bins covering the measured window.
    pub fn bin_count(&self) -> usize {
        self.bin_grid().len()
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for service in Service::ALL {
            if self.capacity(service) == 0 {
                return Err(ConfigError::ZeroCapacity {
                    field: capacity_field(service),
                });
            }
        }

        for service in Service::ALL {
            check_positive_mean(mean_field(service), self.mean_service_time(service))?;
        }
        check_positive_mean("inter_arrival_time", self.inter_arrival_time)?;

        if !(0.0..=1.0).contains(&self.p_ed) {
            return Err(ConfigError::ProbabilityOutOfRange(self.p_ed));
        }
        if !(self.warm_up.is_finite() && self.warm_up >= 0.0) {
            return Err(ConfigError::NegativeWarmUp(self.warm_up));
        }
        if !(self.sim_duration.is_finite() && self.sim_duration > 0.0) {
            return Err(ConfigError::NonPositiveDuration(self.sim_duration));
        }
        if !(self.bin_size.is_finite() && self.bin_size > 0.0) {
            return Err(ConfigError::NonPositiveBinSize(self.bin_size));
        }
        if self.n_sims == 0 {
            return Err(ConfigError::ZeroReplications);
        }

        Ok(())
    }
}

/// Reject a mean that is not a positive finite number.
pub fn check_positive_mean(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveMean { field, value })
    }
}

/// Configuration field holding the mean service time of `service`.
pub fn mean_field(service: Service) -> &'static str {
    match service {
        Service::Registration => "mean_reception_time",
        Service::Triage => "mean_triage_time",
        Service::Ed => "mean_ed_consult_time",
        Service::Acu => "mean_acu_consult_time",
    }
}

fn capacity_field(service: Service) -> &'static str {
    match service {
        Service::Registration => "n_receptionists",
        Service::Triage => "n_nurses",
        Service::Ed => "n_ed_doctors",
        Service::Acu => "n_acu_doctors",
    }
}
