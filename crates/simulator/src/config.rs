//! Configuration types for the batch runner.

use edflow_types::{ConfigError, SimConfig};

/// How replications are scheduled onto threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    /// One replication after another on the calling thread.
    #[default]
    Sequential,
    /// Replications spread over a rayon pool. `threads: None` uses the
    /// global pool.
    Parallel { threads: Option<usize> },
}

/// Configuration for a batch of replications.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Model parameters shared by every replication.
    pub sim: SimConfig,

    /// Thread scheduling.
    pub execution: Execution,
}

impl BatchConfig {
    /// Create a sequential batch over `sim`.
    pub fn new(sim: SimConfig) -> Self {
        Self {
            sim,
            execution: Execution::Sequential,
        }
    }

    /// Run replications in parallel on the global rayon pool.
    pub fn parallel(mut self) -> Self {
        self.execution = Execution::Parallel { threads: None };
        self
    }

    /// Run replications in parallel on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.execution = Execution::Parallel {
            threads: Some(threads),
        };
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sim.seed = seed;
        self
    }

    /// Number of replications in the batch.
    pub fn replications(&self) -> u32 {
        self.sim.n_sims
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.execution, Execution::Parallel { .. })
    }

    /// Validate the model parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
