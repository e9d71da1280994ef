//! Batch runner.
//!
//! Runs `n_sims` independent replications of one configuration and feeds
//! their results to a [`StatisticsAggregator`]. Each replication owns its
//! scheduler, pools and random stream, so they can run on any thread in any
//! order; results are collected in replication order either way.

use crate::config::{BatchConfig, Execution};
use crate::error::BatchError;
use crate::report::SimulationReport;
use crate::stats::StatisticsAggregator;
use edflow_simulation::{run_replication, ReplicationResult};
use edflow_types::{ReplicationId, SimConfig};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a batch produced.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Per-replication results, in replication order.
    pub results: Vec<ReplicationResult>,
    pub report: SimulationReport,
}

/// Runs a batch of replications.
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    /// Create a runner. The configuration is validated here, once, before
    /// any replication starts.
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run every replication and return the results in replication order.
    pub fn run_replications(&self) -> Result<Vec<ReplicationResult>, BatchError> {
        let sim = &self.config.sim;
        let n = self.config.replications();

        match self.config.execution {
            Execution::Sequential => (0..n).map(|i| run_one(sim, i)).collect(),
            Execution::Parallel { threads } => {
                let run = || {
                    (0..n)
                        .into_par_iter()
                        .map(|i| run_one(sim, i))
                        .collect::<Result<Vec<_>, _>>()
                };
                match threads {
                    Some(threads) => rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()?
                        .install(run),
                    None => run(),
                }
            }
        }
    }

    /// Run the batch and aggregate it.
    pub fn run(&self) -> Result<BatchOutput, BatchError> {
        let sim = &self.config.sim;
        info!(
            replications = sim.n_sims,
            seed = sim.seed,
            warm_up = sim.warm_up,
            sim_duration = sim.sim_duration,
            parallel = self.config.is_parallel(),
            "Starting batch"
        );

        let start = Instant::now();
        let results = self.run_replications()?;

        let mut aggregator = StatisticsAggregator::new(sim)?;
        for result in &results {
            aggregator.submit(result)?;
        }
        let summary = aggregator.summary();
        let wall_duration = start.elapsed();

        info!(
            replications = summary.replications,
            observations = summary.observations,
            incomplete = summary.incomplete,
            wall_ms = wall_duration.as_millis() as u64,
            "Batch complete"
        );

        Ok(BatchOutput {
            results,
            report: SimulationReport::new(&self.config, summary, wall_duration),
        })
    }
}

fn run_one(config: &SimConfig, index: u32) -> Result<ReplicationResult, BatchError> {
    let replication = ReplicationId(index);
    let result = run_replication(config, replication).map_err(|source| BatchError::Replication {
        replication,
        source,
    })?;
    debug!(
        replication = index,
        observations = result.observations.len(),
        "Replication finished"
    );
    Ok(result)
}
