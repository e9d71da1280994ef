//! Edflow Simulator
//!
//! Replication batches on top of the single-replication engine in
//! `edflow-simulation`.
//!
//! # Architecture
//!
//! The simulator builds on `edflow-simulation` to provide:
//!
//! - **Batches**: `n_sims` independent replications, sequential or on a
//!   rayon pool, collected in replication order
//! - **Statistics**: across-replication means, confidence intervals, pooled
//!   percentiles and binned queue lengths
//! - **Export**: flat patient and queue rows for persistence
//! - **Configuration**: execution settings around a [`SimConfig`]
//!
//! # Example
//!
//! ```ignore
//! use edflow_simulator::{BatchConfig, BatchRunner, PatientMetric};
//! use edflow_types::SimConfig;
//!
//! let config = BatchConfig::new(SimConfig::new().with_replications(20)).parallel();
//! let output = BatchRunner::new(config)?.run()?;
//!
//! output.report.print_summary();
//! println!("Mean time in system: {:?}", output.report.mean(PatientMetric::TimeInSystem));
//! ```
//!
//! [`SimConfig`]: edflow_types::SimConfig

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod stats;

pub use batch::{BatchOutput, BatchRunner};
pub use config::{BatchConfig, Execution};
pub use error::BatchError;
pub use export::{patient_rows, queue_rows, write_json_lines, PatientRow, QueueRow};
pub use report::SimulationReport;
pub use stats::{
    t_critical_95, AggregateSummary, BinSummary, MetricSummary, PatientMetric, PoolSummary,
    PooledDistribution, ReplicationSummary, StatisticsAggregator,
};
