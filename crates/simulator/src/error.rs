//! Batch errors.

use edflow_core::SimulationError;
use edflow_types::{ConfigError, ReplicationId, Service};
use thiserror::Error;

/// Errors that abort a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Invalid model parameters; nothing ran.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A replication broke an invariant.
    #[error("{replication} failed: {source}")]
    Replication {
        replication: ReplicationId,
        #[source]
        source: SimulationError,
    },

    /// The same replication reached the aggregator twice.
    #[error("{0} submitted twice")]
    DuplicateReplication(ReplicationId),

    /// A result was binned on a different grid than the aggregator.
    #[error("{replication} {service} queue bins do not match the aggregator's grid")]
    BinMismatch {
        replication: ReplicationId,
        service: Service,
    },

    /// Two aggregators were built on different bin grids.
    #[error("Aggregators have different queue bin grids")]
    GridMismatch,

    #[error("Histogram creation failed: {0}")]
    HistogramCreation(#[from] hdrhistogram::CreationError),

    #[error("Histogram merge failed: {0}")]
    HistogramMerge(#[from] hdrhistogram::AdditionError),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Reading a config file or writing rows.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
