//! Core types for the emergency department simulation.
//!
//! Shared by every layer: simulated time, identifiers, services and wards,
//! the validated configuration and the records a replication produces.

mod config;
mod identifiers;
mod observation;
mod service;
mod time;

pub use config::{check_positive_mean, mean_field, ConfigError, SimConfig};
pub use identifiers::{PatientId, ReplicationId};
pub use observation::{IncompleteJourney, Observation, PartialStage, PoolSample, StageTimes};
pub use service::{Service, Ward};
pub use time::SimTime;
