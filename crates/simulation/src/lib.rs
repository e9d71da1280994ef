//! Deterministic patient-flow simulation.
//!
//! This crate provides a fully deterministic discrete-event simulation of an
//! emergency department. Given the same seed and replication id, it produces
//! identical results every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ReplicationRunner                      │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     EventScheduler (BTreeMap<EventKey, Event>)     │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     patients: BTreeMap<PatientId, PatientProcess>  │ │
//! │  │     Each handles its inputs sequentially           │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Actions → pool requests/releases, new events   │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod event_queue;
mod patient;
mod resource;
mod result;
mod runner;
mod streams;

pub use event_queue::{EventKey, EventScheduler};
pub use patient::{PatientProcess, PatientState};
pub use resource::{RequestOutcome, ResourcePool};
pub use result::{QueueBin, QueueSeries, ReplicationResult};
pub use runner::{run_replication, PoolTransition, ReplicationRunner, SimulationStats, TraceEntry};
pub use streams::RandomStreams;
