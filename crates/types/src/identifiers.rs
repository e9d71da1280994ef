//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Patient identifier, scoped to a single replication.
///
/// Ids are handed out in arrival order starting at zero, so comparing two
/// ids from the same replication compares their arrival order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(pub u64);

impl PatientId {
    /// The first patient of a replication.
    pub const FIRST: Self = PatientId(0);

    /// Get the id that follows this one.
    pub fn next(self) -> Self {
        PatientId(self.0 + 1)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Patient({})", self.0)
    }
}

/// Replication index within a batch.
///
/// Also selects the independent random stream for the replication.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReplicationId(pub u32);

impl ReplicationId {
    /// Get the raw value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Replication({})", self.0)
    }
}
