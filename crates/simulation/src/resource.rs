//! Finite staff pools with FCFS wait queues.

use edflow_core::InvariantViolation;
use edflow_types::{ConfigError, PatientId, PoolSample, Service, SimTime};
use std::collections::VecDeque;

/// Result of asking a pool for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A unit was free and is now held by the patient.
    Acquired,
    /// Every unit is busy; the patient joined the queue at `position` (0 = next).
    Enqueued { position: usize },
}

/// A group of identical staff units serving one [`Service`].
///
/// Invariants, held after every operation:
/// - `busy <= capacity`
/// - the wait queue is non-empty only while `busy == capacity`
///
/// A freed unit goes straight to the longest-waiting patient, so waiting
/// patients acquire units in exactly the order they queued.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    service: Service,
    capacity: u32,
    busy: u32,
    wait_queue: VecDeque<PatientId>,
    /// State after every change, in clock order, starting from time zero.
    samples: Vec<PoolSample>,
}

impl ResourcePool {
    /// Create an idle pool. Capacity is fixed for the pool's lifetime.
    pub fn new(service: Service, capacity: u32) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: service.name(),
            });
        }

        Ok(Self {
            service,
            capacity,
            busy: 0,
            wait_queue: VecDeque::new(),
            samples: Vec::new(),
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently held.
    pub fn busy(&self) -> u32 {
        self.busy
    }

    /// Patients waiting for a unit.
    pub fn queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    /// Waiting patients, longest-waiting first.
    pub fn waiting(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.wait_queue.iter().copied()
    }

    /// Change log: the pool's state right after each request or release.
    pub fn samples(&self) -> &[PoolSample] {
        &self.samples
    }

    /// Ask for a unit on behalf of `patient`.
    pub fn request(&mut self, patient: PatientId, now: SimTime) -> RequestOutcome {
        let outcome = if self.busy < self.capacity {
            self.busy += 1;
            RequestOutcome::Acquired
        } else {
            self.wait_queue.push_back(patient);
            RequestOutcome::Enqueued {
                position: self.wait_queue.len() - 1,
            }
        };

        self.record(now);
        outcome
    }

    /// Give a unit back.
    ///
    /// Returns the patient the unit was handed to, if anyone was waiting.
    pub fn release(&mut self, now: SimTime) -> Result<Option<PatientId>, InvariantViolation> {
        if self.busy == 0 {
            return Err(InvariantViolation::ReleaseWithoutBusy {
                service: self.service,
                now,
            });
        }

        let next = self.wait_queue.pop_front();
        if next.is_none() {
            self.busy -= 1;
        }

        self.record(now);
        Ok(next)
    }

    fn record(&mut self, now: SimTime) {
        debug_assert!(self.busy <= self.capacity);
        debug_assert!(self.wait_queue.is_empty() || self.busy == self.capacity);

        self.samples.push(PoolSample {
            time: now,
            busy: self.busy,
            queue_len: self.wait_queue.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: f64) -> SimTime {
        SimTime::from_minutes(minutes)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ResourcePool::new(Service::Ed, 0).is_err());
    }

    #[test]
    fn test_acquire_until_full_then_queue() {
        let mut pool = ResourcePool::new(Service::Triage, 2).unwrap();

        assert_eq!(pool.request(PatientId(0), at(0.0)), RequestOutcome::Acquired);
        assert_eq!(pool.request(PatientId(1), at(1.0)), RequestOutcome::Acquired);
        assert_eq!(
            pool.request(PatientId(2), at(2.0)),
            RequestOutcome::Enqueued { position: 0 }
        );
        assert_eq!(
            pool.request(PatientId(3), at(3.0)),
            RequestOutcome::Enqueued { position: 1 }
        );

        assert_eq!(pool.busy(), 2);
        assert_eq!(pool.queue_len(), 2);
        assert_eq!(
            pool.waiting().collect::<Vec<_>>(),
            vec![PatientId(2), PatientId(3)]
        );
    }

    #[test]
    fn test_release_hands_off_in_fifo_order() {
        let mut pool = ResourcePool::new(Service::Registration, 1).unwrap();
        pool.request(PatientId(0), at(0.0));
        pool.request(PatientId(1), at(0.1));
        pool.request(PatientId(2), at(0.2));

        assert_eq!(pool.release(at(1.0)).unwrap(), Some(PatientId(1)));
        assert_eq!(pool.busy(), 1, "hand-off keeps the unit busy");
        assert_eq!(pool.release(at(2.0)).unwrap(), Some(PatientId(2)));
        assert_eq!(pool.release(at(3.0)).unwrap(), None);
        assert_eq!(pool.busy(), 0);
    }

    #[test]
    fn test_release_without_busy_is_violation() {
        let mut pool = ResourcePool::new(Service::Acu, 3).unwrap();
        let err = pool.release(at(4.0)).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::ReleaseWithoutBusy {
                service: Service::Acu,
                now: at(4.0)
            }
        );
    }

    #[test]
    fn test_every_change_is_sampled() {
        let mut pool = ResourcePool::new(Service::Ed, 1).unwrap();
        pool.request(PatientId(0), at(0.0));
        pool.request(PatientId(1), at(1.0));
        pool.release(at(2.0)).unwrap();
        pool.release(at(3.0)).unwrap();

        let states: Vec<(f64, u32, usize)> = pool
            .samples()
            .iter()
            .map(|s| (s.time.as_minutes(), s.busy, s.queue_len))
            .collect();
        assert_eq!(
            states,
            vec![(0.0, 1, 0), (1.0, 1, 1), (2.0, 1, 0), (3.0, 0, 0)]
        );
    }
}
