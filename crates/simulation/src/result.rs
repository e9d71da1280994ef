//! Per-replication results, restricted to the post-warm-up window.

use crate::runner::SimulationStats;
use edflow_types::{
    IncompleteJourney, Observation, PoolSample, ReplicationId, Service, SimConfig, SimTime,
};

/// Time-weighted mean queue length over one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueBin {
    pub start: SimTime,
    pub end: SimTime,
    pub mean_queue_len: f64,
}

/// Queue-length history of one staff pool over the measured window.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSeries {
    pub service: Service,
    pub capacity: u32,
    /// Raw change points with `time >= warm_up`.
    pub samples: Vec<PoolSample>,
    /// Fixed grid of `bin_size` bins starting at `warm_up`.
    pub bins: Vec<QueueBin>,
    /// Time-weighted mean queue length over the whole window.
    pub mean_queue_len: f64,
    /// Time-weighted fraction of units busy over the whole window.
    pub utilisation: f64,
}

impl QueueSeries {
    /// Build the series from a pool's full change log.
    ///
    /// The log starts at time zero so the level carried over from warm-up is
    /// known; only the window `[warm_up, horizon]` is reported.
    pub fn from_change_log(
        service: Service,
        capacity: u32,
        log: &[PoolSample],
        config: &SimConfig,
    ) -> Self {
        let from = config.warm_up_end();
        let to = config.horizon();
        let window = to - from;

        let bins = config
            .bin_grid()
            .into_iter()
            .map(|(start, end)| {
                let area = integrate(log, start, end, |s| s.queue_len as f64);
                QueueBin {
                    start,
                    end,
                    mean_queue_len: area / (end - start),
                }
            })
            .collect();

        let queue_area = integrate(log, from, to, |s| s.queue_len as f64);
        let busy_area = integrate(log, from, to, |s| f64::from(s.busy));

        Self {
            service,
            capacity,
            samples: log.iter().filter(|s| s.time >= from).copied().collect(),
            bins,
            mean_queue_len: queue_area / window,
            utilisation: busy_area / (window * f64::from(capacity)),
        }
    }
}

/// Area under the step function described by `log` between `from` and `to`.
///
/// The pool is idle before its first sample. A sample at time `t` sets the
/// level from `t` onwards; several samples at the same instant leave the last
/// one in force.
fn integrate(log: &[PoolSample], from: SimTime, to: SimTime, value: impl Fn(&PoolSample) -> f64) -> f64 {
    if to <= from {
        return 0.0;
    }

    let first_after = log.partition_point(|s| s.time <= from);
    let mut level = first_after
        .checked_sub(1)
        .map(|i| value(&log[i]))
        .unwrap_or(0.0);
    let mut cursor = from;
    let mut area = 0.0;

    for sample in log[first_after..].iter().take_while(|s| s.time < to) {
        area += level * (sample.time - cursor);
        cursor = sample.time;
        level = value(sample);
    }

    area + level * (to - cursor)
}

/// Everything one replication retained after warm-up truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationResult {
    pub replication: ReplicationId,
    /// Departed patients that arrived at or after `warm_up`, in departure order.
    pub observations: Vec<Observation>,
    /// Patients that arrived at or after `warm_up` but had not departed by the horizon.
    pub incomplete: Vec<IncompleteJourney>,
    /// One series per pool, indexed by [`Service::index`].
    pub queues: Vec<QueueSeries>,
    pub stats: SimulationStats,
    pub warm_up_end: SimTime,
    pub horizon: SimTime,
}

impl ReplicationResult {
    /// Queue series of the pool behind `service`.
    pub fn queue(&self, service: Service) -> &QueueSeries {
        &self.queues[service.index()]
    }

    /// Mean of `metric` over the observations; `None` when there are none.
    pub fn mean_of(&self, metric: impl Fn(&Observation) -> Option<f64>) -> Option<f64> {
        let (sum, count) = self
            .observations
            .iter()
            .filter_map(metric)
            .fold((0.0, 0u64), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}
