//! Across-replication statistics.
//!
//! Each submitted [`ReplicationResult`] is reduced to a
//! [`ReplicationSummary`] (one mean per metric) and its patient-level values
//! are recorded into pooled histograms. Summaries are kept keyed by
//! replication index and folded in index order, and histograms merge by
//! count addition, so the final [`AggregateSummary`] does not depend on the
//! order replications finished in.

use crate::error::BatchError;
use edflow_simulation::ReplicationResult;
use edflow_types::{Observation, ReplicationId, Service, SimConfig, SimTime};
use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Histogram resolution: values are recorded in thousandths of a minute.
const HISTOGRAM_SCALE: f64 = 1000.0;

/// Significant figures kept by the pooled histograms.
const HISTOGRAM_SIGFIG: u8 = 3;

/// Patient-level metric, measured once per departed patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientMetric {
    WaitReception,
    WaitTriage,
    WaitEd,
    WaitAcu,
    TimeInSystem,
}

impl PatientMetric {
    pub const ALL: [PatientMetric; 5] = [
        PatientMetric::WaitReception,
        PatientMetric::WaitTriage,
        PatientMetric::WaitEd,
        PatientMetric::WaitAcu,
        PatientMetric::TimeInSystem,
    ];

    fn index(self) -> usize {
        match self {
            PatientMetric::WaitReception => 0,
            PatientMetric::WaitTriage => 1,
            PatientMetric::WaitEd => 2,
            PatientMetric::WaitAcu => 3,
            PatientMetric::TimeInSystem => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatientMetric::WaitReception => "wait_reception",
            PatientMetric::WaitTriage => "wait_triage",
            PatientMetric::WaitEd => "wait_ed",
            PatientMetric::WaitAcu => "wait_acu",
            PatientMetric::TimeInSystem => "time_in_system",
        }
    }

    /// The metric's value for one patient; `None` when it does not apply
    /// (the ward the patient was not routed to).
    pub fn value(self, observation: &Observation) -> Option<f64> {
        match self {
            PatientMetric::WaitReception => Some(observation.wait_reception),
            PatientMetric::WaitTriage => Some(observation.wait_triage),
            PatientMetric::WaitEd => observation.wait_ed(),
            PatientMetric::WaitAcu => observation.wait_acu(),
            PatientMetric::TimeInSystem => Some(observation.time_in_system()),
        }
    }
}

impl fmt::Display for PatientMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One replication reduced to per-metric means.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationSummary {
    pub replication: ReplicationId,
    pub observations: u64,
    pub incomplete: u64,
    /// Mean of each [`PatientMetric`]; `None` when no patient had a value.
    pub patient_means: [Option<f64>; 5],
    /// Time-weighted mean queue length per pool.
    pub mean_queue_len: [f64; 4],
    /// Busy fraction per pool.
    pub utilisation: [f64; 4],
    /// Binned mean queue length per pool.
    pub queue_bins: [Vec<f64>; 4],
}

impl ReplicationSummary {
    pub fn from_result(result: &ReplicationResult) -> Self {
        let patient_means = PatientMetric::ALL.map(|metric| result.mean_of(|o| metric.value(o)));
        let series = Service::ALL.map(|service| result.queue(service));

        Self {
            replication: result.replication,
            observations: result.observations.len() as u64,
            incomplete: result.incomplete.len() as u64,
            patient_means,
            mean_queue_len: series.map(|s| s.mean_queue_len),
            utilisation: series.map(|s| s.utilisation),
            queue_bins: series.map(|s| s.bins.iter().map(|b| b.mean_queue_len).collect()),
        }
    }

    pub fn patient_mean(&self, metric: PatientMetric) -> Option<f64> {
        self.patient_means[metric.index()]
    }
}

/// Across-replication statistics of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Replications that contributed a mean.
    pub replications: usize,
    /// Mean of the replication means.
    pub mean: f64,
    /// Sample standard deviation of the replication means.
    pub std_dev: f64,
    pub std_error: f64,
    /// Half-width of the 95% Student-t confidence interval. `None` with a
    /// single replication.
    pub ci_half_width: Option<f64>,
    /// Distribution of the pooled patient-level values, for patient metrics.
    pub pooled: Option<PooledDistribution>,
}

impl MetricSummary {
    /// Summarise replication means, in replication order. `None` when empty.
    pub fn from_means(means: &[f64]) -> Option<Self> {
        let n = means.len();
        if n == 0 {
            return None;
        }

        let mean = means.iter().sum::<f64>() / n as f64;
        let (std_dev, std_error, ci_half_width) = if n > 1 {
            let variance =
                means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            let std_dev = variance.sqrt();
            let std_error = std_dev / (n as f64).sqrt();
            (std_dev, std_error, Some(t_critical_95(n - 1) * std_error))
        } else {
            (0.0, 0.0, None)
        };

        Some(Self {
            replications: n,
            mean,
            std_dev,
            std_error,
            ci_half_width,
            pooled: None,
        })
    }

    /// Lower and upper bound of the 95% confidence interval.
    pub fn confidence_interval(&self) -> Option<(f64, f64)> {
        self.ci_half_width.map(|h| (self.mean - h, self.mean + h))
    }
}

/// Pooled distribution of a patient-level metric over every replication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledDistribution {
    /// Number of pooled values.
    pub count: u64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}

impl PooledDistribution {
    fn from_histogram(histogram: &Histogram<u64>) -> Option<Self> {
        if histogram.is_empty() {
            return None;
        }
        let minutes = |v: u64| v as f64 / HISTOGRAM_SCALE;
        Some(Self {
            count: histogram.len(),
            mean: histogram.mean() / HISTOGRAM_SCALE,
            p50: minutes(histogram.value_at_quantile(0.50)),
            p90: minutes(histogram.value_at_quantile(0.90)),
            p99: minutes(histogram.value_at_quantile(0.99)),
            max: minutes(histogram.max()),
        })
    }
}

/// Across-replication mean queue length of one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSummary {
    pub start: SimTime,
    pub end: SimTime,
    pub mean_queue_len: f64,
}

/// Statistics of one staff pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    pub service: Service,
    pub queue_len: Option<MetricSummary>,
    pub utilisation: Option<MetricSummary>,
    pub bins: Vec<BinSummary>,
}

/// Final statistics of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub replications: usize,
    /// Pooled number of retained observations.
    pub observations: u64,
    /// Pooled number of incomplete journeys, excluded from every metric.
    pub incomplete: u64,
    pub patients: BTreeMap<PatientMetric, MetricSummary>,
    /// One entry per pool, in [`Service::ALL`] order.
    pub pools: Vec<PoolSummary>,
}

impl AggregateSummary {
    pub fn patient(&self, metric: PatientMetric) -> Option<&MetricSummary> {
        self.patients.get(&metric)
    }

    pub fn pool(&self, service: Service) -> &PoolSummary {
        &self.pools[service.index()]
    }
}

/// Collects replication results and reduces them to an [`AggregateSummary`].
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    /// Bin grid every submitted result must share.
    bins: Vec<(SimTime, SimTime)>,
    summaries: BTreeMap<ReplicationId, ReplicationSummary>,
    /// Pooled patient-level values, indexed like [`PatientMetric::ALL`].
    histograms: Vec<Histogram<u64>>,
}

impl StatisticsAggregator {
    /// Create an empty aggregator on the bin grid of `config`.
    pub fn new(config: &SimConfig) -> Result<Self, BatchError> {
        let bins = config.bin_grid();
        let histograms = PatientMetric::ALL
            .iter()
            .map(|_| Histogram::new(HISTOGRAM_SIGFIG))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bins,
            summaries: BTreeMap::new(),
            histograms,
        })
    }

    /// Number of replications submitted so far.
    pub fn replications(&self) -> usize {
        self.summaries.len()
    }

    /// Per-replication summaries, in replication order.
    pub fn summaries(&self) -> impl Iterator<Item = &ReplicationSummary> + '_ {
        self.summaries.values()
    }

    /// Add one replication.
    pub fn submit(&mut self, result: &ReplicationResult) -> Result<(), BatchError> {
        if self.summaries.contains_key(&result.replication) {
            return Err(BatchError::DuplicateReplication(result.replication));
        }
        for series in &result.queues {
            let grid = series.bins.iter().map(|bin| (bin.start, bin.end));
            if !grid.eq(self.bins.iter().copied()) {
                return Err(BatchError::BinMismatch {
                    replication: result.replication,
                    service: series.service,
                });
            }
        }

        for observation in &result.observations {
            for metric in PatientMetric::ALL {
                if let Some(value) = metric.value(observation) {
                    self.histograms[metric.index()]
                        .saturating_record((value * HISTOGRAM_SCALE).round() as u64);
                }
            }
        }

        self.summaries
            .insert(result.replication, ReplicationSummary::from_result(result));
        Ok(())
    }

    /// Fold another aggregator's replications into this one.
    pub fn merge(&mut self, other: StatisticsAggregator) -> Result<(), BatchError> {
        if other.bins != self.bins {
            return Err(BatchError::GridMismatch);
        }
        if let Some(duplicate) = other
            .summaries
            .keys()
            .find(|id| self.summaries.contains_key(id))
        {
            return Err(BatchError::DuplicateReplication(*duplicate));
        }

        for (mine, theirs) in self.histograms.iter_mut().zip(&other.histograms) {
            mine.add(theirs)?;
        }
        self.summaries.extend(other.summaries);
        Ok(())
    }

    /// Reduce everything submitted so far.
    pub fn summary(&self) -> AggregateSummary {
        let patients = PatientMetric::ALL
            .iter()
            .filter_map(|&metric| {
                let means: Vec<f64> = self
                    .summaries
                    .values()
                    .filter_map(|s| s.patient_mean(metric))
                    .collect();
                let mut summary = MetricSummary::from_means(&means)?;
                summary.pooled =
                    PooledDistribution::from_histogram(&self.histograms[metric.index()]);
                Some((metric, summary))
            })
            .collect();

        let pools = Service::ALL
            .iter()
            .map(|&service| self.pool_summary(service))
            .collect();

        AggregateSummary {
            replications: self.summaries.len(),
            observations: self.summaries.values().map(|s| s.observations).sum(),
            incomplete: self.summaries.values().map(|s| s.incomplete).sum(),
            patients,
            pools,
        }
    }

    fn pool_summary(&self, service: Service) -> PoolSummary {
        let i = service.index();
        let queue_means: Vec<f64> = self
            .summaries
            .values()
            .map(|s| s.mean_queue_len[i])
            .collect();
        let utilisation: Vec<f64> = self.summaries.values().map(|s| s.utilisation[i]).collect();

        let n = self.summaries.len().max(1) as f64;
        let bins = self
            .bins
            .iter()
            .enumerate()
            .map(|(b, &(start, end))| BinSummary {
                start,
                end,
                mean_queue_len: self
                    .summaries
                    .values()
                    .map(|s| s.queue_bins[i][b])
                    .sum::<f64>()
                    / n,
            })
            .collect();

        PoolSummary {
            service,
            queue_len: MetricSummary::from_means(&queue_means),
            utilisation: MetricSummary::from_means(&utilisation),
            bins,
        }
    }
}

/// Two-sided 95% critical value of Student's t with `df` degrees of freedom.
///
/// Exact for `df <= 30`; above that the value of the next lower tabulated
/// `df` is used, which slightly widens the interval.
pub fn t_critical_95(df: usize) -> f64 {
    const TABLE: [f64; 30] = [
        12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
        2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
        2.052, 2.048, 2.045, 2.042,
    ];

    match df {
        0 => f64::NAN,
        1..=30 => TABLE[df - 1],
        31..=39 => 2.042,
        40..=59 => 2.021,
        60..=119 => 2.000,
        _ => 1.980,
    }
}
