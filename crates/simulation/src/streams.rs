//! Seeded random variate streams.

use edflow_core::VariateSource;
use edflow_types::{
    check_positive_mean, mean_field, ConfigError, ReplicationId, Service, SimConfig, Ward,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};

/// Random variates for one replication.
///
/// All draws come from a single `ChaCha8Rng`. Replications share the base seed
/// but each selects its own ChaCha stream, so streams are independent of each
/// other and of the order in which replications run.
#[derive(Debug, Clone)]
pub struct RandomStreams {
    rng: ChaCha8Rng,
    inter_arrival: Exp<f64>,
    /// Indexed by [`Service::index`].
    service: [Exp<f64>; 4],
    p_ed: f64,
}

impl RandomStreams {
    /// Create the stream for `replication` from the configured base seed.
    pub fn new(config: &SimConfig, replication: ReplicationId) -> Result<Self, ConfigError> {
        Self::with_seed(config, config.seed, replication)
    }

    /// Create the stream for `replication` from an explicit base seed.
    pub fn with_seed(
        config: &SimConfig,
        seed: u64,
        replication: ReplicationId,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&config.p_ed) {
            return Err(ConfigError::ProbabilityOutOfRange(config.p_ed));
        }

        let inter_arrival = exponential("inter_arrival_time", config.inter_arrival_time)?;
        let service = [
            exponential_for(config, Service::Registration)?,
            exponential_for(config, Service::Triage)?,
            exponential_for(config, Service::Ed)?,
            exponential_for(config, Service::Acu)?,
        ];

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(u64::from(replication.get()));

        Ok(Self {
            rng,
            inter_arrival,
            service,
            p_ed: config.p_ed,
        })
    }
}

impl VariateSource for RandomStreams {
    fn next_inter_arrival(&mut self) -> f64 {
        self.inter_arrival.sample(&mut self.rng)
    }

    fn next_service_time(&mut self, service: Service) -> f64 {
        self.service[service.index()].sample(&mut self.rng)
    }

    fn next_triage_outcome(&mut self) -> Ward {
        if self.rng.gen::<f64>() < self.p_ed {
            Ward::Ed
        } else {
            Ward::Acu
        }
    }
}

fn exponential_for(config: &SimConfig, service: Service) -> Result<Exp<f64>, ConfigError> {
    exponential(mean_field(service), config.mean_service_time(service))
}

/// Exponential distribution with the given mean.
fn exponential(field: &'static str, mean: f64) -> Result<Exp<f64>, ConfigError> {
    check_positive_mean(field, mean)?;
    Exp::new(1.0 / mean).map_err(|_| ConfigError::NonPositiveMean { field, value: mean })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_trace(streams: &mut RandomStreams) -> Vec<f64> {
        (0..16)
            .map(|i| match i % 3 {
                0 => streams.next_inter_arrival(),
                1 => streams.next_service_time(Service::Triage),
                _ => streams.next_service_time(Service::Ed),
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_draws() {
        let config = SimConfig::new();
        let mut a = RandomStreams::new(&config, ReplicationId(3)).unwrap();
        let mut b = RandomStreams::new(&config, ReplicationId(3)).unwrap();
        assert_eq!(draw_trace(&mut a), draw_trace(&mut b));
    }

    #[test]
    fn test_replications_use_distinct_streams() {
        let config = SimConfig::new();
        let mut a = RandomStreams::new(&config, ReplicationId(0)).unwrap();
        let mut b = RandomStreams::new(&config, ReplicationId(1)).unwrap();
        assert_ne!(draw_trace(&mut a), draw_trace(&mut b));
    }

    #[test]
    fn test_sample_mean_matches_configured_mean() {
        let config = SimConfig::new().with_mean_service_time(Service::Acu, 40.0);
        let mut streams = RandomStreams::new(&config, ReplicationId(0)).unwrap();

        let n = 200_000;
        let total: f64 = (0..n)
            .map(|_| streams.next_service_time(Service::Acu))
            .sum();
        let mean = total / n as f64;
        assert!((mean - 40.0).abs() < 40.0 * 0.02, "sample mean {mean}");
    }

    #[test]
    fn test_draws_are_non_negative() {
        let mut streams = RandomStreams::new(&SimConfig::new(), ReplicationId(9)).unwrap();
        for _ in 0..10_000 {
            assert!(streams.next_inter_arrival() >= 0.0);
            assert!(streams.next_service_time(Service::Registration) >= 0.0);
        }
    }

    #[test]
    fn test_triage_outcome_extremes() {
        let mut all_ed = RandomStreams::new(&SimConfig::new().with_p_ed(1.0), ReplicationId(0))
            .unwrap();
        let mut all_acu = RandomStreams::new(&SimConfig::new().with_p_ed(0.0), ReplicationId(0))
            .unwrap();
        for _ in 0..1_000 {
            assert_eq!(all_ed.next_triage_outcome(), Ward::Ed);
            assert_eq!(all_acu.next_triage_outcome(), Ward::Acu);
        }
    }

    #[test]
    fn test_triage_outcome_frequency() {
        let mut streams =
            RandomStreams::new(&SimConfig::new().with_p_ed(0.3), ReplicationId(0)).unwrap();
        let n = 100_000;
        let ed = (0..n)
            .filter(|_| streams.next_triage_outcome() == Ward::Ed)
            .count();
        let fraction = ed as f64 / n as f64;
        assert!((fraction - 0.3).abs() < 0.01, "ED fraction {fraction}");
    }

    #[test]
    fn test_rejects_non_positive_mean() {
        let config = SimConfig::new().with_mean_service_time(Service::Triage, 0.0);
        let err = RandomStreams::new(&config, ReplicationId(0)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositiveMean {
                field: "mean_triage_time",
                value: 0.0
            }
        );

        let config = SimConfig::new().with_inter_arrival_time(-3.0);
        assert!(RandomStreams::new(&config, ReplicationId(0)).is_err());
    }
}
