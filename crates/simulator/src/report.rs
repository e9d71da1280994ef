//! Batch report.

use crate::config::BatchConfig;
use crate::stats::{AggregateSummary, MetricSummary, PatientMetric};
use edflow_types::Service;
use std::time::Duration;

/// Final batch report.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub seed: u64,
    pub replications: u32,
    pub warm_up: f64,
    pub sim_duration: f64,
    pub parallel: bool,
    pub wall_duration: Duration,
    pub summary: AggregateSummary,
}

impl SimulationReport {
    pub fn new(config: &BatchConfig, summary: AggregateSummary, wall_duration: Duration) -> Self {
        Self {
            seed: config.sim.seed,
            replications: config.replications(),
            warm_up: config.sim.warm_up,
            sim_duration: config.sim.sim_duration,
            parallel: config.is_parallel(),
            wall_duration,
            summary,
        }
    }

    /// Mean of a patient metric across replications, if any patient had it.
    pub fn mean(&self, metric: PatientMetric) -> Option<f64> {
        self.summary.patient(metric).map(|m| m.mean)
    }

    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════");
        println!("      EMERGENCY DEPARTMENT FLOW REPORT      ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Batch:");
        println!("  Replications: {}", self.replications);
        println!("  Seed:         {}", self.seed);
        println!(
            "  Window:       {:.0} min after {:.0} min warm-up",
            self.sim_duration, self.warm_up
        );
        println!();
        println!("Patients:");
        println!("  Observed:     {}", self.summary.observations);
        println!("  Incomplete:   {} (excluded)", self.summary.incomplete);
        println!();
        println!("Waits and time in system (min, mean ± 95% CI):");
        for metric in PatientMetric::ALL {
            match self.summary.patient(metric) {
                Some(summary) => {
                    let pooled = summary
                        .pooled
                        .as_ref()
                        .map(|p| format!("  p50 {:.2}  p90 {:.2}  p99 {:.2}", p.p50, p.p90, p.p99))
                        .unwrap_or_default();
                    println!("  {:<15} {}{}", metric.name(), interval(summary), pooled);
                }
                None => println!("  {:<15} n/a", metric.name()),
            }
        }
        println!();
        println!("Staff pools (mean queue length, utilisation):");
        for service in Service::ALL {
            let pool = self.summary.pool(service);
            let queue = pool.queue_len.as_ref().map(interval).unwrap_or_default();
            let busy = pool
                .utilisation
                .as_ref()
                .map(|u| format!("{:.1}%", u.mean * 100.0))
                .unwrap_or_default();
            println!("  {:<15} {}  {}", service.name(), queue, busy);
        }
        println!();
        println!(
            "Duration: {:.2}s ({})",
            self.wall_duration.as_secs_f64(),
            if self.parallel { "parallel" } else { "sequential" }
        );
        println!("═══════════════════════════════════════════\n");
    }
}

fn interval(summary: &MetricSummary) -> String {
    match summary.ci_half_width {
        Some(half) => format!("{:>8.3} ± {:.3}", summary.mean, half),
        None => format!("{:>8.3}", summary.mean),
    }
}
