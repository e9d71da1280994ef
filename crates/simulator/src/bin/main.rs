//! Edflow Simulator CLI
//!
//! Run batches of emergency-department patient-flow replications.
//!
//! # Example
//!
//! ```bash
//! # Default staffing, 10 replications, fixed seed
//! edflow-sim --seed 42
//!
//! # More ED doctors, 100 replications in parallel, export patient rows
//! edflow-sim --ed-doctors 6 -n 100 --parallel --patients-out patients.jsonl
//!
//! # Parameters from a file, seed taken from the file
//! edflow-sim --config scenario.json
//! ```

use clap::Parser;
use edflow_simulator::{
    patient_rows, queue_rows, write_json_lines, BatchConfig, BatchError, BatchRunner,
};
use edflow_types::{Service, SimConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Edflow Simulator
///
/// Runs replications of the emergency-department model. Reproducible when
/// the same seed is used, sequential or parallel.
#[derive(Parser, Debug)]
#[command(name = "edflow-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file with model parameters. Flags below override its values.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of replications
    #[arg(short = 'n', long)]
    replications: Option<u32>,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Warm-up period in minutes, discarded from the results
    #[arg(long)]
    warm_up: Option<f64>,

    /// Measured period in minutes after warm-up
    #[arg(short = 'd', long)]
    duration: Option<f64>,

    /// Width of a queue-length bin in minutes
    #[arg(long)]
    bin_size: Option<f64>,

    /// Receptionists
    #[arg(long)]
    receptionists: Option<u32>,

    /// Triage nurses
    #[arg(long)]
    nurses: Option<u32>,

    /// ED doctors
    #[arg(long)]
    ed_doctors: Option<u32>,

    /// ACU doctors
    #[arg(long)]
    acu_doctors: Option<u32>,

    /// Mean minutes between arrivals
    #[arg(long)]
    inter_arrival: Option<f64>,

    /// Probability that triage routes a patient to the ED (0.0-1.0)
    #[arg(long)]
    p_ed: Option<f64>,

    /// Run replications in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads for parallel runs. Implies --parallel.
    #[arg(long)]
    threads: Option<usize>,

    /// Write one JSON line per patient to this file
    #[arg(long)]
    patients_out: Option<PathBuf>,

    /// Write one JSON line per pool and bin to this file
    #[arg(long)]
    queues_out: Option<PathBuf>,
}

impl Args {
    /// Model parameters: the config file (or defaults) with flags applied on top.
    fn sim_config(&self) -> Result<SimConfig, BatchError> {
        let mut sim = match &self.config {
            Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            None => SimConfig::default(),
        };

        let staffing = [
            (Service::Registration, self.receptionists),
            (Service::Triage, self.nurses),
            (Service::Ed, self.ed_doctors),
            (Service::Acu, self.acu_doctors),
        ];
        for (service, capacity) in staffing {
            if let Some(capacity) = capacity {
                sim = sim.with_capacity(service, capacity);
            }
        }
        if let Some(mean) = self.inter_arrival {
            sim = sim.with_inter_arrival_time(mean);
        }
        if let Some(p_ed) = self.p_ed {
            sim = sim.with_p_ed(p_ed);
        }
        if let Some(n) = self.replications {
            sim = sim.with_replications(n);
        }
        if let Some(warm_up) = self.warm_up {
            sim = sim.with_warm_up(warm_up);
        }
        if let Some(duration) = self.duration {
            sim = sim.with_sim_duration(duration);
        }
        if let Some(bin_size) = self.bin_size {
            sim = sim.with_bin_size(bin_size);
        }

        // An explicit --seed wins; a config file seed is kept; otherwise random.
        let seed = match (self.seed, &self.config) {
            (Some(seed), _) => seed,
            (None, Some(_)) => sim.seed,
            (None, None) => rand::random(),
        };
        Ok(sim.with_seed(seed))
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,edflow_simulator=info,edflow_sim=info")),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), BatchError> {
    let sim = args.sim_config()?;
    let mut config = BatchConfig::new(sim);
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    } else if args.parallel {
        config = config.parallel();
    }

    let output = BatchRunner::new(config)?.run()?;
    output.report.print_summary();

    if let Some(path) = &args.patients_out {
        let rows = output.results.iter().flat_map(patient_rows);
        export(path, rows)?;
    }
    if let Some(path) = &args.queues_out {
        let rows = output.results.iter().flat_map(queue_rows);
        export(path, rows)?;
    }

    Ok(())
}

fn export<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), BatchError> {
    let rows = write_json_lines(BufWriter::new(File::create(path)?), rows)?;
    info!(path = %path.display(), rows, "Exported rows");
    Ok(())
}
