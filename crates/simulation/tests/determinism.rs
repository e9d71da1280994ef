//! Tests for deterministic simulation.
//!
//! These tests verify that a replication produces identical results given the
//! same seed, and that the invariants of the staff pools hold at every step of
//! the recorded trace.

use edflow_simulation::{
    run_replication, PoolTransition, ReplicationResult, ReplicationRunner, TraceEntry,
};
use edflow_test_helpers::short_run_config;
use edflow_types::{ReplicationId, Service, SimConfig};
use std::collections::HashMap;
use tracing_test::traced_test;

fn traced_run(config: &SimConfig, replication: u32) -> (Vec<TraceEntry>, ReplicationResult) {
    let mut runner = ReplicationRunner::new(config, ReplicationId(replication))
        .unwrap()
        .with_trace();
    runner.initialize().unwrap();
    runner.run().unwrap();
    let trace = runner.trace().unwrap().to_vec();
    (trace, runner.finish().unwrap())
}

/// Test that the same seed produces the same sequence of events.
#[traced_test]
#[test]
fn test_determinism_same_seed() {
    let config = short_run_config(12345);

    let (trace1, result1) = traced_run(&config, 0);
    let (trace2, result2) = traced_run(&config, 0);

    assert!(!trace1.is_empty());
    assert_eq!(trace1, trace2);
    assert_eq!(format!("{trace1:?}"), format!("{trace2:?}"));
    assert_eq!(result1, result2);
    assert_eq!(
        format!("{:?}", result1.observations),
        format!("{:?}", result2.observations)
    );
}

/// Different replications of one batch draw from different streams.
#[test]
fn test_replications_differ() {
    let config = short_run_config(12345);
    let a = run_replication(&config, ReplicationId(0)).unwrap();
    let b = run_replication(&config, ReplicationId(1)).unwrap();
    assert_ne!(a.observations, b.observations);
}

/// Different seeds produce different runs.
#[test]
fn test_different_seeds_differ() {
    let a = run_replication(&short_run_config(1), ReplicationId(0)).unwrap();
    let b = run_replication(&short_run_config(2), ReplicationId(0)).unwrap();
    assert_ne!(a.observations, b.observations);
}

/// Replay the trace and check `busy <= capacity` after every pool change,
/// and that nobody queues while a unit is free.
#[test]
fn test_busy_never_exceeds_capacity() {
    for seed in [7, 8, 9] {
        let config = short_run_config(seed).with_staffing(1, 1, 2, 1);
        let (trace, _) = traced_run(&config, 0);

        let mut changes = 0;
        for entry in &trace {
            if let TraceEntry::Pool {
                service,
                busy,
                queue_len,
                ..
            } = *entry
            {
                let capacity = config.capacity(service);
                assert!(busy <= capacity, "{service}: busy {busy} > {capacity}");
                if queue_len > 0 {
                    assert_eq!(busy, capacity, "{service} queued with a free unit");
                }
                changes += 1;
            }
        }
        assert!(changes > 0);
    }
}

/// Clock never runs backwards across dispatched events.
#[test]
fn test_dispatch_times_are_monotonic() {
    let (trace, _) = traced_run(&short_run_config(99), 0);
    let times: Vec<_> = trace
        .iter()
        .filter_map(|e| match e {
            TraceEntry::Dispatched { time, .. } => Some(*time),
            TraceEntry::Pool { .. } => None,
        })
        .collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

/// Patients acquire a pool's units in the order they joined its queue.
#[test]
fn test_fcfs_per_pool() {
    let config = short_run_config(4242).with_staffing(1, 1, 1, 1);
    let (trace, _) = traced_run(&config, 0);

    let mut enqueued: HashMap<Service, Vec<u64>> = HashMap::new();
    let mut granted: HashMap<Service, Vec<u64>> = HashMap::new();
    for entry in &trace {
        if let TraceEntry::Pool {
            service,
            patient,
            transition,
            ..
        } = *entry
        {
            match transition {
                PoolTransition::Enqueued => enqueued.entry(service).or_default().push(patient.0),
                PoolTransition::HandedOff { to } => granted.entry(service).or_default().push(to.0),
                PoolTransition::Acquired | PoolTransition::Released => {}
            }
        }
    }

    assert!(
        enqueued.values().any(|q| q.len() > 1),
        "scenario should produce queueing"
    );
    for (service, grants) in &granted {
        let queued = &enqueued[service];
        assert_eq!(
            grants.as_slice(),
            &queued[..grants.len()],
            "{service} handed units out of queue order"
        );
    }
}

/// Every retained wait is non-negative and every stage starts after it is entered.
#[test]
fn test_waits_are_non_negative() {
    for replication in 0..4 {
        let result = run_replication(&short_run_config(31), ReplicationId(replication)).unwrap();
        assert!(!result.observations.is_empty());
        for obs in &result.observations {
            assert!(obs.wait_reception >= 0.0);
            assert!(obs.wait_triage >= 0.0);
            assert!(obs.wait_treatment >= 0.0);
            for stage in [obs.reception, obs.triage, obs.treatment] {
                assert!(stage.start >= stage.entry);
                assert!(stage.exit >= stage.start);
            }
            assert!(obs.reception.exit <= obs.triage.entry);
            assert!(obs.triage.exit <= obs.treatment.entry);
        }
    }
}

/// Nothing timestamped before the end of warm-up survives into the result.
#[test]
fn test_warm_up_truncation() {
    let config = short_run_config(5).with_warm_up(240.0);
    let result = run_replication(&config, ReplicationId(0)).unwrap();
    let warm_up_end = config.warm_up_end();

    assert!(result.stats.discarded_warm_up > 0);
    assert!(result
        .observations
        .iter()
        .all(|o| o.arrival_time >= warm_up_end));
    assert!(result
        .incomplete
        .iter()
        .all(|j| j.arrival_time >= warm_up_end));
    for series in &result.queues {
        assert!(series.samples.iter().all(|s| s.time >= warm_up_end));
        assert!(series.bins.iter().all(|b| b.start >= warm_up_end));
        assert_eq!(series.bins.len(), config.bin_count());
    }
}

/// Arrivals balance: every patient either departed or is still inside.
#[test]
fn test_patient_accounting() {
    let config = short_run_config(77).with_warm_up(0.0);
    let result = run_replication(&config, ReplicationId(0)).unwrap();
    let stats = &result.stats;

    assert_eq!(stats.arrivals, stats.departures + stats.incomplete);
    assert_eq!(result.observations.len() as u64, stats.departures);
    assert_eq!(result.incomplete.len() as u64, stats.incomplete);
}
