//! End-to-end patient-flow scenarios.

use edflow_core::{EventKind, VariateSource};
use edflow_simulation::{
    run_replication, PoolTransition, RandomStreams, ReplicationRunner, TraceEntry,
};
use edflow_test_helpers::{short_run_config, single_server_config, ScriptedVariates};
use edflow_types::{PatientId, ReplicationId, Service, SimConfig, SimTime, Ward};

fn at(minutes: f64) -> SimTime {
    SimTime::from_minutes(minutes)
}

/// Time at which `patient` acquired a unit of `service`, from the trace.
fn acquisition_time(trace: &[TraceEntry], service: Service, patient: PatientId) -> Option<SimTime> {
    trace.iter().find_map(|entry| match *entry {
        TraceEntry::Pool {
            time,
            service: s,
            patient: p,
            transition: PoolTransition::Acquired,
            ..
        } if s == service && p == patient => Some(time),
        TraceEntry::Pool {
            time,
            service: s,
            transition: PoolTransition::HandedOff { to },
            ..
        } if s == service && to == patient => Some(time),
        _ => None,
    })
}

/// Time at which `patient`'s first event of `kind` was dispatched.
fn dispatch_time(trace: &[TraceEntry], kind: EventKind, patient: PatientId) -> Option<SimTime> {
    trace.iter().find_map(|entry| match *entry {
        TraceEntry::Dispatched {
            time,
            kind: k,
            patient: p,
        } if k == kind && p == patient => Some(time),
        _ => None,
    })
}

/// A lone patient at t=0 takes the free receptionist at once and leaves
/// reception after the first Exp(mean 2) draw of the replication's stream.
#[test]
fn test_single_patient_no_contention() {
    let config = single_server_config()
        .with_mean_service_time(Service::Registration, 2.0)
        .with_sim_duration(10_000.0);
    let mut runner = ReplicationRunner::new(&config, ReplicationId(0))
        .unwrap()
        .with_trace();
    let patient = runner.schedule_arrival(at(0.0)).unwrap();
    runner.run().unwrap();

    let mut expected = RandomStreams::new(&config, ReplicationId(0)).unwrap();
    let reception_time = expected.next_service_time(Service::Registration);

    let trace = runner.trace().unwrap();
    assert_eq!(
        acquisition_time(trace, Service::Registration, patient),
        Some(at(0.0))
    );
    assert_eq!(
        dispatch_time(trace, EventKind::ReceptionDone, patient),
        Some(at(0.0) + reception_time)
    );

    let result = runner.finish().unwrap();
    assert_eq!(result.observations.len(), 1);
    assert_eq!(result.observations[0].wait_reception, 0.0);
    assert_eq!(result.observations[0].reception.exit, at(reception_time));
}

/// Two patients at t=0 and t=0.5 share one receptionist: the second starts
/// exactly when the first finishes.
#[test]
fn test_second_patient_waits_for_receptionist() {
    let config = single_server_config();
    let variates = ScriptedVariates::new()
        .with_service_times(Service::Registration, [2.0, 1.5])
        .with_service_times(Service::Triage, [1.0, 1.0]);
    let mut runner = ReplicationRunner::with_variates(&config, ReplicationId(0), variates)
        .unwrap()
        .with_trace();
    let first = runner.schedule_arrival(at(0.0)).unwrap();
    let second = runner.schedule_arrival(at(0.5)).unwrap();
    runner.run().unwrap();

    let trace = runner.trace().unwrap();
    let first_done = dispatch_time(trace, EventKind::ReceptionDone, first).unwrap();
    let second_start = acquisition_time(trace, Service::Registration, second).unwrap();
    assert_eq!(first_done, at(2.0));
    assert_eq!(second_start, first_done);

    let result = runner.finish().unwrap();
    let waits: Vec<f64> = result.observations.iter().map(|o| o.wait_reception).collect();
    assert_eq!(waits, vec![0.0, 1.5]);
}

/// Same contention with random service times: the second start is never
/// before the first completion, and never before its own arrival.
#[test]
fn test_no_preemption_with_random_service() {
    for replication in 0..20 {
        let config = single_server_config().with_sim_duration(10_000.0);
        let mut runner = ReplicationRunner::new(&config, ReplicationId(replication))
            .unwrap()
            .with_trace();
        let first = runner.schedule_arrival(at(0.0)).unwrap();
        let second = runner.schedule_arrival(at(0.5)).unwrap();
        runner.run().unwrap();

        let trace = runner.trace().unwrap();
        let first_done = dispatch_time(trace, EventKind::ReceptionDone, first).unwrap();
        let second_start = acquisition_time(trace, Service::Registration, second).unwrap();
        assert_eq!(second_start, first_done.max(at(0.5)));
    }
}

/// With `p_ed = 1.0` nobody is ever routed to the ACU.
#[test]
fn test_all_patients_routed_to_ed() {
    let config = short_run_config(2024).with_p_ed(1.0);
    for replication in 0..config.n_sims {
        let result = run_replication(&config, ReplicationId(replication)).unwrap();

        assert!(!result.observations.is_empty());
        assert!(result.observations.iter().all(|o| o.ward == Ward::Ed));
        assert!(result
            .incomplete
            .iter()
            .all(|j| j.ward != Some(Ward::Acu)));
        assert!(result.queue(Service::Acu).samples.is_empty());
        assert_eq!(result.queue(Service::Acu).utilisation, 0.0);
    }
}

/// With `p_ed = 0.0` everybody goes to the ACU.
#[test]
fn test_all_patients_routed_to_acu() {
    let config = short_run_config(2024).with_p_ed(0.0);
    let result = run_replication(&config, ReplicationId(0)).unwrap();
    assert!(result.observations.iter().all(|o| o.ward == Ward::Acu));
    assert!(result.queue(Service::Ed).samples.is_empty());
}

/// A queue builds behind a single slow doctor and is visible in the bins.
#[test]
fn test_overloaded_ward_builds_queue() {
    let config = SimConfig::new()
        .with_staffing(3, 3, 1, 1)
        .with_inter_arrival_time(2.0)
        .with_mean_service_time(Service::Ed, 20.0)
        .with_p_ed(1.0)
        .with_warm_up(0.0)
        .with_sim_duration(600.0)
        .with_bin_size(100.0);
    let result = run_replication(&config, ReplicationId(0)).unwrap();

    let ed = result.queue(Service::Ed);
    assert_eq!(ed.bins.len(), 6);
    assert!(ed.bins.last().unwrap().mean_queue_len > ed.bins[0].mean_queue_len);
    assert!(ed.utilisation > 0.9);
    assert!(result.stats.incomplete > 0);
}

/// A measured window that is not a whole number of bins still yields
/// positive-width bins with finite means.
#[test]
fn test_fractional_bin_grid_end_to_end() {
    let config = single_server_config()
        .with_sim_duration(2.1)
        .with_bin_size(0.3);
    let result = run_replication(&config, ReplicationId(0)).unwrap();

    for series in &result.queues {
        assert_eq!(series.bins.len(), config.bin_count());
        assert_eq!(series.bins.last().unwrap().end, config.horizon());
        for bin in &series.bins {
            assert!(bin.start < bin.end, "{}: empty bin at {}", series.service, bin.start);
            assert!(bin.mean_queue_len.is_finite());
        }
        assert!(series.utilisation.is_finite());
    }
}
