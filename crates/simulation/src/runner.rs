//! Deterministic replication runner.
//!
//! One runner owns everything a replication touches: the clock and event
//! queue, the four staff pools, the random streams and the patients in the
//! department. Patients are state machines; the runner delivers their inputs
//! and executes the actions they return. Grants caused by a release are
//! delivered through a work queue in the same dispatch step, so a long chain
//! of hand-offs never recurses.

use crate::event_queue::{EventKey, EventScheduler};
use crate::patient::PatientProcess;
use crate::resource::{RequestOutcome, ResourcePool};
use crate::result::{QueueSeries, ReplicationResult};
use crate::streams::RandomStreams;
use edflow_core::{
    Action, ArrivalSource, Event, EventKind, InvariantViolation, PatientInput, SimulationError,
    StateMachine, VariateSource,
};
use edflow_types::{Observation, PatientId, ReplicationId, Service, SimConfig, SimTime};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, trace};

/// Statistics collected during a replication.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationStats {
    /// Total events dispatched.
    pub events_processed: u64,
    /// Patients that walked in, warm-up included.
    pub arrivals: u64,
    /// Patients that left, warm-up included.
    pub departures: u64,
    /// Departures dropped because the patient arrived during warm-up.
    pub discarded_warm_up: u64,
    /// Patients still in the department at the horizon that arrived after warm-up.
    pub incomplete: u64,
    /// Requests that had to queue.
    pub requests_queued: u64,
}

/// What happened to a pool in a traced transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTransition {
    /// The requesting patient took a free unit.
    Acquired,
    /// The requesting patient joined the queue.
    Enqueued,
    /// A unit became free.
    Released,
    /// A released unit went straight to a waiting patient.
    HandedOff { to: PatientId },
}

/// One line of the optional event trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceEntry {
    /// An event was popped and dispatched.
    Dispatched {
        time: SimTime,
        kind: EventKind,
        patient: PatientId,
    },
    /// A pool changed state. `busy` and `queue_len` are after the change.
    Pool {
        time: SimTime,
        service: Service,
        patient: PatientId,
        transition: PoolTransition,
        busy: u32,
        queue_len: usize,
    },
}

/// Deterministic single-replication runner.
///
/// Given the same configuration, replication id and variate source, produces
/// identical traces and results every run.
pub struct ReplicationRunner<V = RandomStreams> {
    config: SimConfig,
    replication: ReplicationId,

    /// Event queue and clock.
    scheduler: EventScheduler,

    /// One pool per service, indexed by [`Service::index`].
    pools: Vec<ResourcePool>,

    /// All randomness for this replication.
    variates: V,

    /// Patients currently in the department.
    patients: BTreeMap<PatientId, PatientProcess>,

    /// Id for the next arrival.
    next_patient: PatientId,

    /// Departed patients that arrived after warm-up.
    observations: Vec<Observation>,

    stats: SimulationStats,

    /// Event trace, when enabled.
    trace: Option<Vec<TraceEntry>>,
}

impl ReplicationRunner<RandomStreams> {
    /// Create a runner drawing from the replication's own random stream.
    pub fn new(config: &SimConfig, replication: ReplicationId) -> Result<Self, SimulationError> {
        let streams = RandomStreams::new(config, replication)?;
        Self::with_variates(config, replication, streams)
    }
}

impl<V: VariateSource> ReplicationRunner<V> {
    /// Create a runner around an explicit variate source. Fails on an invalid
    /// configuration before anything is scheduled.
    pub fn with_variates(
        config: &SimConfig,
        replication: ReplicationId,
        variates: V,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let pools = Service::ALL
            .iter()
            .map(|&service| ResourcePool::new(service, config.capacity(service)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config: config.clone(),
            replication,
            scheduler: EventScheduler::new(),
            pools,
            variates,
            patients: BTreeMap::new(),
            next_patient: PatientId::FIRST,
            observations: Vec::new(),
            stats: SimulationStats::default(),
            trace: None,
        })
    }

    /// Record every dispatched event and pool transition.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn replication(&self) -> ReplicationId {
        self.replication
    }

    /// Get the current simulation time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// The pool behind `service`.
    pub fn pool(&self, service: Service) -> &ResourcePool {
        &self.pools[service.index()]
    }

    /// Retained observations so far.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The event trace, if enabled.
    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }

    /// Start the arrival process: the first patient arrives after one
    /// inter-arrival draw.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        let delay = self.variates.next_inter_arrival();
        let time = self.scheduler.now() + delay;
        let patient = self.schedule_arrival_event(time, ArrivalSource::Generated)?;
        debug!(
            replication = self.replication.get(),
            first_arrival = time.as_minutes(),
            patient = patient.0,
            "Scheduled first arrival"
        );
        Ok(())
    }

    /// Inject one arrival at a fixed time. It does not schedule a successor.
    pub fn schedule_arrival(&mut self, time: SimTime) -> Result<PatientId, SimulationError> {
        self.schedule_arrival_event(time, ArrivalSource::Scripted)
    }

    /// Run to the configured horizon.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        self.run_until(self.config.horizon())
    }

    /// Run until no more events or time limit reached.
    ///
    /// The limit is capped at the horizon. The clock always ends at the limit,
    /// even when the queue drained earlier.
    pub fn run_until(&mut self, end_time: SimTime) -> Result<(), SimulationError> {
        let end_time = end_time.min(self.config.horizon());
        trace!(end_time = end_time.as_minutes(), "Running replication");

        while let Some((key, event)) = self.scheduler.pop_next(end_time)? {
            self.stats.events_processed += 1;
            trace!(
                time = key.time.as_minutes(),
                kind = event.kind.type_name(),
                patient = event.patient.0,
                "Processing event"
            );
            if let Some(trace) = self.trace.as_mut() {
                trace.push(TraceEntry::Dispatched {
                    time: key.time,
                    kind: event.kind,
                    patient: event.patient,
                });
            }

            match event.kind {
                EventKind::Arrival(source) => self.on_arrival(event.patient, source)?,
                kind => self.deliver(event.patient, PatientInput::from(kind))?,
            }
        }

        if !self.scheduler.is_empty() {
            debug!(
                remaining_events = self.scheduler.len(),
                "Time limit reached"
            );
        }
        self.scheduler.advance_to(end_time);
        Ok(())
    }

    /// Run whatever is left up to the horizon and collect the result.
    pub fn finish(mut self) -> Result<ReplicationResult, SimulationError> {
        self.run()?;

        let warm_up_end = self.config.warm_up_end();
        let incomplete: Vec<_> = std::mem::take(&mut self.patients)
            .into_values()
            .filter(|p| p.arrival_time() >= warm_up_end)
            .map(PatientProcess::into_incomplete)
            .collect();
        self.stats.incomplete = incomplete.len() as u64;

        let queues = self
            .pools
            .iter()
            .map(|pool| {
                QueueSeries::from_change_log(
                    pool.service(),
                    pool.capacity(),
                    pool.samples(),
                    &self.config,
                )
            })
            .collect();

        info!(
            replication = self.replication.get(),
            events = self.stats.events_processed,
            arrivals = self.stats.arrivals,
            observations = self.observations.len(),
            incomplete = self.stats.incomplete,
            discarded_warm_up = self.stats.discarded_warm_up,
            "Replication complete"
        );

        Ok(ReplicationResult {
            replication: self.replication,
            observations: self.observations,
            incomplete,
            queues,
            stats: self.stats,
            warm_up_end,
            horizon: self.config.horizon(),
        })
    }

    fn schedule_arrival_event(
        &mut self,
        time: SimTime,
        source: ArrivalSource,
    ) -> Result<PatientId, SimulationError> {
        let patient = self.next_patient;
        self.next_patient = patient.next();
        self.schedule_event(time, Event::new(EventKind::Arrival(source), patient))?;
        Ok(patient)
    }

    /// Schedule an event.
    fn schedule_event(&mut self, time: SimTime, event: Event) -> Result<EventKey, SimulationError> {
        Ok(self.scheduler.push(time, event)?)
    }

    fn on_arrival(&mut self, patient: PatientId, source: ArrivalSource) -> Result<(), SimulationError> {
        let now = self.scheduler.now();
        if source == ArrivalSource::Generated {
            let delay = self.variates.next_inter_arrival();
            self.schedule_arrival_event(now + delay, ArrivalSource::Generated)?;
        }

        self.stats.arrivals += 1;
        self.patients.insert(patient, PatientProcess::new(patient, now));
        self.deliver(patient, PatientInput::Arrived)
    }

    /// Deliver an input, then every grant it causes, in FIFO order.
    fn deliver(&mut self, patient: PatientId, input: PatientInput) -> Result<(), SimulationError> {
        let now = self.scheduler.now();
        let mut work = VecDeque::from([(patient, input)]);

        while let Some((id, input)) = work.pop_front() {
            let process = self
                .patients
                .get_mut(&id)
                .ok_or(InvariantViolation::UnknownPatient(id))?;
            process.set_time(now);
            let actions = process.handle(input, &mut self.variates)?;

            for action in actions {
                self.execute(id, action, &mut work)?;
            }
        }

        Ok(())
    }

    fn execute(
        &mut self,
        patient: PatientId,
        action: Action,
        work: &mut VecDeque<(PatientId, PatientInput)>,
    ) -> Result<(), SimulationError> {
        let now = self.scheduler.now();
        trace!(patient = patient.0, action = action.type_name(), "Executing action");

        match action {
            Action::Request(service) => {
                let outcome = self.pools[service.index()].request(patient, now);
                let transition = match outcome {
                    RequestOutcome::Acquired => {
                        work.push_back((patient, PatientInput::Acquired(service)));
                        PoolTransition::Acquired
                    }
                    RequestOutcome::Enqueued { position } => {
                        self.stats.requests_queued += 1;
                        trace!(patient = patient.0, %service, position, "Queued");
                        PoolTransition::Enqueued
                    }
                };
                self.record_pool(service, patient, transition);
            }

            Action::Release(service) => {
                let next = self.pools[service.index()].release(now)?;
                let transition = match next {
                    Some(to) => {
                        work.push_back((to, PatientInput::Acquired(service)));
                        PoolTransition::HandedOff { to }
                    }
                    None => PoolTransition::Released,
                };
                self.record_pool(service, patient, transition);
            }

            Action::Schedule { delay, kind } => {
                self.schedule_event(now + delay, Event::new(kind, patient))?;
            }

            Action::Depart(observation) => {
                self.patients.remove(&patient);
                self.stats.departures += 1;
                if observation.arrival_time >= self.config.warm_up_end() {
                    self.observations.push(observation);
                } else {
                    self.stats.discarded_warm_up += 1;
                }
            }
        }

        Ok(())
    }

    fn record_pool(&mut self, service: Service, patient: PatientId, transition: PoolTransition) {
        let Some(trace) = self.trace.as_mut() else {
            return;
        };
        let pool = &self.pools[service.index()];
        trace.push(TraceEntry::Pool {
            time: self.scheduler.now(),
            service,
            patient,
            transition,
            busy: pool.busy(),
            queue_len: pool.queue_len(),
        });
    }
}

/// Run one complete replication with its own random stream.
pub fn run_replication(
    config: &SimConfig,
    replication: ReplicationId,
) -> Result<ReplicationResult, SimulationError> {
    let mut runner = ReplicationRunner::new(config, replication)?;
    runner.initialize()?;
    runner.finish()
}
