//! The coordinator: job intake pipeline and request scheduling.
//!
//! The [`Coordinator`] owns the routing tables (and through them the router
//! graph snapshot), the request ledger, and the sequence counter; nothing
//! here is global. A submitted job flows partition -> worker selection ->
//! request translation -> scheduling, and each resulting request is tracked
//! through the state machine
//! `Pending -> Dispatched -> (Acknowledged | TimedOut)`.
//!
//! Dispatch works in two phases: enqueueing reserves the sequence number
//! and a wake on the virtual clock at `start - routing_latency`; the wake
//! then constructs the REQUEST message and sends it to the request's source
//! worker. Sequence numbers are correlation keys only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::circuit::CircuitError;
use crate::event::Event;
use crate::job::Job;
use crate::message::{ControlMessage, RequestOutcome};
use crate::requests::{translate, Request, RequestParams};
use crate::routing::RoutingTables;
use crate::select::{select_workers, SelectionError};
use crate::types::{NodeName, Time, SECOND};

/// Default lead time between dispatching a request and its start.
pub const DEFAULT_ROUTING_LATENCY: Time = SECOND / 100;

/// Errors that reject a single request at enqueue time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The request starts too soon for its dispatch to be scheduled.
    #[error("request starting at {start} cannot be dispatched {latency} early at virtual time {now}")]
    InsufficientLeadTime {
        /// Declared request start.
        start: Time,
        /// Virtual time at enqueue.
        now: Time,
        /// Configured routing latency.
        latency: Time,
    },
}

/// Errors that abort a whole job submission.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The job's circuit cannot be partitioned.
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// No worker set can serve the job's partitions.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Lifecycle of a tracked request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    /// Enqueued, dispatch wake not yet fired.
    Pending,
    /// REQUEST sent to the source worker, awaiting RESPOND.
    Dispatched,
    /// A correlated RESPOND arrived.
    Acknowledged,
    /// Explicitly expired after its window passed without a RESPOND.
    TimedOut,
}

/// A request plus its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedRequest {
    /// The immutable request.
    pub request: Request,
    /// Current lifecycle state.
    pub state: RequestState,
    /// Worker outcome, present once acknowledged.
    pub outcome: Option<RequestOutcome>,
}

/// What a job submission scheduled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitReport {
    /// Workers selected for the job, by partition index.
    pub workers: Vec<NodeName>,
    /// Sequence numbers of the requests that were scheduled.
    pub scheduled: Vec<u64>,
    /// Requests rejected for insufficient lead time.
    pub rejected: usize,
}

/// Scheduling counters, exported with the simulation stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// REQUEST messages sent.
    pub dispatched: u64,
    /// RESPOND messages matched to a dispatched request.
    pub acknowledged: u64,
    /// Requests rejected at enqueue.
    pub rejected: u64,
    /// Requests expired by [`Coordinator::expire_overdue`].
    pub timed_out: u64,
}

/// The centralized control-plane node.
#[derive(Debug)]
pub struct Coordinator {
    name: NodeName,
    tables: RoutingTables,
    qubits_per_worker: usize,
    routing_latency: Time,
    params: RequestParams,
    next_seq: u64,
    requests: BTreeMap<u64, TrackedRequest>,
    stats: SchedulerStats,
}

impl Coordinator {
    /// Creates a coordinator owning the given routing tables.
    ///
    /// # Arguments
    /// * `name` - the coordinator's node name
    /// * `tables` - routing tables built from the topology
    /// * `qubits_per_worker` - partition group size
    /// * `routing_latency` - dispatch lead time before each request's start
    /// * `params` - fixed per-request parameters
    pub fn new(
        name: impl Into<NodeName>,
        tables: RoutingTables,
        qubits_per_worker: usize,
        routing_latency: Time,
        params: RequestParams,
    ) -> Self {
        Self {
            name: name.into(),
            tables,
            qubits_per_worker,
            routing_latency,
            params,
            next_seq: 0,
            requests: BTreeMap::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// The coordinator's node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The routing tables this coordinator retained at topology build.
    pub fn tables(&self) -> &RoutingTables {
        &self.tables
    }

    /// Scheduling counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Looks up a tracked request by sequence number.
    pub fn tracked(&self, seq: u64) -> Option<&TrackedRequest> {
        self.requests.get(&seq)
    }

    /// Runs the intake pipeline for one job and schedules its requests.
    ///
    /// Partitions the circuit, selects one worker per partition, translates
    /// cross-worker interactions into requests, and enqueues each request.
    /// A request without enough lead time is rejected and logged without
    /// affecting its siblings. The returned wake events must be scheduled
    /// on the virtual clock by the caller.
    ///
    /// # Arguments
    /// * `job` - the job to submit
    /// * `now` - current virtual time
    ///
    /// # Returns
    /// The report and the dispatch wakes, or a [`SubmitError`] if
    /// partitioning or selection fails.
    pub fn submit(
        &mut self,
        job: &Job,
        now: Time,
    ) -> Result<(SubmitReport, Vec<Event>), SubmitError> {
        let partitions = job.circuit.partition(self.qubits_per_worker)?;
        let selection = select_workers(&self.tables.graph, partitions.len())?;
        let requests = translate(job, &partitions, &selection.workers, &self.params);

        tracing::debug!(
            workers = ?selection.workers,
            requests = requests.len(),
            job_start = job.start,
            "job translated"
        );

        let mut report = SubmitReport {
            workers: selection.workers,
            scheduled: Vec::with_capacity(requests.len()),
            rejected: 0,
        };
        let mut wakes = Vec::with_capacity(requests.len());
        for request in requests {
            match self.enqueue_request(request, now) {
                Ok((seq, wake)) => {
                    report.scheduled.push(seq);
                    wakes.push(wake);
                }
                Err(err) => {
                    report.rejected += 1;
                    tracing::warn!(error = %err, "request rejected");
                }
            }
        }
        Ok((report, wakes))
    }

    /// Enqueues one request, reserving its sequence number.
    ///
    /// The dispatch time is `request.start - routing_latency`; a request
    /// whose dispatch would fall before the current virtual time is
    /// rejected. On success the returned wake event, once fired, makes the
    /// coordinator emit the REQUEST message.
    pub fn enqueue_request(
        &mut self,
        request: Request,
        now: Time,
    ) -> Result<(u64, Event), ScheduleError> {
        let dispatch = request
            .start
            .checked_sub(self.routing_latency)
            .filter(|&dispatch| dispatch >= now)
            .ok_or(ScheduleError::InsufficientLeadTime {
                start: request.start,
                now,
                latency: self.routing_latency,
            });
        let dispatch = match dispatch {
            Ok(dispatch) => dispatch,
            Err(err) => {
                self.stats.rejected += 1;
                return Err(err);
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.requests.insert(
            seq,
            TrackedRequest {
                request,
                state: RequestState::Pending,
                outcome: None,
            },
        );
        Ok((seq, Event::wake(dispatch, self.name.clone(), seq)))
    }

    /// Fires the dispatch for a previously enqueued request.
    ///
    /// Constructs the REQUEST message and addresses it to the request's
    /// source worker. Wakes for unknown or already-dispatched sequence
    /// numbers are ignored.
    pub fn dispatch(&mut self, seq: u64, now: Time) -> Vec<Event> {
        let Some(tracked) = self.requests.get_mut(&seq) else {
            tracing::debug!(seq, "wake for unknown request, ignoring");
            return Vec::new();
        };
        if tracked.state != RequestState::Pending {
            tracing::debug!(seq, state = ?tracked.state, "wake for non-pending request, ignoring");
            return Vec::new();
        }
        tracked.state = RequestState::Dispatched;
        self.stats.dispatched += 1;

        let message = ControlMessage::request(seq, tracked.request.clone());
        tracing::debug!(seq, worker = %tracked.request.src, "dispatching request");
        vec![Event::deliver(
            now,
            self.name.clone(),
            tracked.request.src.clone(),
            message,
        )]
    }

    /// Records a worker's RESPOND for a dispatched request.
    ///
    /// Uncorrelated or repeated responds are logged and dropped.
    pub fn acknowledge(&mut self, seq: u64, outcome: RequestOutcome) {
        match self.requests.get_mut(&seq) {
            Some(tracked) if tracked.state == RequestState::Dispatched => {
                tracked.state = RequestState::Acknowledged;
                tracked.outcome = Some(outcome);
                self.stats.acknowledged += 1;
            }
            Some(tracked) => {
                tracing::warn!(seq, state = ?tracked.state, "respond for non-dispatched request, ignoring");
            }
            None => {
                tracing::warn!(seq, "respond with unknown sequence number, ignoring");
            }
        }
    }

    /// Expires dispatched requests whose window ended before `now`.
    ///
    /// This sweep is opt-in maintenance: nothing schedules it automatically,
    /// and a request that never receives a RESPOND simply stays dispatched
    /// until the next sweep.
    ///
    /// # Returns
    /// How many requests were moved to [`RequestState::TimedOut`].
    pub fn expire_overdue(&mut self, now: Time) -> usize {
        let mut expired = 0;
        for (seq, tracked) in self.requests.iter_mut() {
            if tracked.state == RequestState::Dispatched && tracked.request.end < now {
                tracked.state = RequestState::TimedOut;
                self.stats.timed_out += 1;
                expired += 1;
                tracing::warn!(seq, end = tracked.request.end, "request expired without respond");
            }
        }
        expired
    }

    /// Number of requests currently pending or dispatched.
    pub fn open_requests(&self) -> usize {
        self.requests
            .values()
            .filter(|t| matches!(t.state, RequestState::Pending | RequestState::Dispatched))
            .count()
    }
}
