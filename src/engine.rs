//! Top-level simulation driver.
//!
//! The [`Simulation`] owns the virtual clock, the simulated actors, and the
//! classical link delays derived from the topology. Jobs enter through
//! [`Simulation::submit`]; [`Simulation::run_until`] then drains due events,
//! hands each to its target actor, and reschedules the actor's outgoing
//! events. A message event leaves its sender carrying the send time; the
//! driver adds the link delay before requeueing it. Wake events already carry
//! their absolute fire time and pass through unchanged.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::SimConfig;
use crate::controller::{Coordinator, SubmitError, SubmitReport};
use crate::event::{Event, EventPayload};
use crate::job::Job;
use crate::node::{SimNode, Worker};
use crate::routing::RoutingTables;
use crate::timeline::Timeline;
use crate::topology::{Role, TopologyError, TopologySpec};
use crate::types::{NodeName, Time};

/// Faults surfaced by the simulation driver.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The topology failed validation or routing derivation.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// A job failed partitioning or worker selection.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// No actor is registered under the coordinator's name.
    #[error("no coordinator actor named '{0}'")]
    MissingCoordinator(NodeName),
}

/// Statistics collected by the simulation driver.
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    /// Messages handed to their destination actor.
    pub messages_delivered: u64,
    /// Messages dropped for lack of a target actor or classical link.
    pub messages_dropped: u64,
}

/// The discrete-event simulation driver.
///
/// Actors are stored by name and matched against event targets; routers and
/// relays never appear here because the control plane does not address them.
///
/// # Example
///
/// ```ignore
/// let mut sim = Simulation::new(&topo, &config)?;
/// sim.submit(&job)?;
/// sim.run_until(4 * SECOND);
/// println!("{}", sim.export_stats());
/// ```
#[derive(Debug)]
pub struct Simulation {
    /// Simulated actors indexed by node name.
    nodes: BTreeMap<NodeName, SimNode>,
    /// The virtual clock and pending event queue.
    timeline: Timeline,
    /// sender -> receiver -> classical delay, snapshot of the routing tables.
    link_delays: BTreeMap<String, BTreeMap<String, Time>>,
    /// Name of the coordinator actor.
    coordinator: NodeName,
    /// Statistics.
    stats: EngineStats,
}

impl Simulation {
    /// Builds a simulation from a topology and a configuration.
    ///
    /// Validates the topology, derives routing tables, and instantiates one
    /// coordinator actor plus one worker actor per worker node. Router and
    /// relay nodes contribute to the routing tables but get no actor.
    ///
    /// # Arguments
    /// * `topo` - the network topology
    /// * `config` - simulation and scheduler parameters
    ///
    /// # Returns
    /// The ready simulation, or a [`SimulationError`] if the topology is
    /// malformed.
    pub fn new(topo: &TopologySpec, config: &SimConfig) -> Result<Self, SimulationError> {
        topo.validate()?;
        let tables = RoutingTables::build(topo, &config.delays)?;
        let link_delays = tables.link_delays.clone();

        let coordinator = topo
            .coordinator()
            .map(|spec| spec.name.clone())
            .ok_or(TopologyError::CoordinatorCount { found: 0 })?;

        let mut nodes = BTreeMap::new();
        nodes.insert(
            coordinator.clone(),
            SimNode::Coordinator(Coordinator::new(
                coordinator.clone(),
                tables,
                config.scheduler.qubits_per_worker,
                config.scheduler.routing_latency,
                config.scheduler.request,
            )),
        );
        for spec in &topo.nodes {
            if spec.role == Role::Worker {
                nodes.insert(
                    spec.name.clone(),
                    SimNode::Worker(Worker::new(
                        spec.name.clone(),
                        coordinator.clone(),
                        config.simulation.auto_respond,
                    )),
                );
            }
        }

        tracing::info!(
            actors = nodes.len(),
            coordinator = %coordinator,
            "simulation built"
        );

        Ok(Self {
            nodes,
            timeline: Timeline::new(),
            link_delays,
            coordinator,
            stats: EngineStats::default(),
        })
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Time {
        self.timeline.now()
    }

    /// Returns the number of events waiting on the clock.
    pub fn pending(&self) -> usize {
        self.timeline.pending()
    }

    /// Returns the number of simulated actors.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns an actor by name.
    pub fn node(&self, name: &str) -> Option<&SimNode> {
        self.nodes.get(name)
    }

    /// Returns the coordinator actor.
    pub fn coordinator(&self) -> Option<&Coordinator> {
        match self.nodes.get(&self.coordinator) {
            Some(SimNode::Coordinator(coordinator)) => Some(coordinator),
            _ => None,
        }
    }

    /// Returns the driver statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Submits a job to the coordinator at the current virtual time.
    ///
    /// Runs the coordinator's intake pipeline and schedules the resulting
    /// dispatch wakes on the clock.
    ///
    /// # Arguments
    /// * `job` - the job to submit
    ///
    /// # Returns
    /// The intake report, or a [`SimulationError`] if partitioning or worker
    /// selection fails.
    pub fn submit(&mut self, job: &Job) -> Result<SubmitReport, SimulationError> {
        let now = self.timeline.now();
        let (report, wakes) = match self.nodes.get_mut(&self.coordinator) {
            Some(SimNode::Coordinator(coordinator)) => coordinator.submit(job, now)?,
            _ => return Err(SimulationError::MissingCoordinator(self.coordinator.clone())),
        };
        for wake in wakes {
            self.timeline.schedule(wake);
        }

        tracing::info!(
            scheduled = report.scheduled.len(),
            rejected = report.rejected,
            workers = ?report.workers,
            "job submitted"
        );
        Ok(report)
    }

    /// Expires overdue dispatched requests at the current virtual time.
    ///
    /// Delegates to [`Coordinator::expire_overdue`]; returns the number of
    /// requests marked timed out.
    pub fn expire_overdue(&mut self) -> usize {
        let now = self.timeline.now();
        match self.nodes.get_mut(&self.coordinator) {
            Some(SimNode::Coordinator(coordinator)) => coordinator.expire_overdue(now),
            _ => 0,
        }
    }

    /// Runs the simulation up to and including `target`.
    ///
    /// Pops due events in timestamp order, hands each to its target actor,
    /// and requeues the actor's outgoing events with link delays applied.
    /// Events addressed to unknown actors are dropped and counted. The clock
    /// ends at `target` even when the queue drains early.
    ///
    /// # Arguments
    /// * `target` - virtual time to run until, inclusive
    pub fn run_until(&mut self, target: Time) {
        while let Some(event) = self.timeline.pop_due(target) {
            let now = event.time;
            let is_message = matches!(event.payload, EventPayload::Deliver { .. });
            let outgoing = match self.nodes.get_mut(&event.target) {
                Some(node) => {
                    if is_message {
                        self.stats.messages_delivered += 1;
                    }
                    node.handle(event, now)
                }
                None => {
                    if is_message {
                        self.stats.messages_dropped += 1;
                    }
                    tracing::warn!(target = %event.target, time = now, "event for unknown actor, dropping");
                    Vec::new()
                }
            };
            for event in outgoing {
                self.process_outgoing(event, now);
            }
        }
        self.timeline.advance_to(target);
    }

    /// Requeues one outgoing event, applying transport rules.
    ///
    /// Messages pick up the classical link delay from sender to receiver;
    /// a message with no declared link is dropped and counted. Wakes carry
    /// an absolute fire time and are scheduled as-is.
    fn process_outgoing(&mut self, mut event: Event, now: Time) {
        let src = match &event.payload {
            EventPayload::Wake { .. } => None,
            EventPayload::Deliver { src, .. } => Some(src.clone()),
        };
        let Some(src) = src else {
            self.timeline.schedule(event);
            return;
        };
        match self.link_delay(&src, &event.target) {
            Some(delay) => {
                event.time = now + delay;
                self.timeline.schedule(event);
            }
            None => {
                self.stats.messages_dropped += 1;
                tracing::warn!(src = %src, dst = %event.target, "no classical link for message, dropping");
            }
        }
    }

    fn link_delay(&self, src: &str, dst: &str) -> Option<Time> {
        self.link_delays
            .get(src)
            .and_then(|per_dst| per_dst.get(dst))
            .copied()
    }

    /// Exports statistics from the driver and all actors.
    pub fn export_stats(&self) -> serde_json::Value {
        let mut workers = serde_json::Map::new();
        let mut scheduler = serde_json::Value::Null;
        for (name, node) in &self.nodes {
            match node {
                SimNode::Worker(worker) => {
                    let stats = worker.stats();
                    workers.insert(
                        name.clone(),
                        serde_json::json!({
                            "requests_received": stats.requests_received,
                            "requests_completed": stats.requests_completed,
                            "active_requests": worker.active_requests(),
                        }),
                    );
                }
                SimNode::Coordinator(coordinator) => {
                    let stats = coordinator.stats();
                    scheduler = serde_json::json!({
                        "dispatched": stats.dispatched,
                        "acknowledged": stats.acknowledged,
                        "rejected": stats.rejected,
                        "timed_out": stats.timed_out,
                        "open_requests": coordinator.open_requests(),
                    });
                }
            }
        }

        serde_json::json!({
            "engine": {
                "current_time": self.timeline.now(),
                "events_processed": self.timeline.events_processed(),
                "peak_queue_depth": self.timeline.peak_queue_depth(),
                "pending_events": self.timeline.pending(),
                "messages_delivered": self.stats.messages_delivered,
                "messages_dropped": self.stats.messages_dropped,
                "actor_count": self.nodes.len(),
            },
            "scheduler": scheduler,
            "workers": workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::config::SimConfigBuilder;
    use crate::controller::RequestState;
    use crate::types::{MICROSECOND, SECOND};

    // Two workers joined by one relay, with classical links back to the
    // coordinator and between the workers.
    fn two_worker_topology() -> TopologySpec {
        TopologySpec::new()
            .with_node("ctl", Role::Coordinator)
            .with_node("a", Role::Worker)
            .with_node("b", Role::Worker)
            .with_node("bsm.a.b", Role::Relay)
            .with_quantum_link("a", "bsm.a.b", 1_000.0)
            .with_quantum_link("b", "bsm.a.b", 1_000.0)
            .with_classical_connection("ctl", "a", 1_000.0)
            .with_classical_connection("ctl", "b", 1_000.0)
            .with_classical_connection("a", "b", 2_000.0)
    }

    fn config() -> SimConfig {
        SimConfigBuilder::new()
            .qubits_per_worker(2)
            .build()
            .unwrap()
    }

    fn cross_worker_job() -> Job {
        // QFT over four qubits splits into two partitions of two.
        Job {
            circuit: Circuit::qft(4),
            start: SECOND,
            end: 2 * SECOND,
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(&two_worker_topology(), &config()).unwrap();

        // Actors: the coordinator and both workers; the relay gets none.
        assert_eq!(sim.node_count(), 3);
        assert_eq!(sim.now(), 0);
        assert_eq!(sim.pending(), 0);
        assert!(sim.node("a").is_some());
        assert!(sim.node("bsm.a.b").is_none());
        assert_eq!(sim.coordinator().unwrap().name(), "ctl");
    }

    #[test]
    fn test_invalid_topology_rejected() {
        // No coordinator node at all.
        let topo = TopologySpec::new().with_node("a", Role::Worker);
        let err = Simulation::new(&topo, &config()).unwrap_err();
        assert!(matches!(err, SimulationError::Topology(_)));
    }

    #[test]
    fn test_submit_schedules_dispatch_wake() {
        let mut sim = Simulation::new(&two_worker_topology(), &config()).unwrap();

        let report = sim.submit(&cross_worker_job()).unwrap();

        assert_eq!(report.workers, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.scheduled.len(), 1);
        assert_eq!(report.rejected, 0);
        // One dispatch wake waiting on the clock.
        assert_eq!(sim.pending(), 1);
    }

    #[test]
    fn test_submit_too_many_partitions() {
        let mut sim = Simulation::new(&two_worker_topology(), &config()).unwrap();

        // Eight qubits in groups of two need four workers; only two exist.
        let job = Job {
            circuit: Circuit::qft(8),
            start: SECOND,
            end: 2 * SECOND,
        };
        let err = sim.submit(&job).unwrap_err();
        assert!(matches!(err, SimulationError::Submit(_)));
    }

    #[test]
    fn test_end_to_end_request_lifecycle() {
        let mut sim = Simulation::new(&two_worker_topology(), &config()).unwrap();

        let report = sim.submit(&cross_worker_job()).unwrap();
        let seq = report.scheduled[0];

        sim.run_until(3 * SECOND);

        // The request was dispatched, served, and acknowledged.
        let coordinator = sim.coordinator().unwrap();
        let tracked = coordinator.tracked(seq).unwrap();
        assert_eq!(tracked.state, RequestState::Acknowledged);
        // QFT(4) across two workers crosses the cut four times.
        let outcome = tracked.outcome.clone().unwrap();
        assert_eq!(outcome.pairs_generated, 4);

        let stats = coordinator.stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.acknowledged, 1);
        assert_eq!(stats.timed_out, 0);

        // REQUEST to the source worker plus RESPOND back.
        assert_eq!(sim.stats().messages_delivered, 2);
        assert_eq!(sim.stats().messages_dropped, 0);
        assert_eq!(sim.pending(), 0);
        assert_eq!(sim.now(), 3 * SECOND);
    }

    #[test]
    fn test_worker_sees_request_after_link_delay() {
        let mut sim = Simulation::new(&two_worker_topology(), &config()).unwrap();
        sim.submit(&cross_worker_job()).unwrap();

        // Dispatch fires at start - routing latency; the request message then
        // rides the ctl->a link: 1 km at 2e-4 m/ps is 5 us, plus the fixed
        // 100 us overhead.
        let dispatch = SECOND - SECOND / 100;
        sim.run_until(dispatch);
        let a = match sim.node("a").unwrap() {
            SimNode::Worker(w) => w,
            _ => panic!("expected worker"),
        };
        assert_eq!(a.stats().requests_received, 0);

        sim.run_until(dispatch + 105 * MICROSECOND);
        let a = match sim.node("a").unwrap() {
            SimNode::Worker(w) => w,
            _ => panic!("expected worker"),
        };
        assert_eq!(a.stats().requests_received, 1);
        assert_eq!(a.active_requests(), 1);
    }

    #[test]
    fn test_missing_reverse_link_drops_response() {
        // Classical path ctl->a only; the response a->ctl has no link.
        let topo = TopologySpec::new()
            .with_node("ctl", Role::Coordinator)
            .with_node("a", Role::Worker)
            .with_node("b", Role::Worker)
            .with_node("bsm.a.b", Role::Relay)
            .with_quantum_link("a", "bsm.a.b", 1_000.0)
            .with_quantum_link("b", "bsm.a.b", 1_000.0)
            .with_classical_link("ctl", "a", 1_000.0)
            .with_classical_link("ctl", "b", 1_000.0)
            .with_classical_connection("a", "b", 2_000.0);
        let mut sim = Simulation::new(&topo, &config()).unwrap();

        let report = sim.submit(&cross_worker_job()).unwrap();
        let seq = report.scheduled[0];
        sim.run_until(3 * SECOND);

        // The request reached the worker but the response went nowhere.
        assert_eq!(sim.stats().messages_delivered, 1);
        assert_eq!(sim.stats().messages_dropped, 1);
        let tracked = sim.coordinator().unwrap().tracked(seq).unwrap();
        assert_eq!(tracked.state, RequestState::Dispatched);

        // The overdue sweep then times the request out.
        assert_eq!(sim.expire_overdue(), 1);
        let tracked = sim.coordinator().unwrap().tracked(seq).unwrap();
        assert_eq!(tracked.state, RequestState::TimedOut);
    }

    #[test]
    fn test_export_stats() {
        let mut sim = Simulation::new(&two_worker_topology(), &config()).unwrap();
        sim.submit(&cross_worker_job()).unwrap();
        sim.run_until(3 * SECOND);

        let stats = sim.export_stats();
        assert_eq!(stats["engine"]["current_time"], 3 * SECOND);
        assert_eq!(stats["engine"]["messages_delivered"], 2);
        assert_eq!(stats["engine"]["actor_count"], 3);
        assert_eq!(stats["scheduler"]["acknowledged"], 1);
        assert_eq!(stats["scheduler"]["open_requests"], 0);
        assert_eq!(stats["workers"]["a"]["requests_completed"], 1);
        assert_eq!(stats["workers"]["b"]["requests_received"], 0);
    }
}
