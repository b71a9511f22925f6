//! Simulated actors: workers and the coordinator behind one closed enum.
//!
//! Only workers and the coordinator react to events; routers and relays are
//! pure topology and never appear here. Dispatch is a `match`, not dynamic
//! dispatch, so the set of actor behaviors is closed and checkable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::controller::Coordinator;
use crate::event::{Event, EventPayload};
use crate::message::{ControlMessage, RequestOutcome};
use crate::requests::Request;
use crate::types::{NodeName, Time};

/// Per-worker counters, exported with the simulation stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// REQUEST messages received.
    pub requests_received: u64,
    /// Requests completed and responded to.
    pub requests_completed: u64,
}

/// A worker node serving entanglement-generation requests.
///
/// On a REQUEST the worker records the work item; with `auto_respond` set it
/// also schedules a wake at the request's end time and sends the RESPOND
/// back to the coordinator when the wake fires. Without `auto_respond` the
/// work item just accumulates, which models a worker that never reports.
#[derive(Debug)]
pub struct Worker {
    name: NodeName,
    controller: NodeName,
    auto_respond: bool,
    active: BTreeMap<u64, Request>,
    stats: WorkerStats,
}

impl Worker {
    /// Creates a worker that reports to the named coordinator.
    pub fn new(
        name: impl Into<NodeName>,
        controller: impl Into<NodeName>,
        auto_respond: bool,
    ) -> Self {
        Self {
            name: name.into(),
            controller: controller.into(),
            auto_respond,
            active: BTreeMap::new(),
            stats: WorkerStats::default(),
        }
    }

    /// The worker's node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This worker's counters.
    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Requests accepted but not yet completed.
    pub fn active_requests(&self) -> usize {
        self.active.len()
    }

    fn on_request(&mut self, seq: u64, request: Request, now: Time) -> Vec<Event> {
        tracing::debug!(worker = %self.name, seq, pairs = request.pairs, "request accepted");
        self.stats.requests_received += 1;
        let finish = request.end.max(now);
        self.active.insert(seq, request);
        if self.auto_respond {
            vec![Event::wake(finish, self.name.clone(), seq)]
        } else {
            Vec::new()
        }
    }

    fn on_wake(&mut self, seq: u64, now: Time) -> Vec<Event> {
        // Wakes for requests that no longer exist are obsolete, not errors.
        let Some(request) = self.active.remove(&seq) else {
            tracing::debug!(worker = %self.name, seq, "wake without active request, ignoring");
            return Vec::new();
        };
        self.stats.requests_completed += 1;
        let outcome = RequestOutcome {
            pairs_generated: request.pairs,
            fidelity: request.fidelity,
        };
        tracing::debug!(worker = %self.name, seq, "request completed, responding");
        vec![Event::deliver(
            now,
            self.name.clone(),
            self.controller.clone(),
            ControlMessage::respond(seq, outcome),
        )]
    }
}

/// A simulated actor.
#[derive(Debug)]
pub enum SimNode {
    /// A worker serving requests.
    Worker(Worker),
    /// The coordinator scheduling them.
    Coordinator(Coordinator),
}

impl SimNode {
    /// The actor's node name.
    pub fn name(&self) -> &str {
        match self {
            SimNode::Worker(worker) => worker.name(),
            SimNode::Coordinator(coordinator) => coordinator.name(),
        }
    }

    /// Handles one event, returning the actor's outgoing events.
    ///
    /// Outgoing `Deliver` events carry their send time; the engine applies
    /// the link delay. `Wake` events carry their absolute fire time and are
    /// scheduled as-is.
    pub fn handle(&mut self, event: Event, now: Time) -> Vec<Event> {
        match (self, event.payload) {
            (
                SimNode::Worker(worker),
                EventPayload::Deliver {
                    message: ControlMessage::Request { seq, request },
                    ..
                },
            ) => worker.on_request(seq, request, now),

            (SimNode::Worker(worker), EventPayload::Wake { seq }) => worker.on_wake(seq, now),

            (
                SimNode::Coordinator(coordinator),
                EventPayload::Deliver {
                    message: ControlMessage::Respond { seq, outcome },
                    src,
                },
            ) => {
                tracing::debug!(from = %src, seq, "respond received");
                coordinator.acknowledge(seq, outcome);
                Vec::new()
            }

            (SimNode::Coordinator(coordinator), EventPayload::Wake { seq }) => {
                coordinator.dispatch(seq, now)
            }

            (node, payload) => {
                tracing::warn!(node = %node.name(), "unexpected event payload {payload:?}, dropping");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SECOND;

    fn request(pairs: u32) -> Request {
        Request {
            src: "w0".to_string(),
            dst: "w1".to_string(),
            start: SECOND,
            end: 2 * SECOND,
            memory_size: 1,
            fidelity: 0.7,
            pairs,
        }
    }

    #[test]
    fn test_worker_schedules_completion_wake() {
        let mut worker = Worker::new("w0", "ctl", true);
        let out = worker.on_request(3, request(2), SECOND - 10);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0], Event::wake(2 * SECOND, "w0", 3));
        assert_eq!(worker.active_requests(), 1);
        assert_eq!(worker.stats().requests_received, 1);
    }

    #[test]
    fn test_worker_responds_on_wake() {
        let mut worker = Worker::new("w0", "ctl", true);
        worker.on_request(3, request(2), SECOND - 10);
        let out = worker.on_wake(3, 2 * SECOND);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, "ctl");
        match &out[0].payload {
            EventPayload::Deliver { src, message } => {
                assert_eq!(src, "w0");
                assert_eq!(
                    message,
                    &ControlMessage::respond(
                        3,
                        RequestOutcome {
                            pairs_generated: 2,
                            fidelity: 0.7
                        }
                    )
                );
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(worker.active_requests(), 0);
        assert_eq!(worker.stats().requests_completed, 1);
    }

    #[test]
    fn test_worker_ignores_obsolete_wake() {
        let mut worker = Worker::new("w0", "ctl", true);
        assert!(worker.on_wake(99, SECOND).is_empty());
        assert_eq!(worker.stats().requests_completed, 0);
    }

    #[test]
    fn test_quiet_worker_never_responds() {
        let mut worker = Worker::new("w0", "ctl", false);
        let out = worker.on_request(1, request(1), 0);
        assert!(out.is_empty());
        assert_eq!(worker.active_requests(), 1);
    }

    #[test]
    fn test_sim_node_routes_request_to_worker() {
        let mut node = SimNode::Worker(Worker::new("w0", "ctl", true));
        let event = Event::deliver(
            100,
            "ctl",
            "w0",
            ControlMessage::request(5, request(1)),
        );
        let out = node.handle(event, 100);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], Event::wake(2 * SECOND, "w0", 5));
    }

    #[test]
    fn test_worker_drops_respond_messages() {
        let mut node = SimNode::Worker(Worker::new("w0", "ctl", true));
        let event = Event::deliver(
            100,
            "ctl",
            "w0",
            ControlMessage::respond(
                5,
                RequestOutcome {
                    pairs_generated: 1,
                    fidelity: 0.7,
                },
            ),
        );
        assert!(node.handle(event, 100).is_empty());
    }
}
