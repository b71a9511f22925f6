//! Worker selection by bounded Dijkstra expansion.
//!
//! For a job needing K workers, every node in the router graph is tried as
//! an origin: a Dijkstra expansion from the origin is stopped as soon as K
//! nodes are finalized, and the K finalized distances are summed. The origin
//! with the smallest sum wins, and its K visited nodes become the workers.
//! Ties keep the earlier origin in sorted name order, so selection is fully
//! deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::Frontier;
use crate::topology::Graph;
use crate::types::NodeName;

/// Errors raised by worker selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// More workers were requested than the graph has nodes.
    #[error("requested {requested} workers but the graph has only {available} nodes")]
    InsufficientNodes {
        /// Requested worker count.
        requested: usize,
        /// Nodes available in the graph.
        available: usize,
    },

    /// The graph has enough nodes, but no origin can reach the requested
    /// number of workers (disconnected topology).
    #[error("no origin can reach {requested} workers")]
    NoFeasibleOrigin {
        /// Requested worker count.
        requested: usize,
    },
}

/// The outcome of a worker selection.
///
/// `workers` are listed in Dijkstra visit order from the winning origin
/// (the origin itself first). Partition `p` of the owning job is served by
/// `workers[p]`, by direct index correspondence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// The origin whose expansion won.
    pub origin: NodeName,
    /// Selected workers in visit order.
    pub workers: Vec<NodeName>,
    /// Finalized shortest distance from the origin, per selected worker.
    pub distances: BTreeMap<NodeName, f64>,
    /// Sum of the selected workers' distances.
    pub total_distance: f64,
}

impl Selection {
    /// The selection holding no workers, returned for a zero count.
    pub fn empty() -> Self {
        Self {
            origin: NodeName::new(),
            workers: Vec::new(),
            distances: BTreeMap::new(),
            total_distance: 0.0,
        }
    }
}

/// Selects the `count`-node set with the smallest total distance from a
/// single origin.
///
/// Origins are scanned in sorted name order and a strictly smaller total is
/// required to displace the incumbent, so equal-cost candidates resolve to
/// the lexicographically first origin. Origins that cannot reach `count`
/// nodes are skipped.
///
/// A zero `count` returns an empty selection (the origin is left empty).
///
/// # Arguments
/// * `graph` - router graph to select over
/// * `count` - number of workers required
///
/// # Returns
/// The winning [`Selection`], or a [`SelectionError`] if the graph cannot
/// supply `count` workers.
pub fn select_workers(graph: &Graph, count: usize) -> Result<Selection, SelectionError> {
    if count > graph.len() {
        return Err(SelectionError::InsufficientNodes {
            requested: count,
            available: graph.len(),
        });
    }
    if count == 0 {
        return Ok(Selection::empty());
    }

    let mut best: Option<Selection> = None;
    for origin in graph.keys() {
        let Some(candidate) = expand_origin(graph, origin, count) else {
            tracing::debug!(origin = %origin, count, "origin cannot reach enough nodes, skipping");
            continue;
        };
        let better = match &best {
            Some(incumbent) => candidate.total_distance < incumbent.total_distance,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best.ok_or(SelectionError::NoFeasibleOrigin { requested: count })
}

/// Parallel variant of [`select_workers`].
///
/// Scans origins with rayon and reduces to the same winner as the
/// sequential scan: smallest total distance, ties broken by origin name.
/// The graph is only read, never mutated, so sharing it across the worker
/// pool is sound.
#[cfg(feature = "parallel")]
pub fn select_workers_parallel(graph: &Graph, count: usize) -> Result<Selection, SelectionError> {
    use rayon::prelude::*;

    if count > graph.len() {
        return Err(SelectionError::InsufficientNodes {
            requested: count,
            available: graph.len(),
        });
    }
    if count == 0 {
        return Ok(Selection::empty());
    }

    let origins: Vec<&NodeName> = graph.keys().collect();
    origins
        .par_iter()
        .filter_map(|origin| expand_origin(graph, origin, count))
        .min_by(|a, b| {
            a.total_distance
                .total_cmp(&b.total_distance)
                .then_with(|| a.origin.cmp(&b.origin))
        })
        .ok_or(SelectionError::NoFeasibleOrigin { requested: count })
}

/// Runs one bounded expansion and packages it as a [`Selection`].
///
/// Returns `None` if the frontier is exhausted before `count` nodes are
/// finalized.
fn expand_origin(graph: &Graph, origin: &str, count: usize) -> Option<Selection> {
    let mut visited: Vec<NodeName> = Vec::with_capacity(count);
    let mut finalized: BTreeMap<NodeName, f64> = BTreeMap::new();
    let mut tentative: BTreeMap<NodeName, f64> = BTreeMap::new();
    let mut heap: BinaryHeap<Reverse<Frontier>> = BinaryHeap::new();

    tentative.insert(origin.to_string(), 0.0);
    heap.push(Reverse(Frontier {
        dist: 0.0,
        node: origin.to_string(),
    }));

    while visited.len() < count {
        // Pop until a not-yet-finalized node surfaces; an empty heap means
        // the origin's component is smaller than `count`.
        let Frontier { dist, node } = loop {
            let Reverse(front) = heap.pop()?;
            if !finalized.contains_key(&front.node) {
                break front;
            }
        };

        finalized.insert(node.clone(), dist);
        visited.push(node.clone());

        if let Some(adjacency) = graph.get(&node) {
            for (next, weight) in adjacency {
                if finalized.contains_key(next) {
                    continue;
                }
                let candidate = dist + weight;
                let improved = match tentative.get(next) {
                    Some(&current) => candidate < current,
                    None => true,
                };
                if improved {
                    tentative.insert(next.clone(), candidate);
                    heap.push(Reverse(Frontier {
                        dist: candidate,
                        node: next.clone(),
                    }));
                }
            }
        }
    }

    let total_distance = finalized.values().sum();
    Some(Selection {
        origin: origin.to_string(),
        workers: visited,
        distances: finalized,
        total_distance,
    })
}
