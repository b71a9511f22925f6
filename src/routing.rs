//! Static routing: all-pairs shortest paths, forwarding tables, and the
//! classical delay model.
//!
//! Tables are built once per topology load. For every ordered pair of
//! switching nodes the shortest path is computed by Dijkstra over the
//! relay-merged router graph; the pair's forwarding rule is the second node
//! on that path. Classical link delays are then derived from the computed
//! path lengths and hop counts, so every link's delay reflects global
//! topology rather than local measurement.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};

use crate::topology::{Graph, TopologyError, TopologySpec};
use crate::types::{Time, MICROSECOND, SPEED_OF_LIGHT};

/// Classical delay model parameters.
///
/// A message over a link costs the propagation time for the link's path
/// length plus a fixed processing overhead per intermediate hop plus a fixed
/// per-link overhead:
///
/// `delay = distance / propagation_speed + hops * per_hop_overhead + fixed_overhead`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayModel {
    /// Signal propagation speed in metres per picosecond.
    #[serde(default = "default_propagation_speed")]
    pub propagation_speed: f64,
    /// Processing overhead per intermediate hop, in picoseconds.
    #[serde(default = "default_per_hop_overhead")]
    pub per_hop_overhead: Time,
    /// Fixed per-link overhead, in picoseconds.
    #[serde(default = "default_fixed_overhead")]
    pub fixed_overhead: Time,
}

fn default_propagation_speed() -> f64 {
    SPEED_OF_LIGHT
}

fn default_per_hop_overhead() -> Time {
    20 * MICROSECOND
}

fn default_fixed_overhead() -> Time {
    100 * MICROSECOND
}

impl Default for DelayModel {
    fn default() -> Self {
        Self {
            propagation_speed: default_propagation_speed(),
            per_hop_overhead: default_per_hop_overhead(),
            fixed_overhead: default_fixed_overhead(),
        }
    }
}

impl DelayModel {
    /// Computes the delay for a link with the given path length and
    /// intermediate hop count.
    pub fn classical_delay(&self, distance: f64, hops: usize) -> Time {
        let propagation = distance / self.propagation_speed;
        let overhead = (hops as u64 * self.per_hop_overhead + self.fixed_overhead) as f64;
        (propagation + overhead).round() as Time
    }
}

/// A shortest path between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathInfo {
    /// Total path length in metres.
    pub length: f64,
    /// Number of intermediate switching nodes on the path.
    pub hops: usize,
    /// Full node sequence from source to destination.
    pub path: Vec<String>,
}

/// Forwarding tables, all-pairs shortest paths, and per-link delays.
///
/// Built once by [`RoutingTables::build`]; read-only afterwards. All maps
/// iterate in name order, so rebuilding from the same topology reproduces
/// identical tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTables {
    /// The relay-merged router graph the tables were built from.
    pub graph: Graph,
    /// node -> destination -> next hop.
    pub forwarding: BTreeMap<String, BTreeMap<String, String>>,
    /// source -> destination -> shortest path. Covers switching-node pairs
    /// plus the direct router-relay adjacencies.
    pub paths: BTreeMap<String, BTreeMap<String, PathInfo>>,
    /// sender -> receiver -> classical delay, one entry per declared link.
    pub link_delays: BTreeMap<String, BTreeMap<String, Time>>,
}

impl RoutingTables {
    /// Builds forwarding tables and link delays for a topology.
    ///
    /// Each unordered switching-node pair is solved once, in the canonical
    /// lexicographic direction; the reverse direction reuses the same path
    /// reversed, so the two directions always agree. Unreachable pairs are
    /// skipped and simply absent from the tables.
    ///
    /// # Arguments
    /// * `topo` - the topology to route over
    /// * `model` - classical delay parameters
    ///
    /// # Returns
    /// The populated tables, or a [`TopologyError`] if the router graph
    /// cannot be derived.
    pub fn build(topo: &TopologySpec, model: &DelayModel) -> Result<Self, TopologyError> {
        let graph = topo.router_graph()?;

        let mut paths: BTreeMap<String, BTreeMap<String, PathInfo>> = BTreeMap::new();
        let mut forwarding: BTreeMap<String, BTreeMap<String, String>> = graph
            .keys()
            .map(|name| (name.clone(), BTreeMap::new()))
            .collect();

        // Direct router-relay adjacencies, so relay-facing classical links
        // also get path-derived delays.
        for link in &topo.quantum_links {
            let down = PathInfo {
                length: link.distance,
                hops: 0,
                path: vec![link.router.clone(), link.relay.clone()],
            };
            let up = PathInfo {
                length: link.distance,
                hops: 0,
                path: vec![link.relay.clone(), link.router.clone()],
            };
            paths
                .entry(link.router.clone())
                .or_default()
                .insert(link.relay.clone(), down);
            paths
                .entry(link.relay.clone())
                .or_default()
                .insert(link.router.clone(), up);
        }

        let routers: Vec<&String> = graph.keys().collect();
        for (i, src) in routers.iter().enumerate() {
            let (dist, prev) = shortest_paths_from(&graph, src);
            // Sorted key order makes routers[i + 1..] exactly the names
            // above `src`, giving each unordered pair one canonical solve.
            for dst in &routers[i + 1..] {
                let Some(path) = reconstruct(&prev, src, dst) else {
                    tracing::debug!(src = %src, dst = %dst, "routers unreachable, skipping pair");
                    continue;
                };
                let Some(&length) = dist.get(*dst) else {
                    continue;
                };
                let hops = path.len().saturating_sub(2);

                let mut reversed = path.clone();
                reversed.reverse();

                if let (Some(hop_fwd), Some(hop_rev)) = (path.get(1), reversed.get(1)) {
                    if let Some(rules) = forwarding.get_mut(*src) {
                        rules.insert((*dst).clone(), hop_fwd.clone());
                    }
                    if let Some(rules) = forwarding.get_mut(*dst) {
                        rules.insert((*src).clone(), hop_rev.clone());
                    }
                }

                paths.entry((*src).clone()).or_default().insert(
                    (*dst).clone(),
                    PathInfo {
                        length,
                        hops,
                        path,
                    },
                );
                paths.entry((*dst).clone()).or_default().insert(
                    (*src).clone(),
                    PathInfo {
                        length,
                        hops,
                        path: reversed,
                    },
                );
            }
        }

        // Delay assignment happens only now, with the full all-pairs view:
        // links between switching nodes use their computed path, anything
        // else (coordinator links) uses the direct measured distance.
        let mut link_delays: BTreeMap<String, BTreeMap<String, Time>> = BTreeMap::new();
        for link in &topo.classical_links {
            let delay = match paths.get(&link.src).and_then(|m| m.get(&link.dst)) {
                Some(info) => model.classical_delay(info.length, info.hops),
                None => model.classical_delay(link.distance, 0),
            };
            link_delays
                .entry(link.src.clone())
                .or_default()
                .insert(link.dst.clone(), delay);
        }

        Ok(Self {
            graph,
            forwarding,
            paths,
            link_delays,
        })
    }

    /// Next hop from `node` toward `dst`, if the destination is reachable.
    pub fn next_hop(&self, node: &str, dst: &str) -> Option<&str> {
        self.forwarding.get(node)?.get(dst).map(|s| s.as_str())
    }

    /// Shortest path from `src` to `dst`, if one exists.
    pub fn path(&self, src: &str, dst: &str) -> Option<&PathInfo> {
        self.paths.get(src)?.get(dst)
    }

    /// Delay of the declared classical link from `src` to `dst`.
    pub fn link_delay(&self, src: &str, dst: &str) -> Option<Time> {
        self.link_delays.get(src)?.get(dst).copied()
    }
}

/// Frontier entry for the Dijkstra heaps here and in worker selection.
///
/// Ordered by distance, then node name, so equal-cost pops are resolved
/// lexicographically and both table construction and selection are
/// deterministic.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Frontier {
    pub(crate) dist: f64,
    pub(crate) node: String,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source Dijkstra over the router graph.
///
/// Returns finalized distances and predecessor pointers for every reachable
/// node. Relaxation is strict, so among equal-cost paths the first one
/// finalized (lexicographically smallest frontier) wins.
fn shortest_paths_from(
    graph: &Graph,
    src: &str,
) -> (BTreeMap<String, f64>, BTreeMap<String, String>) {
    let mut dist: BTreeMap<String, f64> = BTreeMap::new();
    let mut prev: BTreeMap<String, String> = BTreeMap::new();
    let mut heap: BinaryHeap<std::cmp::Reverse<Frontier>> = BinaryHeap::new();

    dist.insert(src.to_string(), 0.0);
    heap.push(std::cmp::Reverse(Frontier {
        dist: 0.0,
        node: src.to_string(),
    }));

    while let Some(std::cmp::Reverse(Frontier { dist: d, node })) = heap.pop() {
        if let Some(&best) = dist.get(&node) {
            if d > best {
                continue;
            }
        }
        let Some(adjacency) = graph.get(&node) else {
            continue;
        };
        for (next, weight) in adjacency {
            let candidate = d + weight;
            let improved = match dist.get(next) {
                Some(&current) => candidate < current,
                None => true,
            };
            if improved {
                dist.insert(next.clone(), candidate);
                prev.insert(next.clone(), node.clone());
                heap.push(std::cmp::Reverse(Frontier {
                    dist: candidate,
                    node: next.clone(),
                }));
            }
        }
    }

    (dist, prev)
}

/// Walks predecessor pointers back from `dst` to `src`.
fn reconstruct(prev: &BTreeMap<String, String>, src: &str, dst: &str) -> Option<Vec<String>> {
    let mut path = vec![dst.to_string()];
    let mut cur = dst;
    while cur != src {
        cur = prev.get(cur)?;
        path.push(cur.to_string());
    }
    path.reverse();
    Some(path)
}
