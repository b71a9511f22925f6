//! Network topology description and the router graph derived from it.
//!
//! A [`TopologySpec`] declares nodes with roles, quantum links (always
//! router-to-relay), and classical links. Validation enforces the structural
//! rules the routing and scheduling layers rely on: unique names, known link
//! endpoints, exactly one coordinator, and relays bridging exactly two
//! switching nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NodeName;

/// Adjacency map over switching nodes: node -> (neighbor -> edge weight).
///
/// Deterministic iteration order is load-bearing: shortest-path tie-breaks
/// and worker-selection scans depend on it.
pub type Graph = BTreeMap<NodeName, BTreeMap<NodeName, f64>>;

/// Errors raised while validating a topology or deriving its router graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// Two nodes share the same name.
    #[error("duplicate node name '{0}'")]
    DuplicateNode(NodeName),

    /// A link references a node that was never declared.
    #[error("{kind} link references unknown node '{name}'")]
    UnknownEndpoint {
        /// "quantum" or "classical".
        kind: &'static str,
        /// The undeclared node name.
        name: NodeName,
    },

    /// A quantum link must join a switching node (router or worker) to a relay.
    #[error("quantum link '{router}' -- '{relay}' must join a switching node to a relay")]
    InvalidQuantumLink {
        /// Declared router-side endpoint.
        router: NodeName,
        /// Declared relay-side endpoint.
        relay: NodeName,
    },

    /// A relay must bridge exactly two switching nodes to be merged into one
    /// router-graph edge.
    #[error("relay '{relay}' has {degree} switching neighbors, expected exactly 2")]
    BadRelayDegree {
        /// The offending relay.
        relay: NodeName,
        /// Number of switching neighbors found.
        degree: usize,
    },

    /// The topology must contain exactly one coordinator.
    #[error("topology declares {found} coordinators, expected exactly 1")]
    CoordinatorCount {
        /// Number of coordinator nodes found.
        found: usize,
    },
}

/// The role a node plays in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Pure switching node: forwards traffic, never hosts computation.
    Router,
    /// Entanglement relay (Bell-state measurement node) between two
    /// switching nodes; merged away in the router graph.
    Relay,
    /// Switching node that can also host a computation partition.
    Worker,
    /// The single control-plane node that schedules requests.
    Coordinator,
}

impl Role {
    /// Returns true for nodes that appear in the router graph.
    pub fn is_switching(&self) -> bool {
        matches!(self, Role::Router | Role::Worker)
    }
}

/// Declaration of a single node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique node name.
    pub name: NodeName,
    /// Role tag.
    pub role: Role,
    /// Per-node RNG seed, passed through to the simulated actor.
    #[serde(default)]
    pub seed: u64,
}

/// A quantum link between a switching node and a relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuantumLink {
    /// Switching-side endpoint.
    pub router: NodeName,
    /// Relay-side endpoint.
    pub relay: NodeName,
    /// Fibre length in metres.
    pub distance: f64,
    /// Attenuation in dB/m; carried for collaborators, never interpreted here.
    #[serde(default)]
    pub attenuation: f64,
}

/// A classical link between any two nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassicalLink {
    /// Sending endpoint.
    pub src: NodeName,
    /// Receiving endpoint.
    pub dst: NodeName,
    /// Direct fibre length in metres.
    pub distance: f64,
}

/// Complete declarative topology.
///
/// # Example
/// ```
/// use qanat::topology::{Role, TopologySpec};
///
/// let topo = TopologySpec::new()
///     .with_node("ctl", Role::Coordinator)
///     .with_node("w0", Role::Worker)
///     .with_node("w1", Role::Worker)
///     .with_node("bsm0", Role::Relay)
///     .with_quantum_link("w0", "bsm0", 500.0)
///     .with_quantum_link("w1", "bsm0", 500.0)
///     .with_classical_link("ctl", "w0", 1_000.0);
/// topo.validate().unwrap();
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TopologySpec {
    /// Node declarations.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Quantum links (switching node to relay).
    #[serde(default)]
    pub quantum_links: Vec<QuantumLink>,
    /// Classical links.
    #[serde(default)]
    pub classical_links: Vec<ClassicalLink>,
}

impl TopologySpec {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, builder style.
    pub fn with_node(mut self, name: impl Into<NodeName>, role: Role) -> Self {
        self.nodes.push(NodeSpec {
            name: name.into(),
            role,
            seed: 0,
        });
        self
    }

    /// Adds a node with an explicit RNG seed.
    pub fn with_seeded_node(mut self, name: impl Into<NodeName>, role: Role, seed: u64) -> Self {
        self.nodes.push(NodeSpec {
            name: name.into(),
            role,
            seed,
        });
        self
    }

    /// Adds a quantum link, builder style.
    pub fn with_quantum_link(
        mut self,
        router: impl Into<NodeName>,
        relay: impl Into<NodeName>,
        distance: f64,
    ) -> Self {
        self.quantum_links.push(QuantumLink {
            router: router.into(),
            relay: relay.into(),
            distance,
            attenuation: 0.0,
        });
        self
    }

    /// Adds a classical link, builder style.
    pub fn with_classical_link(
        mut self,
        src: impl Into<NodeName>,
        dst: impl Into<NodeName>,
        distance: f64,
    ) -> Self {
        self.classical_links.push(ClassicalLink {
            src: src.into(),
            dst: dst.into(),
            distance,
        });
        self
    }

    /// Adds classical links in both directions between two nodes.
    pub fn with_classical_connection(
        self,
        a: impl Into<NodeName>,
        b: impl Into<NodeName>,
        distance: f64,
    ) -> Self {
        let a = a.into();
        let b = b.into();
        self.with_classical_link(a.clone(), b.clone(), distance)
            .with_classical_link(b, a, distance)
    }

    /// Looks up a node declaration by name.
    pub fn find_node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Returns the single coordinator declaration, if the topology is valid.
    pub fn coordinator(&self) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.role == Role::Coordinator)
    }

    /// Names of all worker nodes, in declaration order.
    pub fn worker_names(&self) -> Vec<NodeName> {
        self.nodes
            .iter()
            .filter(|n| n.role == Role::Worker)
            .map(|n| n.name.clone())
            .collect()
    }

    /// Validates the topology's structural rules.
    ///
    /// Checks node-name uniqueness, link endpoints, quantum-link role shape,
    /// relay degrees, and the single-coordinator rule.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut roles: BTreeMap<&str, Role> = BTreeMap::new();
        for node in &self.nodes {
            if roles.insert(&node.name, node.role).is_some() {
                return Err(TopologyError::DuplicateNode(node.name.clone()));
            }
        }

        let coordinators = self
            .nodes
            .iter()
            .filter(|n| n.role == Role::Coordinator)
            .count();
        if coordinators != 1 {
            return Err(TopologyError::CoordinatorCount {
                found: coordinators,
            });
        }

        for link in &self.quantum_links {
            let router = roles.get(link.router.as_str()).ok_or_else(|| {
                TopologyError::UnknownEndpoint {
                    kind: "quantum",
                    name: link.router.clone(),
                }
            })?;
            let relay = roles.get(link.relay.as_str()).ok_or_else(|| {
                TopologyError::UnknownEndpoint {
                    kind: "quantum",
                    name: link.relay.clone(),
                }
            })?;
            if !router.is_switching() || *relay != Role::Relay {
                return Err(TopologyError::InvalidQuantumLink {
                    router: link.router.clone(),
                    relay: link.relay.clone(),
                });
            }
        }

        for link in &self.classical_links {
            for name in [&link.src, &link.dst] {
                if !roles.contains_key(name.as_str()) {
                    return Err(TopologyError::UnknownEndpoint {
                        kind: "classical",
                        name: name.clone(),
                    });
                }
            }
        }

        // Relay degrees are checked here as well as in router_graph so a
        // malformed spec fails before any table construction begins.
        self.relay_edges()?;
        Ok(())
    }

    /// Derives the undirected router graph by merging each relay's two
    /// quantum links into a single weighted edge.
    ///
    /// Edge weight is the sum of the relay's two link distances. When two
    /// relays bridge the same router pair the cheaper edge wins.
    ///
    /// # Returns
    /// The adjacency map over switching nodes, or a [`TopologyError`] if a
    /// relay does not have exactly two switching neighbors.
    pub fn router_graph(&self) -> Result<Graph, TopologyError> {
        let mut graph: Graph = self
            .nodes
            .iter()
            .filter(|n| n.role.is_switching())
            .map(|n| (n.name.clone(), BTreeMap::new()))
            .collect();

        for ((a, b), weight) in self.relay_edges()? {
            let current = graph
                .get(&a)
                .and_then(|adj| adj.get(&b))
                .copied()
                .unwrap_or(f64::INFINITY);
            if weight < current {
                if let Some(adj) = graph.get_mut(&a) {
                    adj.insert(b.clone(), weight);
                }
                if let Some(adj) = graph.get_mut(&b) {
                    adj.insert(a.clone(), weight);
                }
            }
        }
        Ok(graph)
    }

    /// Folds quantum links into per-relay merged edges.
    fn relay_edges(&self) -> Result<Vec<((NodeName, NodeName), f64)>, TopologyError> {
        let mut per_relay: BTreeMap<&NodeName, (Vec<&NodeName>, f64)> = BTreeMap::new();
        for link in &self.quantum_links {
            let entry = per_relay
                .entry(&link.relay)
                .or_insert_with(|| (Vec::new(), 0.0));
            entry.0.push(&link.router);
            entry.1 += link.distance;
        }

        let mut edges = Vec::with_capacity(per_relay.len());
        for (relay, (routers, weight)) in per_relay {
            if routers.len() != 2 {
                return Err(TopologyError::BadRelayDegree {
                    relay: relay.clone(),
                    degree: routers.len(),
                });
            }
            edges.push(((routers[0].clone(), routers[1].clone()), weight));
        }
        Ok(edges)
    }
}
