//! Translation of partitioned circuits into network requests.
//!
//! Every two-qubit gate whose qubits live on different workers demands one
//! entanglement pair between those workers. The translator counts such
//! gates per ordered worker pair and emits one [`Request`] per pair with a
//! nonzero count. Requests from different jobs are never merged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::types::{NodeName, Time};

/// Fixed per-request parameters applied by the translator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Memories reserved at each endpoint per request.
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    /// Target entanglement fidelity, in (0, 1].
    #[serde(default = "default_fidelity")]
    pub fidelity: f64,
}

fn default_memory_size() -> u32 {
    1
}

fn default_fidelity() -> f64 {
    0.7
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            memory_size: default_memory_size(),
            fidelity: default_fidelity(),
        }
    }
}

/// An entanglement-generation request between two workers.
///
/// Created by [`translate`], consumed exactly once by the coordinator's
/// scheduler; never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Worker hosting the gates' target qubits.
    pub src: NodeName,
    /// Worker hosting the gates' control qubits.
    pub dst: NodeName,
    /// Start of the service window.
    pub start: Time,
    /// End of the service window.
    pub end: Time,
    /// Memories reserved at each endpoint.
    pub memory_size: u32,
    /// Target entanglement fidelity.
    pub fidelity: f64,
    /// Number of entanglement pairs required.
    pub pairs: u32,
}

/// Translates a job's cross-worker interactions into requests.
///
/// Each qubit is resolved to its worker through the partition-to-worker
/// binding (partition `p` is served by `workers[p]`). For every controlled
/// gate whose target and control resolve to different workers, the counter
/// keyed (target's worker, control's worker) is incremented; direction is
/// preserved. Gates touching more than two qubits are logged and degraded
/// to their first target/control pair. Requests are emitted in worker-pair
/// name order, one per nonzero count, carrying the job's service window.
///
/// # Arguments
/// * `job` - the job whose circuit is being translated
/// * `partitions` - partition index to qubit indices
/// * `workers` - worker serving each partition, by direct index
/// * `params` - fixed memory and fidelity parameters
pub fn translate(
    job: &Job,
    partitions: &[Vec<usize>],
    workers: &[NodeName],
    params: &RequestParams,
) -> Vec<Request> {
    if partitions.len() != workers.len() {
        tracing::warn!(
            partitions = partitions.len(),
            workers = workers.len(),
            "partition and worker counts differ, extra entries ignored"
        );
    }

    let mut qubit_worker: BTreeMap<usize, &NodeName> = BTreeMap::new();
    for (qubits, worker) in partitions.iter().zip(workers.iter()) {
        for &qubit in qubits {
            qubit_worker.insert(qubit, worker);
        }
    }

    let mut counter: BTreeMap<(NodeName, NodeName), u32> = BTreeMap::new();
    for gate in &job.circuit.gates {
        if !gate.is_controlled() {
            continue;
        }
        if gate.targets.len() > 1 || gate.controls.len() > 1 {
            tracing::warn!(gate = %gate.name, "gate touches more than two qubits, counting first pair only");
        }
        let (Some(&target), Some(&control)) = (gate.targets.first(), gate.controls.first()) else {
            tracing::warn!(gate = %gate.name, "controlled gate without a target, skipping");
            continue;
        };
        let (Some(&target_worker), Some(&control_worker)) =
            (qubit_worker.get(&target), qubit_worker.get(&control))
        else {
            tracing::warn!(gate = %gate.name, target, control, "gate qubit has no worker, skipping");
            continue;
        };
        if target_worker != control_worker {
            *counter
                .entry((target_worker.clone(), control_worker.clone()))
                .or_insert(0) += 1;
        }
    }

    counter
        .into_iter()
        .map(|((src, dst), pairs)| Request {
            src,
            dst,
            start: job.start,
            end: job.end,
            memory_size: params.memory_size,
            fidelity: params.fidelity,
            pairs,
        })
        .collect()
}
