//! Circuit descriptions and qubit partitioning.
//!
//! A [`Circuit`] is a plain gate list: no gate semantics are modeled, only
//! which logical qubits each gate touches. That is all the scheduling layer
//! needs to derive cross-worker communication demand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors arising from malformed circuit descriptions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    /// A gate references a qubit index outside the circuit's declared width.
    #[error("gate '{gate}' references qubit {qubit} but the circuit has {width} qubits")]
    QubitOutOfRange {
        /// Gate name as declared.
        gate: String,
        /// Offending qubit index.
        qubit: usize,
        /// Declared circuit width.
        width: usize,
    },

    /// Partition group size must be at least one.
    #[error("partition group size must be at least 1")]
    ZeroGroupSize,
}

/// A single gate in a circuit.
///
/// Gates carry only structural information: a name, the target qubit(s), and
/// the control qubit(s). Single-qubit gates have no controls. An optional
/// phase angle is kept for descriptive completeness but never interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate name (e.g. "h", "cphase").
    pub name: String,
    /// Target qubit indices.
    pub targets: Vec<usize>,
    /// Control qubit indices; empty for single-qubit gates.
    #[serde(default)]
    pub controls: Vec<usize>,
    /// Optional rotation angle in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
}

impl Gate {
    /// Creates a single-qubit gate.
    pub fn single(name: impl Into<String>, target: usize) -> Self {
        Self {
            name: name.into(),
            targets: vec![target],
            controls: Vec::new(),
            phase: None,
        }
    }

    /// Creates a controlled gate with one control and one target.
    pub fn controlled(name: impl Into<String>, control: usize, target: usize) -> Self {
        Self {
            name: name.into(),
            targets: vec![target],
            controls: vec![control],
            phase: None,
        }
    }

    /// Sets the phase angle.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Returns true if the gate has at least one control qubit.
    pub fn is_controlled(&self) -> bool {
        !self.controls.is_empty()
    }
}

/// An ordered gate list over a fixed number of logical qubits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of logical qubits the circuit operates on.
    pub num_qubits: usize,
    /// Gates in program order.
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// Creates an empty circuit over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
        }
    }

    /// Appends a gate, builder style.
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    /// Builds the quantum Fourier transform gate sequence over `num_qubits`
    /// qubits: a Hadamard on each qubit followed by controlled-phase gates
    /// from every later qubit, with angle `pi / 2^(k - j)`.
    ///
    /// Only the interaction pattern matters here; the gates are never
    /// executed. The sequence is useful as a dense, realistic source of
    /// cross-partition two-qubit interactions.
    ///
    /// # Example
    /// ```
    /// use qanat::circuit::Circuit;
    ///
    /// let qft = Circuit::qft(3);
    /// assert_eq!(qft.num_qubits, 3);
    /// // 3 Hadamards + 2 + 1 controlled-phase gates
    /// assert_eq!(qft.gates.len(), 6);
    /// ```
    pub fn qft(num_qubits: usize) -> Self {
        let mut gates = Vec::new();
        for target in 0..num_qubits {
            gates.push(Gate::single("h", target));
            for control in (target + 1)..num_qubits {
                let angle = std::f64::consts::PI / f64::powi(2.0, (control - target) as i32);
                gates.push(Gate::controlled("cphase", control, target).with_phase(angle));
            }
        }
        Self { num_qubits, gates }
    }

    /// Checks that every gate only references qubits within the declared
    /// width.
    pub fn validate(&self) -> Result<(), CircuitError> {
        for gate in &self.gates {
            for &qubit in gate.targets.iter().chain(gate.controls.iter()) {
                if qubit >= self.num_qubits {
                    return Err(CircuitError::QubitOutOfRange {
                        gate: gate.name.clone(),
                        qubit,
                        width: self.num_qubits,
                    });
                }
            }
        }
        Ok(())
    }

    /// Splits this circuit's qubits into contiguous groups of `group` qubits.
    ///
    /// See [`partition_units`].
    pub fn partition(&self, group: usize) -> Result<Vec<Vec<usize>>, CircuitError> {
        partition_units(self.num_qubits, group)
    }

    /// Counts the two-qubit (controlled) gates in the circuit.
    pub fn interaction_count(&self) -> usize {
        self.gates.iter().filter(|g| g.is_controlled()).count()
    }
}

/// Splits `count` logical units into contiguous groups of `group` units.
///
/// Unit `i` lands in partition `i / group`, so partitions are contiguous
/// slices of the unit sequence and only the last may be shorter. Every unit
/// belongs to exactly one partition.
///
/// This mapping is deliberately trivial: minimizing communication cost is the
/// worker selector's job, not the partitioner's.
///
/// # Arguments
/// * `count` - total number of logical units
/// * `group` - units per partition, at least 1
///
/// # Returns
/// Partition index to ordered unit indices, or [`CircuitError::ZeroGroupSize`].
pub fn partition_units(count: usize, group: usize) -> Result<Vec<Vec<usize>>, CircuitError> {
    if group == 0 {
        return Err(CircuitError::ZeroGroupSize);
    }
    let mut partitions: Vec<Vec<usize>> = Vec::with_capacity(count.div_ceil(group));
    for unit in 0..count {
        if unit % group == 0 {
            partitions.push(Vec::with_capacity(group));
        }
        partitions[unit / group].push(unit);
    }
    Ok(partitions)
}
