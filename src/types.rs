//! Core type definitions shared across the scheduling and routing layers.
//!
//! All simulated time is measured in picoseconds, matching the resolution
//! needed to express fibre propagation delays over metre-scale distances.

/// Simulation time in picoseconds.
///
/// Every scheduled event, dispatch deadline, and link delay uses the same
/// `Time` representation, giving a single global clock across the network.
pub type Time = u64;

/// Name of a node in the network topology.
///
/// Nodes are addressed by name throughout: forwarding tables, delay tables,
/// and message delivery all key on `NodeName`.
pub type NodeName = String;

/// One second in simulation time units.
pub const SECOND: Time = 1_000_000_000_000;

/// One millisecond in simulation time units.
pub const MILLISECOND: Time = 1_000_000_000;

/// One microsecond in simulation time units.
pub const MICROSECOND: Time = 1_000_000;

/// Speed of light in optical fibre, in metres per picosecond.
///
/// Used by the classical delay model to convert path lengths into
/// propagation delays.
pub const SPEED_OF_LIGHT: f64 = 2e-4;
