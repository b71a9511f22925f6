//! # Qanat Scheduling Simulator
//!
//! A deterministic discrete-event scheduling core for distributed computation
//! over a simulated quantum network: circuits are partitioned across worker
//! nodes, cross-partition interactions become entanglement requests, and a
//! central coordinator dispatches those requests over classical links with
//! realistic propagation delays.
//!
//! ## Design Principles
//!
//! - **Topology-Driven**: The declarative [`TopologySpec`] is the source of
//!   truth; forwarding tables, path metrics, and link delays are all derived
//!   from it once, up front.
//! - **Deterministic**: Every table and queue iterates in a fixed order and
//!   every tie has a canonical winner, so the same inputs always produce the
//!   same schedule.
//! - **Unified Timeline**: All actors share one virtual clock
//!   ([`types::Time`], in picoseconds) driven by a single event queue.
//! - **Closed Actor Set**: The simulated actors are a fixed enum of
//!   coordinator and worker; no dynamic dispatch.
//!
//! ## Features
//!
//! - `parallel` - Enable parallel worker-selection scans using rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use qanat::{Circuit, Job, Role, SimConfig, Simulation, TopologySpec};
//! use qanat::types::SECOND;
//!
//! // Two workers behind one relay, classical star around the coordinator
//! let topo = TopologySpec::new()
//!     .with_node("ctl", Role::Coordinator)
//!     .with_node("w0", Role::Worker)
//!     .with_node("w1", Role::Worker)
//!     .with_node("bsm0", Role::Relay)
//!     .with_quantum_link("w0", "bsm0", 500.0)
//!     .with_quantum_link("w1", "bsm0", 500.0)
//!     .with_classical_connection("ctl", "w0", 1_000.0)
//!     .with_classical_connection("ctl", "w1", 1_000.0)
//!     .with_classical_connection("w0", "w1", 2_000.0);
//!
//! // Build the simulation with default parameters
//! let config = SimConfig::new();
//! let mut sim = Simulation::new(&topo, &config).unwrap();
//!
//! // Schedule a four-qubit QFT split across the two workers
//! let job = Job {
//!     circuit: Circuit::qft(4),
//!     start: SECOND,
//!     end: 2 * SECOND,
//! };
//! sim.submit(&job).unwrap();
//! sim.run_until(3 * SECOND);
//!
//! // Get statistics
//! let stats = sim.export_stats();
//! println!("acknowledged: {}", stats["scheduler"]["acknowledged"]);
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use qanat::config::SimConfig;
//!
//! let config = SimConfig::from_file("simulation.yaml")?;
//! let mut sim = Simulation::new(&topo, &config)?;
//! ```

pub mod types;
pub mod event;
pub mod circuit;
pub mod job;
pub mod topology;
pub mod routing;
pub mod select;
pub mod requests;
pub mod message;
pub mod timeline;
pub mod node;
pub mod controller;
pub mod engine;
pub mod config;

// Re-export commonly used types
pub use types::{NodeName, Time};
pub use event::{Event, EventPayload};
pub use circuit::{Circuit, CircuitError, Gate};
pub use job::{Job, JobQueue};
pub use topology::{ClassicalLink, NodeSpec, QuantumLink, Role, TopologyError, TopologySpec};
pub use routing::{DelayModel, PathInfo, RoutingTables};
pub use select::{select_workers, Selection, SelectionError};
pub use requests::{translate, Request, RequestParams};
pub use message::{ControlMessage, RequestOutcome};
pub use timeline::Timeline;
pub use controller::{
    Coordinator, RequestState, ScheduleError, SchedulerStats, SubmitError, SubmitReport,
    TrackedRequest,
};
pub use node::{SimNode, Worker, WorkerStats};
pub use engine::{EngineStats, Simulation, SimulationError};
pub use config::{ConfigError, SimConfig, SimConfigBuilder};

#[cfg(feature = "parallel")]
pub use select::select_workers_parallel;

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging.
///
/// # Example
///
/// ```rust,ignore
/// qanat::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
