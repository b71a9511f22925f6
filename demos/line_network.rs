//! Linear network scheduling example.
//!
//! Builds a line of workers joined by entanglement relays, generates a
//! reproducible queue of random QFT jobs, and drives the full scheduling
//! loop: partition, worker selection, request dispatch over classical
//! links, worker service, and acknowledgement.

use qanat::types::{Time, SECOND};
use qanat::{JobQueue, Role, SimConfigBuilder, Simulation, TopologySpec};

const WORKERS: usize = 5;
const SEGMENT_M: f64 = 2_000.0;
const QUBITS_PER_WORKER: usize = 2;
const JOBS: usize = 8;
const MAX_QUBITS: usize = 2 * WORKERS;
const FIRST_WINDOW: Time = SECOND;
const PERIOD: Time = SECOND / 2;
const SEED: u64 = 0x5eed;

// -----------------------------------------------------------------------------
// Topology
// -----------------------------------------------------------------------------

/// A linear network in the usual shape: a relay halfway along each segment,
/// classical links between every worker pair, between each relay and its
/// neighbours, and from the controller to every worker.
fn line_topology(workers: usize) -> TopologySpec {
    let mut topo = TopologySpec::new().with_node("ctl", Role::Coordinator);
    for i in 0..workers {
        topo = topo.with_node(format!("w{i}"), Role::Worker);
    }
    for i in 0..workers - 1 {
        let relay = format!("bsm.{}.{}", i, i + 1);
        topo = topo.with_node(relay.clone(), Role::Relay);
        for end in [i, i + 1] {
            topo = topo
                .with_quantum_link(format!("w{end}"), relay.clone(), SEGMENT_M / 2.0)
                .with_classical_connection(format!("w{end}"), relay.clone(), SEGMENT_M / 2.0);
        }
    }
    for i in 0..workers {
        for j in i + 1..workers {
            topo = topo.with_classical_connection(format!("w{i}"), format!("w{j}"), SEGMENT_M);
        }
        topo = topo.with_classical_connection("ctl", format!("w{i}"), SEGMENT_M);
    }
    topo
}

// -----------------------------------------------------------------------------
// Main simulation
// -----------------------------------------------------------------------------

fn main() {
    qanat::init_logging("info");

    println!("==== Line network example ====");
    println!("{WORKERS} workers, {JOBS} random QFT jobs, {QUBITS_PER_WORKER} qubits per worker\n");

    let topo = line_topology(WORKERS);
    let config = match SimConfigBuilder::new()
        .qubits_per_worker(QUBITS_PER_WORKER)
        .build()
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return;
        }
    };
    let mut sim = match Simulation::new(&topo, &config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("failed to build simulation: {err}");
            return;
        }
    };

    let queue = JobQueue::random(JOBS, MAX_QUBITS, FIRST_WINDOW, PERIOD, SEED);
    for (i, job) in queue.jobs.iter().enumerate() {
        match sim.submit(job) {
            Ok(report) => println!(
                "job {i}: {:>2} qubits -> workers {:?}, {} scheduled, {} rejected",
                job.circuit.num_qubits,
                report.workers,
                report.scheduled.len(),
                report.rejected
            ),
            Err(err) => println!("job {i}: not schedulable ({err})"),
        }
    }

    let horizon = FIRST_WINDOW + (JOBS as Time + 2) * PERIOD;
    sim.run_until(horizon);
    let expired = sim.expire_overdue();

    let stats = sim.export_stats();
    println!(
        "\nClock advanced to {:.2} s over {} events",
        stats["engine"]["current_time"].as_u64().unwrap_or(0) as f64 / SECOND as f64,
        stats["engine"]["events_processed"]
    );
    println!(
        "Messages: {} delivered, {} dropped",
        stats["engine"]["messages_delivered"], stats["engine"]["messages_dropped"]
    );
    println!(
        "Requests: {} dispatched, {} acknowledged, {} rejected, {} timed out ({} swept late)",
        stats["scheduler"]["dispatched"],
        stats["scheduler"]["acknowledged"],
        stats["scheduler"]["rejected"],
        stats["scheduler"]["timed_out"],
        expired
    );
    if let Some(workers) = stats["workers"].as_object() {
        for (name, worker) in workers {
            println!(
                "  {name}: received {}, completed {}",
                worker["requests_received"], worker["requests_completed"]
            );
        }
    }
}
