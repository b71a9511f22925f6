//! Jobs and job queues.
//!
//! A job pairs a circuit with the virtual-time window in which its
//! cross-worker entanglement requests must be served. Queues can be built
//! explicitly or generated randomly from a seed for reproducible workloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::types::Time;

/// A scheduled unit of distributed computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    /// The circuit to be distributed across workers.
    pub circuit: Circuit,
    /// Declared start of the job's service window.
    pub start: Time,
    /// Declared end of the job's service window.
    pub end: Time,
}

impl Job {
    /// Creates a job with the given circuit and service window.
    pub fn new(circuit: Circuit, start: Time, end: Time) -> Self {
        Self {
            circuit,
            start,
            end,
        }
    }
}

/// An ordered queue of jobs awaiting submission to the coordinator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobQueue {
    /// Jobs in submission order.
    pub jobs: Vec<Job>,
}

impl JobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job, builder style.
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// Generates a reproducible random queue of QFT jobs.
    ///
    /// Jobs are spaced `period` apart starting at `start`, each with a
    /// service window of one period and a qubit count drawn uniformly from
    /// `1..=max_qubits`. The same seed always produces the same queue.
    ///
    /// # Arguments
    /// * `length` - number of jobs to generate
    /// * `max_qubits` - upper bound on each job's qubit count
    /// * `start` - service-window start of the first job
    /// * `period` - spacing between consecutive job windows
    /// * `seed` - RNG seed for reproducibility
    pub fn random(length: usize, max_qubits: usize, start: Time, period: Time, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut jobs = Vec::with_capacity(length);
        let mut cur = start;
        for _ in 0..length {
            let num_qubits = rng.gen_range(1..=max_qubits.max(1));
            jobs.push(Job::new(Circuit::qft(num_qubits), cur, cur + period));
            cur += period;
        }
        Self { jobs }
    }

    /// Number of jobs in the queue.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if the queue holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
