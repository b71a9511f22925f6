//! Control-plane messages between the coordinator and workers.
//!
//! The message set is a closed tagged union: each kind carries exactly one
//! typed payload, so a malformed combination cannot be constructed. The
//! sequence number is the only correlation key between a REQUEST and its
//! RESPOND.

use serde::{Deserialize, Serialize};

use crate::requests::Request;

/// A worker's report on a completed entanglement-generation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Entanglement pairs actually generated.
    pub pairs_generated: u32,
    /// Fidelity achieved, as reported by the worker.
    pub fidelity: f64,
}

/// Message exchanged between the coordinator and the workers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ControlMessage {
    /// Coordinator asks a worker to start entanglement generation.
    Request {
        /// Correlation key, unique per coordinator.
        seq: u64,
        /// The request being dispatched.
        request: Request,
    },

    /// Worker reports a finished request back to the coordinator.
    Respond {
        /// Correlation key of the originating request.
        seq: u64,
        /// What the worker accomplished.
        outcome: RequestOutcome,
    },
}

impl ControlMessage {
    /// Creates a REQUEST message.
    pub fn request(seq: u64, request: Request) -> Self {
        Self::Request { seq, request }
    }

    /// Creates a RESPOND message.
    pub fn respond(seq: u64, outcome: RequestOutcome) -> Self {
        Self::Respond { seq, outcome }
    }

    /// The correlation key carried by either kind.
    pub fn seq(&self) -> u64 {
        match self {
            Self::Request { seq, .. } | Self::Respond { seq, .. } => *seq,
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "REQUEST",
            Self::Respond { .. } => "RESPOND",
        }
    }
}
