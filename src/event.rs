//! Events carried by the virtual clock.
//!
//! Everything that happens in a simulation run is an [`Event`]: a classical
//! message arriving at a node, or a node's own scheduled wake-up.

use serde::{Deserialize, Serialize};

use crate::message::ControlMessage;
use crate::types::{NodeName, Time};

/// A scheduled occurrence addressed to one node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Virtual time at which the event fires.
    pub time: Time,
    /// Node that receives the event.
    pub target: NodeName,
    /// What happens when it fires.
    pub payload: EventPayload,
}

/// The payload of an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// A classical message delivered over a link.
    Deliver {
        /// Sending node.
        src: NodeName,
        /// The message itself.
        message: ControlMessage,
    },

    /// A node's own timer firing, correlated to a request by `seq`.
    Wake {
        /// Correlation key of the request the wake concerns.
        seq: u64,
    },
}

impl Event {
    /// Creates a message-delivery event.
    pub fn deliver(
        time: Time,
        src: impl Into<NodeName>,
        target: impl Into<NodeName>,
        message: ControlMessage,
    ) -> Self {
        Self {
            time,
            target: target.into(),
            payload: EventPayload::Deliver {
                src: src.into(),
                message,
            },
        }
    }

    /// Creates a wake event for a node's own timer.
    pub fn wake(time: Time, target: impl Into<NodeName>, seq: u64) -> Self {
        Self {
            time,
            target: target.into(),
            payload: EventPayload::Wake { seq },
        }
    }
}
