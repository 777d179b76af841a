//! Session event system — decoupled reporting from the gathering loop.
//!
//! Events are published when something interesting happens during a session.
//! Observers (the CLI, tests, future alert sinks) subscribe and filter for
//! what they care about; the controller never blocks on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::world::{Serial, SpotKey};

/// All session events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A gathering session began
    SessionStarted {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A discovery scan completed
    AreaScanned {
        candidates: usize,
        on_cooldown: usize,
        timestamp: DateTime<Utc>,
    },

    /// One extraction attempt yielded resources
    ResourceExtracted {
        spot: SpotKey,
        timestamp: DateTime<Utc>,
    },

    /// A spot was exhausted and placed on cooldown
    SpotDepleted {
        spot: SpotKey,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// A spot was given up on without depletion (attempt cap, blocked streak)
    SpotAbandoned {
        spot: SpotKey,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Carried resources were transferred to the companion carrier
    OffloadCompleted {
        items_moved: usize,
        timestamp: DateTime<Utc>,
    },

    /// The carrier could not be reached; gathering continues regardless
    CarrierUnreachable {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A hostile mobile interrupted gathering
    CombatStarted {
        hostile: String,
        serial: Serial,
        timestamp: DateTime<Utc>,
    },

    /// The hostile presence cleared and gathering resumed
    ThreatCleared {
        timestamp: DateTime<Utc>,
    },

    /// An unknown humanoid was seen nearby
    StrangerSighted {
        name: String,
        serial: Serial,
        timestamp: DateTime<Utc>,
    },

    /// The session ended (stop signal or fatal precondition)
    SessionEnded {
        session_id: String,
        spots_mined: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for session events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Publishing
/// never blocks and never fails: with no subscribers the event is dropped.
pub struct EventBus {
    sender: broadcast::Sender<Arc<SessionEvent>>,
}

impl EventBus {
    /// Bus with room for `capacity` in-flight events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fan an event out to every live subscriber.
    pub fn publish(&self, event: SessionEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Open a fresh receiver on the bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
