//! The `subscribe_events` stream (§6, §9): a fire-and-forget, non-blocking
//! emit into an unbounded queue drained by the API layer. The core has no
//! async runtime of its own, so this is a plain `std::sync::mpsc` sender
//! rather than a tokio broadcast channel.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::model::{Conflict, MissionPhase, Point4D};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    VehicleUpdated { vehicle_id: u64, position: Point4D },
    MissionCreated { mission_id: u64, vehicle_id: u64 },
    MissionPhaseChanged { mission_id: u64, phase: MissionPhase },
    ConflictDetected { conflict: Conflict },
}

/// Sending half handed to the resolver/service; dropped receivers make
/// `emit` a no-op rather than a panic, since nothing downstream requires an
/// active subscriber.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<Event>,
}

impl EventSink {
    pub fn channel() -> (EventSink, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (EventSink { tx }, rx)
    }

    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}
