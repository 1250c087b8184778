//! Service facade (C7): the only supported entry point into the core,
//! wiring C1-C6 behind the six operations of §6.
//!
//! Config-load-then-construct-state shape, with no HTTP surface: no
//! router, no middleware, no listener. Owns the `Config`, the
//! `TrajectoryStore`, the immutable `GeofenceIndex`, and the sending half of
//! the event queue; intake bounds/no-fly validation happens here so the
//! resolver never has to see an out-of-bounds request.

use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use tracing::info;

use crate::config::Config;
use crate::error::UtmError;
use crate::events::{Event, EventSink};
use crate::geofence::GeofenceIndex;
use crate::model::{Mission, MissionPhase, Point4D, Vehicle};
use crate::resolver;
use crate::store::{StoreError, TrajectoryStore};

pub struct Service {
    config: Config,
    store: TrajectoryStore,
    geofence: GeofenceIndex,
    events_tx: EventSink,
    events_rx: Mutex<Option<Receiver<Event>>>,
}

impl Service {
    pub fn new(config: Config, vehicles: Vec<Vehicle>) -> Self {
        let mut zones = config.no_fly_zones.clone();
        zones.extend(config.sensitive_areas.clone());
        let geofence = GeofenceIndex::new(zones);
        let store = TrajectoryStore::new(vehicles);
        let (events_tx, events_rx) = EventSink::channel();
        info!(vehicles = store.list_vehicles().len(), "service: initialized");
        Self { config, store, geofence, events_tx, events_rx: Mutex::new(Some(events_rx)) }
    }

    /// Plans, resolves and commits a delivery from `pickup` to `delivery`,
    /// returning the new mission's id (§6).
    pub fn submit_delivery(&self, pickup: (f64, f64), delivery: (f64, f64)) -> Result<u64, UtmError> {
        self.check_bounds(pickup, delivery)?;
        let mission = resolver::resolve(&self.store, &self.geofence, &self.config, pickup, delivery, &self.events_tx)?;
        Ok(mission.id)
    }

    pub fn list_missions(&self) -> Vec<Mission> {
        self.store.list_missions()
    }

    pub fn get_mission(&self, mission_id: u64) -> Option<Mission> {
        self.store.get_mission(mission_id)
    }

    pub fn list_vehicles(&self) -> Vec<Vehicle> {
        self.store.list_vehicles()
    }

    pub fn update_vehicle_telemetry(&self, vehicle_id: u64, position: Point4D, battery: f64) -> Result<(), UtmError> {
        self.store
            .update_vehicle_telemetry(vehicle_id, position, battery)
            .map_err(map_store_error)?;
        self.events_tx.emit(Event::VehicleUpdated { vehicle_id, position });
        Ok(())
    }

    pub fn mark_mission_phase(&self, mission_id: u64, phase: MissionPhase) -> Result<(), UtmError> {
        self.store.mark_mission_phase(mission_id, phase).map_err(map_store_error)?;
        self.events_tx.emit(Event::MissionPhaseChanged { mission_id, phase });
        Ok(())
    }

    /// Hands out the receiving half of the event queue. `std::sync::mpsc`
    /// has a single consumer, so this can only succeed once per `Service`;
    /// later calls return `None`.
    pub fn subscribe_events(&self) -> Option<Receiver<Event>> {
        self.events_rx.lock().unwrap().take()
    }

    fn check_bounds(&self, pickup: (f64, f64), delivery: (f64, f64)) -> Result<(), UtmError> {
        let in_bounds = |p: (f64, f64)| self.config.operational_bounds.contains(p.0, p.1) && !self.geofence.is_forbidden(p.0, p.1);
        if !in_bounds(pickup) || !in_bounds(delivery) {
            return Err(UtmError::OutOfBounds {
                pickup_lat: pickup.0,
                pickup_lon: pickup.1,
                delivery_lat: delivery.0,
                delivery_lon: delivery.1,
            });
        }
        Ok(())
    }
}

fn map_store_error(e: StoreError) -> UtmError {
    match e {
        StoreError::UnknownVehicle(id) | StoreError::VehicleNotIdle(id) => UtmError::UnknownVehicle(id),
        StoreError::UnknownMission(id) => UtmError::UnknownMission(id),
        StoreError::IllegalTransition { from, to } => UtmError::IllegalTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        },
    }
}
