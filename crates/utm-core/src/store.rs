//! Trajectory Store (C3): the single mutable shared resource (§5), owning
//! both the committed trajectory set and vehicle state.
//!
//! Uses a `DashMap`-per-concern layout for lock-free concurrent reads, with
//! a single `Mutex<()>` guarding the one sequence that must
//! observe-then-mutate both maps together. This core stays synchronous
//! (§9), so the guard is `std::sync::Mutex`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

use crate::geometry::haversine_distance;
use crate::model::{Mission, MissionPhase, Point4D, Trajectory, Vehicle, VehicleState};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("vehicle {0} is not idle")]
    VehicleNotIdle(u64),
    #[error("unknown vehicle {0}")]
    UnknownVehicle(u64),
    #[error("unknown mission {0}")]
    UnknownMission(u64),
    #[error("illegal phase transition {from:?} -> {to:?}")]
    IllegalTransition { from: MissionPhase, to: MissionPhase },
}

pub struct TrajectoryStore {
    missions: DashMap<u64, Mission>,
    vehicles: DashMap<u64, Vehicle>,
    /// Guards the re-read/re-check/commit sequence of §4.6 step 7 so two
    /// concurrent resolver attempts can never both observe the same
    /// vehicle as IDLE and both commit against it.
    commit_lock: Mutex<()>,
    next_mission_id: AtomicU64,
}

impl TrajectoryStore {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        let map = DashMap::new();
        for v in vehicles {
            map.insert(v.id, v);
        }
        Self {
            missions: DashMap::new(),
            vehicles: map,
            commit_lock: Mutex::new(()),
            next_mission_id: AtomicU64::new(1),
        }
    }

    pub fn next_mission_id(&self) -> u64 {
        self.next_mission_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Selects the IDLE vehicle minimizing horizontal distance to `pickup`,
    /// ties broken by lowest vehicle id (§4.3). A read-only selection: the
    /// vehicle is not reserved here. The only state-changing step is
    /// `insert`, inside the single commit critical section, which is what
    /// actually makes this selection safe under concurrent resolvers — see
    /// module docs.
    pub fn assign_idle_vehicle(&self, pickup: (f64, f64)) -> Option<u64> {
        let mut best: Option<(u64, f64)> = None;
        for entry in self.vehicles.iter() {
            let v = entry.value();
            if v.state != VehicleState::Idle {
                continue;
            }
            let dist = haversine_distance(v.position.lat, v.position.lon, pickup.0, pickup.1);
            best = match best {
                None => Some((v.id, dist)),
                Some((best_id, best_dist)) => {
                    if dist < best_dist - 1e-9 || ((dist - best_dist).abs() <= 1e-9 && v.id < best_id) {
                        Some((v.id, dist))
                    } else {
                        Some((best_id, best_dist))
                    }
                }
            };
        }
        best.map(|(id, _)| id)
    }

    /// Atomically commits `mission`, coupling it with the vehicle's
    /// IDLE -> ASSIGNED transition (§4.6 step 7). Rejects if the vehicle is
    /// no longer IDLE (another commit won the race since selection).
    pub fn insert(&self, mission: Mission) -> Result<(), StoreError> {
        let _guard = self.commit_lock.lock().unwrap();

        match self.vehicles.get(&mission.vehicle_id) {
            Some(v) if v.state == VehicleState::Idle => {}
            Some(_) => return Err(StoreError::VehicleNotIdle(mission.vehicle_id)),
            None => return Err(StoreError::UnknownVehicle(mission.vehicle_id)),
        }

        if let Some(mut v) = self.vehicles.get_mut(&mission.vehicle_id) {
            v.state = VehicleState::Assigned;
            v.current_mission = Some(mission.id);
        }
        self.missions.insert(mission.id, mission);
        Ok(())
    }

    /// Trajectories of non-terminal missions whose time span overlaps
    /// `[t_start, t_end]` (§4.3).
    pub fn active_between(&self, t_start: f64, t_end: f64) -> Vec<(u64, Trajectory)> {
        self.missions
            .iter()
            .filter(|e| !e.value().phase.is_terminal())
            .filter(|e| {
                let t = &e.value().trajectory;
                t.t_start() <= t_end && t.t_end() >= t_start
            })
            .map(|e| (*e.key(), e.value().trajectory.clone()))
            .collect()
    }

    pub fn list_missions(&self) -> Vec<Mission> {
        self.missions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn list_vehicles(&self) -> Vec<Vehicle> {
        self.vehicles.iter().map(|e| e.value().clone()).collect()
    }

    pub fn get_mission(&self, mission_id: u64) -> Option<Mission> {
        self.missions.get(&mission_id).map(|e| e.value().clone())
    }

    pub fn get_vehicle(&self, vehicle_id: u64) -> Option<Vehicle> {
        self.vehicles.get(&vehicle_id).map(|e| e.value().clone())
    }

    pub fn update_vehicle_telemetry(&self, vehicle_id: u64, position: Point4D, battery: f64) -> Result<(), StoreError> {
        let mut v = self
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or(StoreError::UnknownVehicle(vehicle_id))?;
        v.position = position;
        v.battery = battery;
        Ok(())
    }

    /// Validates and applies a mission phase transition (§3, §6). Reaching
    /// a terminal phase releases the vehicle to IDLE (Delivered) or
    /// UNAVAILABLE (Failed), same as `remove`, but keeps the mission record
    /// for `list_missions`.
    pub fn mark_mission_phase(&self, mission_id: u64, next: MissionPhase) -> Result<(), StoreError> {
        let _guard = self.commit_lock.lock().unwrap();
        let mut mission = self
            .missions
            .get_mut(&mission_id)
            .ok_or(StoreError::UnknownMission(mission_id))?;

        if !mission.phase.can_transition_to(next) {
            return Err(StoreError::IllegalTransition { from: mission.phase, to: next });
        }

        let vehicle_id = mission.vehicle_id;
        mission.phase = next;

        if next.is_terminal() {
            let release_to = if next == MissionPhase::Delivered {
                VehicleState::Idle
            } else {
                VehicleState::Unavailable
            };
            if let Some(mut v) = self.vehicles.get_mut(&vehicle_id) {
                v.state = release_to;
                v.current_mission = None;
            }
        }
        Ok(())
    }
}
