//! Core data model: points, trajectories, zones, vehicles, missions.

use serde::{Deserialize, Serialize};

/// A point in space and time: WGS-84 lat/lon, altitude AGL in meters, seconds
/// since the trajectory epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point4D {
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
    pub t_s: f64,
}

impl Point4D {
    pub fn new(lat: f64, lon: f64, alt_m: f64, t_s: f64) -> Self {
        Self { lat, lon, alt_m, t_s }
    }

    /// This point with `t_s` set to zero, for horizontal-only comparisons.
    pub fn horizontal(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// A Point4D plus the commanded speed on the segment departing it. The final
/// waypoint of a trajectory always has `speed_mps == 0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Point4D,
    pub speed_mps: f64,
}

impl Waypoint {
    pub fn new(point: Point4D, speed_mps: f64) -> Self {
        Self { point, speed_mps }
    }
}

/// An ordered, time-monotone sequence of waypoints from pickup to delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub waypoints: Vec<Waypoint>,
}

impl Trajectory {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn t_start(&self) -> f64 {
        self.waypoints.first().map(|w| w.point.t_s).unwrap_or(0.0)
    }

    pub fn t_end(&self) -> f64 {
        self.waypoints.last().map(|w| w.point.t_s).unwrap_or(0.0)
    }

    /// Linearly interpolate this trajectory's position at time `t`. Returns
    /// `None` if `t` falls outside `[t_start, t_end]`.
    pub fn position_at(&self, t: f64) -> Option<Point4D> {
        if self.waypoints.is_empty() || t < self.t_start() || t > self.t_end() {
            return None;
        }
        if self.waypoints.len() == 1 {
            return Some(self.waypoints[0].point);
        }
        for pair in self.waypoints.windows(2) {
            let (a, b) = (pair[0].point, pair[1].point);
            if t >= a.t_s && t <= b.t_s {
                let span = b.t_s - a.t_s;
                let frac = if span <= 0.0 { 0.0 } else { (t - a.t_s) / span };
                return Some(Point4D::new(
                    a.lat + frac * (b.lat - a.lat),
                    a.lon + frac * (b.lon - a.lon),
                    a.alt_m + frac * (b.alt_m - a.alt_m),
                    t,
                ));
            }
        }
        None
    }
}

/// Cardinal direction class used to pick an altitude lane set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Dominant direction of travel from `from` to `to`, classified in
    /// meters rather than raw lat/lon degrees (see DESIGN.md OQ1): at the
    /// operational latitude a degree of longitude is shorter than a degree
    /// of latitude, so degree deltas can disagree with the meter-resolution
    /// grid about which axis actually dominates.
    pub fn dominant(d_north_m: f64, d_east_m: f64) -> Self {
        if d_north_m.abs() >= d_east_m.abs() {
            if d_north_m >= 0.0 {
                Direction::North
            } else {
                Direction::South
            }
        } else if d_east_m >= 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    }
}

/// A static airspace constraint: an axis-aligned lat/lon rectangle tagged
/// NO_FLY (forbidden) or SENSITIVE (cost multiplier).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZoneKind {
    NoFly,
    Sensitive { multiplier: f64 },
}

impl Zone {
    pub fn no_fly(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { kind: ZoneKind::NoFly, min_lat, max_lat, min_lon, max_lon }
    }

    pub fn sensitive(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64, multiplier: f64) -> Self {
        Self { kind: ZoneKind::Sensitive { multiplier }, min_lat, max_lat, min_lon, max_lon }
    }

    /// Strict-inside for NO_FLY, inclusive for SENSITIVE (spec §4.2).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match self.kind {
            ZoneKind::NoFly => {
                lat > self.min_lat && lat < self.max_lat && lon > self.min_lon && lon < self.max_lon
            }
            ZoneKind::Sensitive { .. } => {
                lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
            }
        }
    }
}

/// An axis-aligned bounding box, used both for `OPERATIONAL_BOUNDS` and for
/// `Zone` rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn centroid(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleState {
    Idle,
    Assigned,
    InFlight,
    Returning,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub state: VehicleState,
    pub position: Point4D,
    pub current_mission: Option<u64>,
    pub battery: f64,
}

impl Vehicle {
    pub fn new(id: u64, position: Point4D) -> Self {
        Self {
            id,
            state: VehicleState::Idle,
            position,
            current_mission: None,
            battery: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionPhase {
    Planned,
    EnRoutePickup,
    Carrying,
    Delivered,
    Failed,
}

impl MissionPhase {
    /// Legal forward transitions for `mark_mission_phase`.
    pub fn can_transition_to(self, next: MissionPhase) -> bool {
        use MissionPhase::*;
        matches!(
            (self, next),
            (Planned, EnRoutePickup)
                | (EnRoutePickup, Carrying)
                | (Carrying, Delivered)
                | (Planned, Failed)
                | (EnRoutePickup, Failed)
                | (Carrying, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MissionPhase::Delivered | MissionPhase::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: u64,
    pub vehicle_id: u64,
    pub pickup: (f64, f64),
    pub delivery: (f64, f64),
    pub trajectory: Trajectory,
    pub phase: MissionPhase,
}

/// A detected spatio-temporal conflict between two committed trajectories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Conflict {
    pub mission_a: u64,
    pub mission_b: u64,
    pub point_a: Point4D,
    pub point_b: Point4D,
    pub t: f64,
    pub h_sep: f64,
    pub v_sep: f64,
}
