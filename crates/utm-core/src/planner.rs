//! 4D A* planner (C4): time-aware shortest path over a discretized
//! lat/lon/altitude/time lattice.
//!
//! Binary-heap search over `FloatOrd`-keyed nodes, with a total `Ord` tie
//! break on `(f_score, h_score, insertion order)` for deterministic
//! expansion order. Search runs within a single altitude lane (snapped at
//! the endpoints, §4.4) with 8-connected horizontal motion per time step.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::PlanError;
use crate::geofence::GeofenceIndex;
use crate::geometry::haversine_distance;
use crate::model::{Point4D, Trajectory, Waypoint};

/// A committed trajectory's interpolated position, used as a dynamic
/// obstacle during resolver-driven replanning (§4.4).
pub struct DynamicObstacle<'a> {
    pub trajectory: &'a Trajectory,
}

pub struct PlanRequest<'a> {
    pub start: (f64, f64),
    pub goal: (f64, f64),
    pub altitude_m: f64,
    pub t0: f64,
    pub grid_resolution_m: f64,
    pub time_resolution_s: f64,
    pub max_speed_mps: f64,
    pub cruise_speed_mps: f64,
    pub max_expansions: usize,
    pub geofence: &'a GeofenceIndex,
    pub dynamic_obstacles: &'a [DynamicObstacle<'a>],
    pub horizontal_separation_m: f64,
    pub vertical_separation_m: f64,
    pub dynamic_penalty: f64,
}

/// Wraps an f64 for a total order via `total_cmp`, so it can sit in a
/// `BinaryHeap` key without the usual float-Ord problem (NaN never appears
/// here, but `total_cmp` makes the order well-defined regardless).
#[derive(Debug, Clone, Copy, PartialEq)]
struct FloatOrd(f64);

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    ix: i64,
    iy: i64,
    it: u32,
}

struct OpenNode {
    key: NodeKey,
    g_score: FloatOrd,
    f_score: FloatOrd,
    h_score: FloatOrd,
    seq: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.h_score == other.h_score && self.seq == other.seq
    }
}
impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    /// Lower f-score first; on ties, lower h-score first; on ties, earliest
    /// insertion (§4.4's tie-break) — inverted here because `BinaryHeap` is
    /// a max-heap and we want the "best" node to compare as greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.h_score.cmp(&self.h_score))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Grid {
    origin_lat: f64,
    origin_lon: f64,
    ref_lat: f64,
    resolution_m: f64,
}

impl Grid {
    fn to_cell(&self, lat: f64, lon: f64) -> (i64, i64) {
        let north_m = (lat - self.origin_lat) * crate::geometry::METERS_PER_DEG_LAT;
        let east_m = (lon - self.origin_lon) * crate::geometry::meters_per_deg_lon(self.ref_lat);
        (
            (east_m / self.resolution_m).round() as i64,
            (north_m / self.resolution_m).round() as i64,
        )
    }

    fn to_latlon(&self, ix: i64, iy: i64) -> (f64, f64) {
        let east_m = ix as f64 * self.resolution_m;
        let north_m = iy as f64 * self.resolution_m;
        let lat = self.origin_lat + north_m / crate::geometry::METERS_PER_DEG_LAT;
        let lon = self.origin_lon + east_m / crate::geometry::meters_per_deg_lon(self.ref_lat);
        (lat, lon)
    }
}

const NEIGHBOR_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Run the 4D A* search described in §4.4 and return a Trajectory from
/// `req.start` to `req.goal` at the fixed altitude `req.altitude_m`.
pub fn plan(req: &PlanRequest) -> Result<Trajectory, PlanError> {
    let ref_lat = (req.start.0 + req.goal.0) / 2.0;
    let grid = Grid {
        origin_lat: req.start.0,
        origin_lon: req.start.1,
        ref_lat,
        resolution_m: req.grid_resolution_m,
    };

    let start_cell = grid.to_cell(req.start.0, req.start.1);
    let goal_cell = grid.to_cell(req.goal.0, req.goal.1);

    if req.geofence.is_forbidden(req.start.0, req.start.1) || req.geofence.is_forbidden(req.goal.0, req.goal.1) {
        return Err(PlanError::StartOrGoalForbidden);
    }

    let start_key = NodeKey { ix: start_cell.0, iy: start_cell.1, it: 0 };
    let goal_latlon = grid.to_latlon(goal_cell.0, goal_cell.1);
    let h0 = haversine_distance(req.start.0, req.start.1, goal_latlon.0, goal_latlon.1);

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<NodeKey, f64> = HashMap::new();
    let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();
    let mut seq = 0u64;

    best_g.insert(start_key, 0.0);
    open.push(OpenNode {
        key: start_key,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(h0),
        h_score: FloatOrd(h0),
        seq,
    });

    let mut expansions = 0usize;

    while let Some(current) = open.pop() {
        if let Some(&recorded) = best_g.get(&current.key) {
            if current.g_score.0 > recorded + 1e-9 {
                continue; // stale entry
            }
        }

        if current.key.ix == goal_cell.0 && current.key.iy == goal_cell.1 {
            return Ok(reconstruct(&grid, &came_from, current.key, req));
        }

        expansions += 1;
        if expansions > req.max_expansions {
            return Err(PlanError::Exhausted);
        }

        let (cur_lat, cur_lon) = grid.to_latlon(current.key.ix, current.key.iy);
        let (cur_forbidden, cur_mult) = req.geofence.classify(cur_lat, cur_lon);
        if cur_forbidden {
            continue;
        }

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next_key = NodeKey {
                ix: current.key.ix + dx,
                iy: current.key.iy + dy,
                it: current.key.it + 1,
            };
            let (next_lat, next_lon) = grid.to_latlon(next_key.ix, next_key.iy);
            let (next_forbidden, next_mult) = req.geofence.classify(next_lat, next_lon);
            if next_forbidden {
                continue;
            }

            let dist = haversine_distance(cur_lat, cur_lon, next_lat, next_lon);
            if dist / req.time_resolution_s > req.max_speed_mps + 1e-6 {
                continue;
            }

            let avg_mult = (cur_mult + next_mult) / 2.0;
            let mut edge_cost = dist * avg_mult;

            let t_next = req.t0 + next_key.it as f64 * req.time_resolution_s;
            edge_cost += dynamic_penalty_at(req, next_lat, next_lon, req.altitude_m, t_next);

            let tentative_g = current.g_score.0 + edge_cost;
            let better = best_g
                .get(&next_key)
                .map(|&g| tentative_g < g - 1e-9)
                .unwrap_or(true);
            if better {
                best_g.insert(next_key, tentative_g);
                came_from.insert(next_key, current.key);
                let h = haversine_distance(next_lat, next_lon, goal_latlon.0, goal_latlon.1);
                seq += 1;
                open.push(OpenNode {
                    key: next_key,
                    g_score: FloatOrd(tentative_g),
                    f_score: FloatOrd(tentative_g + h),
                    h_score: FloatOrd(h),
                    seq,
                });
            }
        }
    }

    Err(PlanError::NoPath)
}

fn dynamic_penalty_at(req: &PlanRequest, lat: f64, lon: f64, alt_m: f64, t: f64) -> f64 {
    let mut penalty = 0.0;
    for obstacle in req.dynamic_obstacles {
        if let Some(pos) = obstacle.trajectory.position_at(t) {
            let h = haversine_distance(lat, lon, pos.lat, pos.lon);
            let v = (alt_m - pos.alt_m).abs();
            if h < req.horizontal_separation_m && v < req.vertical_separation_m {
                penalty += req.dynamic_penalty;
            }
        }
    }
    penalty
}

fn reconstruct(grid: &Grid, came_from: &HashMap<NodeKey, NodeKey>, goal: NodeKey, req: &PlanRequest) -> Trajectory {
    let mut path = vec![goal];
    let mut cur = goal;
    while let Some(&prev) = came_from.get(&cur) {
        path.push(prev);
        cur = prev;
    }
    path.reverse();

    let n = path.len();
    let waypoints: Vec<Waypoint> = path
        .into_iter()
        .enumerate()
        .map(|(i, key)| {
            let (lat, lon) = grid.to_latlon(key.ix, key.iy);
            let t = req.t0 + key.it as f64 * req.time_resolution_s;
            let speed = if i + 1 == n { 0.0 } else { req.cruise_speed_mps };
            Waypoint::new(Point4D::new(lat, lon, req.altitude_m, t), speed)
        })
        .collect();

    Trajectory::new(waypoints)
}
