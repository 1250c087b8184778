//! Resolver + Committer (C6): mediates between the planner and the
//! conflict detector, applying the bounded resolution policy of §4.6
//! before committing atomically to the Trajectory Store.
//!
//! A booking-guarded retry loop that tries escalating parameters and
//! accepts the first conflict-free attempt, failing the whole request on
//! exhaustion: altitude re-stratification, then speed damping, then a
//! bounded number of dynamic-replan attempts with an escalating penalty.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::conflict;
use crate::config::Config;
use crate::error::{ResolveError, UtmError};
use crate::events::{Event, EventSink};
use crate::geofence::GeofenceIndex;
use crate::geometry::north_east_offset_m;
use crate::model::{Conflict, Direction, Mission, MissionPhase, Point4D, Trajectory, Waypoint};
use crate::planner::{self, DynamicObstacle, PlanRequest};
use crate::store::TrajectoryStore;

pub fn resolve(
    store: &TrajectoryStore,
    geofence: &GeofenceIndex,
    config: &Config,
    pickup: (f64, f64),
    delivery: (f64, f64),
    events: &EventSink,
) -> Result<Mission, UtmError> {
    if pickup == delivery {
        return Err(UtmError::Unroutable);
    }

    let started = Instant::now();
    let deadline = Duration::from_secs_f64(config.resolver_deadline_s);
    let check_deadline = || -> Result<(), UtmError> {
        if started.elapsed() >= deadline {
            Err(ResolveError::DeadlineExceeded { deadline_s: config.resolver_deadline_s }.into())
        } else {
            Ok(())
        }
    };

    let vehicle_id = store.assign_idle_vehicle(pickup).ok_or(UtmError::NoVehicle)?;

    let (north_m, east_m) = north_east_offset_m(pickup, delivery);
    let direction = Direction::dominant(north_m, east_m);
    let lanes = config.lane_altitudes(direction).to_vec();
    if lanes.is_empty() {
        return Err(UtmError::Unroutable);
    }

    let mut altitude = lanes[0];
    let mut trajectory = plan_leg(geofence, config, pickup, delivery, altitude, &[], config.dynamic_penalty)
        .map_err(|_| UtmError::Unroutable)?;
    let mut conflicts = detect_conflicts(store, config, &trajectory);
    emit_conflicts(events, &conflicts);

    // (a) altitude re-stratification: at most one attempt, only useful when
    // more than one lane is available for this direction class.
    if !conflicts.is_empty() && lanes.len() > 1 {
        check_deadline()?;
        let alternate = *lanes.last().unwrap();
        if (alternate - altitude).abs() > 1e-9 {
            debug!(from = altitude, to = alternate, "resolver: attempting altitude re-stratification");
            if let Ok(t) = plan_leg(geofence, config, pickup, delivery, alternate, &[], config.dynamic_penalty) {
                let c = detect_conflicts(store, config, &t);
                emit_conflicts(events, &c);
                altitude = alternate;
                trajectory = t;
                conflicts = c;
            }
        }
    }

    // (b) speed damping: at most one attempt.
    if !conflicts.is_empty() {
        check_deadline()?;
        debug!("resolver: attempting speed damping");
        let damped = apply_speed_damping(&trajectory, &conflicts, config.speed_min_ratio, config.time_resolution_s, config.drone_cruise_speed_mps);
        let c = detect_conflicts(store, config, &damped);
        emit_conflicts(events, &c);
        trajectory = damped;
        conflicts = c;
    }

    // (c) dynamic replan: up to MAX_RESOLVE_RETRIES attempts with
    // increasing DYNAMIC_PENALTY.
    if !conflicts.is_empty() {
        for attempt in 0..config.max_resolve_retries {
            check_deadline()?;
            let penalty = config.dynamic_penalty * (attempt as f64 + 1.0);
            debug!(attempt, penalty, "resolver: attempting dynamic replan");
            let committed = store.active_between(trajectory.t_start(), trajectory.t_end());
            let dynamic_obstacles: Vec<DynamicObstacle> =
                committed.iter().map(|(_, t)| DynamicObstacle { trajectory: t }).collect();
            if let Ok(t) = plan_leg(geofence, config, pickup, delivery, altitude, &dynamic_obstacles, penalty) {
                let c = detect_conflicts(store, config, &t);
                emit_conflicts(events, &c);
                let still_conflicting = !c.is_empty();
                trajectory = t;
                conflicts = c;
                if !still_conflicting {
                    break;
                }
            }
        }
    }

    if !conflicts.is_empty() {
        warn!(pickup = ?pickup, delivery = ?delivery, "resolver: all strategies exhausted, rejecting request");
        return Err(ResolveError::AllStrategiesExhausted { remaining: conflicts.len() }.into());
    }

    let mission_id = store.next_mission_id();
    let mission = Mission {
        id: mission_id,
        vehicle_id,
        pickup,
        delivery,
        trajectory,
        phase: MissionPhase::Planned,
    };
    // The commit critical section inside `insert` re-validates the vehicle
    // is still IDLE; losing that race here means another resolver won it
    // first, which this spec's NoVehicle error already covers.
    store.insert(mission.clone()).map_err(|_| UtmError::NoVehicle)?;
    info!(mission_id, vehicle_id, "resolver: committed mission");
    events.emit(Event::MissionCreated { mission_id, vehicle_id });
    Ok(mission)
}

fn plan_leg<'a>(
    geofence: &'a GeofenceIndex,
    config: &Config,
    pickup: (f64, f64),
    delivery: (f64, f64),
    altitude: f64,
    dynamic_obstacles: &'a [DynamicObstacle<'a>],
    dynamic_penalty: f64,
) -> Result<Trajectory, crate::error::PlanError> {
    planner::plan(&PlanRequest {
        start: pickup,
        goal: delivery,
        altitude_m: altitude,
        t0: 0.0,
        grid_resolution_m: config.grid_resolution_m,
        time_resolution_s: config.time_resolution_s,
        max_speed_mps: config.drone_max_speed_mps,
        cruise_speed_mps: config.drone_cruise_speed_mps,
        max_expansions: config.max_expansions,
        geofence,
        dynamic_obstacles,
        horizontal_separation_m: config.horizontal_separation_m,
        vertical_separation_m: config.vertical_separation_m,
        dynamic_penalty,
    })
}

fn emit_conflicts(events: &EventSink, conflicts: &[Conflict]) {
    for c in conflicts {
        events.emit(Event::ConflictDetected { conflict: *c });
    }
}

fn detect_conflicts(store: &TrajectoryStore, config: &Config, trajectory: &Trajectory) -> Vec<Conflict> {
    let committed = store.active_between(trajectory.t_start(), trajectory.t_end());
    let committed_refs: Vec<(u64, &Trajectory)> = committed.iter().map(|(id, t)| (*id, t)).collect();
    conflict::detect(
        0,
        trajectory,
        &committed_refs,
        config.time_resolution_s,
        config.horizontal_separation_m,
        config.vertical_separation_m,
    )
}

/// Scales waypoints up to the earliest conflict time by the minimum
/// slowdown factor `s` across all conflicts such that the vehicle now
/// arrives at the conflict point at least `TIME_RESOLUTION` later than
/// before, then shifts later waypoints by the same added delay and
/// restores cruise speed (§4.6 step 5b).
fn apply_speed_damping(trajectory: &Trajectory, conflicts: &[Conflict], speed_min_ratio: f64, time_resolution_s: f64, cruise_speed_mps: f64) -> Trajectory {
    let t0 = trajectory.t_start();
    let earliest_conflict_t = conflicts.iter().map(|c| c.t).fold(f64::INFINITY, f64::min);

    let mut s = 1.0f64;
    for c in conflicts {
        let t_to_conflict = c.t - t0;
        if t_to_conflict <= 0.0 {
            continue;
        }
        let required = t_to_conflict / (t_to_conflict + time_resolution_s);
        s = s.min(required);
    }
    s = s.max(speed_min_ratio);

    let mut new_waypoints = Vec::with_capacity(trajectory.waypoints.len());
    let mut added_delay = 0.0;
    for w in &trajectory.waypoints {
        if w.point.t_s <= earliest_conflict_t {
            let elapsed = w.point.t_s - t0;
            let new_t = t0 + elapsed / s;
            added_delay = new_t - w.point.t_s;
            new_waypoints.push(Waypoint::new(
                Point4D::new(w.point.lat, w.point.lon, w.point.alt_m, new_t),
                w.speed_mps * s,
            ));
        } else {
            let restored_speed = if w.speed_mps > 0.0 { cruise_speed_mps } else { 0.0 };
            new_waypoints.push(Waypoint::new(
                Point4D::new(w.point.lat, w.point.lon, w.point.alt_m, w.point.t_s + added_delay),
                restored_speed,
            ));
        }
    }
    Trajectory::new(new_waypoints)
}
