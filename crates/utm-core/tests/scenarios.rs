//! End-to-end scenarios (S1-S6) and the universal invariants of §8, run
//! synchronously against `Service` — no server process, no network hop,
//! since the crate has no HTTP surface to drive requests over.

use utm_core::{Config, MissionPhase, Point4D, Service, Trajectory, UtmError, Vehicle, Zone};

fn vehicles_near(positions: &[(f64, f64)]) -> Vec<Vehicle> {
    positions
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| Vehicle::new(i as u64 + 1, Point4D::new(lat, lon, 0.0, 0.0)))
        .collect()
}

fn straight_line_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    utm_core::geometry::haversine_distance(a.0, a.1, b.0, b.1)
}

fn path_length_m(trajectory: &Trajectory) -> f64 {
    trajectory
        .waypoints
        .windows(2)
        .map(|w| utm_core::geometry::haversine_distance(w[0].point.lat, w[0].point.lon, w[1].point.lat, w[1].point.lon))
        .sum()
}

/// Every pair of waypoints within a trajectory has strictly increasing time
/// (invariant 4) and every segment's implied speed stays within bounds
/// (invariant 5).
fn assert_monotone_time_and_speed(trajectory: &Trajectory, max_speed_mps: f64) {
    for pair in trajectory.waypoints.windows(2) {
        assert!(pair[1].point.t_s > pair[0].point.t_s, "time must be strictly increasing");
        let dt = pair[1].point.t_s - pair[0].point.t_s;
        let d = utm_core::geometry::haversine_distance(pair[0].point.lat, pair[0].point.lon, pair[1].point.lat, pair[1].point.lon);
        assert!(d / dt <= max_speed_mps + 1e-6, "segment speed {} exceeds max {}", d / dt, max_speed_mps);
    }
}

fn assert_altitude_legal(trajectory: &Trajectory, config: &Config) {
    let (north_m, east_m) = utm_core::geometry::north_east_offset_m(
        trajectory.waypoints.first().unwrap().point.horizontal(),
        trajectory.waypoints.last().unwrap().point.horizontal(),
    );
    let direction = utm_core::Direction::dominant(north_m, east_m);
    let lanes = config.lane_altitudes(direction);
    let altitude = trajectory.waypoints[0].point.alt_m;
    assert!(lanes.iter().any(|&a| (a - altitude).abs() < 1e-6), "altitude {altitude} not in lane set {lanes:?}");
}

/// Whether any waypoint or interpolated segment sample of `trajectory` falls
/// inside `zone` (inclusive boundary, per SENSITIVE zone semantics).
fn trajectory_intersects_zone(trajectory: &Trajectory, zone: &Zone) -> bool {
    for w in &trajectory.waypoints {
        if zone.contains(w.point.lat, w.point.lon) {
            return true;
        }
    }
    for pair in trajectory.waypoints.windows(2) {
        for step in 0..=20 {
            let frac = step as f64 / 20.0;
            let lat = pair[0].point.lat + frac * (pair[1].point.lat - pair[0].point.lat);
            let lon = pair[0].point.lon + frac * (pair[1].point.lon - pair[0].point.lon);
            if zone.contains(lat, lon) {
                return true;
            }
        }
    }
    false
}

fn assert_no_no_fly_intersection(trajectory: &Trajectory, config: &Config) {
    for zone in &config.no_fly_zones {
        for w in &trajectory.waypoints {
            assert!(!zone.contains(w.point.lat, w.point.lon), "waypoint inside a NO_FLY zone");
        }
        for pair in trajectory.waypoints.windows(2) {
            for step in 0..=20 {
                let frac = step as f64 / 20.0;
                let lat = pair[0].point.lat + frac * (pair[1].point.lat - pair[0].point.lat);
                let lon = pair[0].point.lon + frac * (pair[1].point.lon - pair[0].point.lon);
                assert!(!zone.contains(lat, lon), "segment crosses a NO_FLY zone");
            }
        }
    }
}

#[test]
fn s1_direct_route_succeeds_with_no_conflicts() {
    let config = Config::default();
    let service = Service::new(config.clone(), vehicles_near(&[(37.77, -122.43)]));

    let pickup = (37.77, -122.43);
    let delivery = (37.75, -122.41);
    let mission_id = service.submit_delivery(pickup, delivery).expect("should succeed");

    let mission = service.get_mission(mission_id).unwrap();
    assert_monotone_time_and_speed(&mission.trajectory, config.drone_max_speed_mps);
    assert_altitude_legal(&mission.trajectory, &config);
    assert_eq!(mission.trajectory.waypoints.first().unwrap().point.horizontal(), pickup);
    assert_eq!(mission.trajectory.waypoints.last().unwrap().point.horizontal(), delivery);
}

#[test]
fn s2_five_simultaneous_requests_commit_conflict_free() {
    let config = Config::default();
    let pickup = (37.77, -122.43);
    let delivery = (37.75, -122.41);
    let positions: Vec<(f64, f64)> = (0..5).map(|_| pickup).collect();
    let service = Service::new(config.clone(), vehicles_near(&positions));

    let mut committed = Vec::new();
    for _ in 0..5 {
        match service.submit_delivery(pickup, delivery) {
            Ok(id) => committed.push(id),
            Err(UtmError::ResolutionFailed) | Err(UtmError::NoVehicle) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(!committed.is_empty());

    let missions: Vec<_> = committed.iter().map(|&id| service.get_mission(id).unwrap()).collect();
    let trajectories: Vec<(u64, Trajectory)> = missions.iter().map(|m| (m.id, m.trajectory.clone())).collect();
    let refs: Vec<(u64, &Trajectory)> = trajectories.iter().map(|(id, t)| (*id, t)).collect();
    for (i, (id_a, traj_a)) in refs.iter().enumerate() {
        let others: Vec<(u64, &Trajectory)> = refs[i + 1..].to_vec();
        let conflicts = utm_core::conflict::detect(
            *id_a,
            *traj_a,
            &others,
            config.time_resolution_s,
            config.horizontal_separation_m,
            config.vertical_separation_m,
        );
        assert!(conflicts.is_empty(), "committed set must be conflict-free");
    }

    let distinct_altitudes = missions
        .iter()
        .map(|m| m.trajectory.waypoints[0].point.alt_m)
        .collect::<std::collections::HashSet<_>>()
        .len();
    let any_damped = missions.iter().any(|m| {
        m.trajectory
            .waypoints
            .iter()
            .any(|w| w.speed_mps > 0.0 && w.speed_mps < config.drone_cruise_speed_mps - 1e-6)
    });
    assert!(distinct_altitudes >= 2 || any_damped, "resolution must diversify altitude or damp speed");
}

#[test]
fn s3_routes_around_the_airport_no_fly_zone() {
    let config = Config::default();
    let pickup = (37.77, -122.43);
    let delivery = (37.61, -122.37);
    let service = Service::new(config.clone(), vehicles_near(&[pickup]));

    let mission_id = service.submit_delivery(pickup, delivery).expect("should route around the zone");
    let mission = service.get_mission(mission_id).unwrap();
    assert_no_no_fly_intersection(&mission.trajectory, &config);
    assert!(path_length_m(&mission.trajectory) > straight_line_distance_m(pickup, delivery));
}

#[test]
fn s4_avoids_or_accepts_the_hospital_sensitive_cost() {
    let config = Config::default();
    let pickup = (37.78, -122.44);
    let delivery = (37.74, -122.40);
    let service = Service::new(config.clone(), vehicles_near(&[pickup]));

    let mission_id = service.submit_delivery(pickup, delivery).expect("should succeed");
    let mission = service.get_mission(mission_id).unwrap();
    assert_monotone_time_and_speed(&mission.trajectory, config.drone_max_speed_mps);

    // Either the path never samples inside the Hospital SENSITIVE zone, or it
    // does and the resulting path is essentially direct — the planner only
    // pays the zone's cost multiplier when doing so is still cheaper than
    // detouring around it, so a path that crosses should track the
    // straight-line distance rather than show signs of a wasted detour.
    let hospital = &config.sensitive_areas[0];
    let crosses = trajectory_intersects_zone(&mission.trajectory, hospital);
    let straight = straight_line_distance_m(pickup, delivery);
    let path_len = path_length_m(&mission.trajectory);
    assert!(
        !crosses || path_len <= straight * 1.05,
        "path crosses the Hospital zone but is {path_len}m long against a straight-line {straight}m — looks like a wasted detour, not a cost-optimal crossing"
    );
}

#[test]
fn s5_pickup_inside_no_fly_zone_is_out_of_bounds() {
    let config = Config::default();
    let zone = config.no_fly_zones[0];
    let inside = ((zone.min_lat + zone.max_lat) / 2.0, (zone.min_lon + zone.max_lon) / 2.0);
    let service = Service::new(config, vehicles_near(&[(37.75, -122.41)]));

    let err = service.submit_delivery(inside, (37.75, -122.41)).unwrap_err();
    assert!(matches!(err, UtmError::OutOfBounds { .. }));
}

#[test]
fn s6_opposed_requests_diverge_in_altitude_or_time() {
    let config = Config::default();
    let a = (37.77, -122.43);
    let b = (37.75, -122.41);
    let service = Service::new(config.clone(), vehicles_near(&[a, b]));

    let first_id = service.submit_delivery(a, b).expect("first leg should succeed");
    let second_id = service.submit_delivery(b, a).expect("opposed leg should resolve");

    let first = service.get_mission(first_id).unwrap();
    let second = service.get_mission(second_id).unwrap();

    let alt_a = first.trajectory.waypoints[0].point.alt_m;
    let alt_b = second.trajectory.waypoints[0].point.alt_m;
    let altitudes_differ = (alt_a - alt_b).abs() > 1e-6;

    let trajectories = [(first.id, &first.trajectory), (second.id, &second.trajectory)];
    let conflicts = utm_core::conflict::detect(
        trajectories[0].0,
        trajectories[0].1,
        &trajectories[1..],
        config.time_resolution_s,
        config.horizontal_separation_m,
        config.vertical_separation_m,
    );
    assert!(altitudes_differ || conflicts.is_empty(), "opposed routes must diverge in altitude or resolve their conflict");
}

#[test]
fn pickup_equal_to_delivery_is_unroutable() {
    let config = Config::default();
    let point = (37.77, -122.43);
    let service = Service::new(config, vehicles_near(&[point]));
    let err = service.submit_delivery(point, point).unwrap_err();
    assert!(matches!(err, UtmError::Unroutable));
}

#[test]
fn resubmitting_after_removal_yields_a_comparable_trajectory() {
    let config = Config::default();
    let pickup = (37.77, -122.43);
    let delivery = (37.75, -122.41);
    let service = Service::new(config, vehicles_near(&[pickup, pickup]));

    let first_id = service.submit_delivery(pickup, delivery).unwrap();
    let first = service.get_mission(first_id).unwrap();
    service.mark_mission_phase(first_id, MissionPhase::EnRoutePickup).unwrap();
    service.mark_mission_phase(first_id, MissionPhase::Carrying).unwrap();
    service.mark_mission_phase(first_id, MissionPhase::Failed).unwrap();

    let second_id = service.submit_delivery(pickup, delivery).unwrap();
    let second = service.get_mission(second_id).unwrap();
    assert_eq!(path_length_m(&first.trajectory).round(), path_length_m(&second.trajectory).round());
}

#[test]
fn vehicle_exclusivity_holds_across_missions() {
    let config = Config::default();
    let pickup = (37.77, -122.43);
    let delivery = (37.75, -122.41);
    let service = Service::new(config, vehicles_near(&[pickup]));

    let first = service.submit_delivery(pickup, delivery).unwrap();
    let err = service.submit_delivery(pickup, delivery).unwrap_err();
    assert!(matches!(err, UtmError::NoVehicle));

    service.mark_mission_phase(first, MissionPhase::EnRoutePickup).unwrap();
    service.mark_mission_phase(first, MissionPhase::Carrying).unwrap();
    service.mark_mission_phase(first, MissionPhase::Delivered).unwrap();

    // Vehicle is released after delivery; a fresh request should now succeed.
    service.submit_delivery(pickup, delivery).expect("vehicle should be idle again");
}
