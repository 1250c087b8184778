//! Conflict Detector (C5): time-aligned sampling between a candidate
//! trajectory and the committed set it overlaps.
//!
//! Fixed-step sampling over the overlapping time window, with linear
//! interpolation between waypoints and separation checked against each
//! committed trajectory independently.

use crate::geometry::{haversine_distance, vertical_distance};
use crate::model::{Conflict, Trajectory};

/// Enumerate conflicts between `candidate` (mission id `candidate_id`) and
/// every trajectory in `committed`, reporting at most one — the earliest —
/// conflict per pair (§4.5).
pub fn detect(
    candidate_id: u64,
    candidate: &Trajectory,
    committed: &[(u64, &Trajectory)],
    time_resolution_s: f64,
    horizontal_separation_m: f64,
    vertical_separation_m: f64,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for &(other_id, other) in committed {
        let overlap_start = candidate.t_start().max(other.t_start());
        let overlap_end = candidate.t_end().min(other.t_end());
        if overlap_start > overlap_end {
            continue;
        }

        let mut t = overlap_start;
        let mut found = None;
        loop {
            if let (Some(pa), Some(pb)) = (candidate.position_at(t), other.position_at(t)) {
                let h_sep = haversine_distance(pa.lat, pa.lon, pb.lat, pb.lon);
                let v_sep = vertical_distance(pa, pb);
                if h_sep < horizontal_separation_m && v_sep < vertical_separation_m {
                    found = Some(Conflict {
                        mission_a: candidate_id,
                        mission_b: other_id,
                        point_a: pa,
                        point_b: pb,
                        t,
                        h_sep,
                        v_sep,
                    });
                    break;
                }
            }
            if t >= overlap_end {
                break;
            }
            t = (t + time_resolution_s).min(overlap_end);
        }

        if let Some(c) = found {
            conflicts.push(c);
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point4D, Waypoint};

    fn straight(lat0: f64, lon0: f64, lat1: f64, lon1: f64, alt: f64, t0: f64, t1: f64) -> Trajectory {
        Trajectory::new(vec![
            Waypoint::new(Point4D::new(lat0, lon0, alt, t0), 10.0),
            Waypoint::new(Point4D::new(lat1, lon1, alt, t1), 0.0),
        ])
    }

    #[test]
    fn no_conflict_when_well_separated() {
        let a = straight(37.77, -122.43, 37.75, -122.41, 50.0, 0.0, 200.0);
        let b = straight(37.60, -122.45, 37.61, -122.44, 50.0, 0.0, 200.0);
        let committed = [(2u64, &b)];
        let out = detect(1, &a, &committed, 5.0, 30.0, 15.0);
        assert!(out.is_empty());
    }

    #[test]
    fn head_on_crossing_is_a_conflict() {
        let a = straight(37.70, -122.43, 37.70, -122.41, 50.0, 0.0, 200.0);
        let b = straight(37.70, -122.41, 37.70, -122.43, 50.0, 0.0, 200.0);
        let committed = [(2u64, &b)];
        let out = detect(1, &a, &committed, 5.0, 30.0, 15.0);
        assert_eq!(out.len(), 1);
        assert!(out[0].h_sep < 30.0);
        assert!(out[0].v_sep < 15.0);
    }

    #[test]
    fn different_altitude_bands_do_not_conflict() {
        let a = straight(37.70, -122.43, 37.70, -122.41, 30.0, 0.0, 200.0);
        let b = straight(37.70, -122.41, 37.70, -122.43, 90.0, 0.0, 200.0);
        let committed = [(2u64, &b)];
        let out = detect(1, &a, &committed, 5.0, 30.0, 15.0);
        assert!(out.is_empty());
    }

    #[test]
    fn reports_only_the_earliest_conflict_per_pair() {
        // Two trajectories that coincide at the start and drift apart, then
        // converge again later; only the first (earliest) encounter should
        // be reported.
        let a = Trajectory::new(vec![
            Waypoint::new(Point4D::new(37.70, -122.43, 50.0, 0.0), 10.0),
            Waypoint::new(Point4D::new(37.70, -122.43, 50.0, 50.0), 10.0),
            Waypoint::new(Point4D::new(37.72, -122.43, 50.0, 150.0), 10.0),
            Waypoint::new(Point4D::new(37.70, -122.43, 50.0, 250.0), 0.0),
        ]);
        let b = Trajectory::new(vec![
            Waypoint::new(Point4D::new(37.70, -122.43, 50.0, 0.0), 10.0),
            Waypoint::new(Point4D::new(37.70, -122.43, 50.0, 250.0), 0.0),
        ]);
        let committed = [(2u64, &b)];
        let out = detect(1, &a, &committed, 5.0, 30.0, 15.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].t, 0.0);
    }
}
