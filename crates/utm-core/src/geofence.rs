//! Geofence Index (C2): the immutable set of NO_FLY and SENSITIVE
//! rectangles loaded once at startup.

use crate::geometry::haversine_distance;
use crate::model::{Zone, ZoneKind};

/// Holds the zone set and answers point/segment classification queries. A
/// linear scan is fine at PoC scale (§4.2); callers only see `classify`, so
/// a future R-tree-backed index can replace the scan without touching the
/// contract.
#[derive(Debug, Clone, Default)]
pub struct GeofenceIndex {
    zones: Vec<Zone>,
}

impl GeofenceIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// `(forbidden, cost_multiplier)` for a single (lat, lon) point.
    ///
    /// NO_FLY zones use strict-inside containment (the boundary itself is
    /// forbidden but not inside); any NO_FLY match short-circuits to
    /// `(true, f64::INFINITY)`. Otherwise the multiplier is the product of
    /// every SENSITIVE zone containing the point (inclusive boundary),
    /// defaulting to 1.0 when none match (DESIGN.md OQ3).
    pub fn classify(&self, lat: f64, lon: f64) -> (bool, f64) {
        let mut multiplier = 1.0;
        for zone in &self.zones {
            if !zone.contains(lat, lon) {
                continue;
            }
            match zone.kind {
                ZoneKind::NoFly => return (true, f64::INFINITY),
                ZoneKind::Sensitive { multiplier: m } => multiplier *= m,
            }
        }
        (false, multiplier)
    }

    pub fn is_forbidden(&self, lat: f64, lon: f64) -> bool {
        self.classify(lat, lon).0
    }

    /// Whether the segment from `a` to `b` passes through any NO_FLY zone,
    /// sampled at roughly `step_m` intervals (adaptive, clamped to a
    /// sensible range so long segments don't blow up the sample count).
    pub fn segment_intersects_no_fly(&self, a: (f64, f64), b: (f64, f64), step_m: f64) -> bool {
        let dist = haversine_distance(a.0, a.1, b.0, b.1);
        if dist < 1e-6 {
            return self.is_forbidden(a.0, a.1);
        }
        let steps = ((dist / step_m).ceil() as usize).clamp(1, 200);
        for i in 0..=steps {
            let frac = i as f64 / steps as f64;
            let lat = a.0 + frac * (b.0 - a.0);
            let lon = a.1 + frac * (b.1 - a.1);
            if self.is_forbidden(lat, lon) {
                return true;
            }
        }
        false
    }
}
