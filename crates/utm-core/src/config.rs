//! Environment-driven configuration (§6, §6A).
//!
//! Follows the same "parse-or-default, bail on garbage" idiom as this
//! lineage's `Config::from_env()`: an unset `UTM_*` variable falls back to
//! its documented default; a variable that is set but fails to parse is a
//! startup-time error instead of a silently wrong default.

use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, Direction, Zone};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid_resolution_m: f64,
    pub time_resolution_s: f64,
    pub horizontal_separation_m: f64,
    pub vertical_separation_m: f64,
    pub drone_max_speed_mps: f64,
    pub drone_cruise_speed_mps: f64,
    pub direction_altitude_map: HashMap<Direction, Vec<f64>>,
    pub no_fly_zones: Vec<Zone>,
    pub sensitive_areas: Vec<Zone>,
    pub operational_bounds: BoundingBox,
    pub max_expansions: usize,
    pub max_resolve_retries: usize,
    pub speed_min_ratio: f64,
    pub dynamic_penalty: f64,
    pub resolver_deadline_s: f64,
}

impl Default for Config {
    /// The SF operational area used throughout §8's scenarios: an Airport
    /// NO_FLY rectangle and a Hospital SENSITIVE rectangle (4x cost) inside
    /// bounds lat 37.60-37.80, lon -122.45 to -122.35.
    fn default() -> Self {
        let mut direction_altitude_map = HashMap::new();
        direction_altitude_map.insert(Direction::North, vec![50.0, 90.0]);
        direction_altitude_map.insert(Direction::South, vec![50.0, 90.0]);
        direction_altitude_map.insert(Direction::East, vec![30.0, 70.0, 110.0]);
        direction_altitude_map.insert(Direction::West, vec![30.0, 70.0, 110.0]);

        Self {
            grid_resolution_m: 50.0,
            time_resolution_s: 5.0,
            horizontal_separation_m: 30.0,
            vertical_separation_m: 15.0,
            drone_max_speed_mps: 15.0,
            drone_cruise_speed_mps: 10.0,
            direction_altitude_map,
            no_fly_zones: vec![Zone::no_fly(37.615, 37.625, -122.395, -122.375)],
            sensitive_areas: vec![Zone::sensitive(37.705, 37.715, -122.42, -122.41, 4.0)],
            operational_bounds: BoundingBox {
                min_lat: 37.60,
                max_lat: 37.80,
                min_lon: -122.45,
                max_lon: -122.35,
            },
            max_expansions: 20_000,
            max_resolve_retries: 3,
            speed_min_ratio: 0.3,
            dynamic_penalty: 1_000.0,
            resolver_deadline_s: 5.0,
        }
    }
}

impl Config {
    /// Lane altitudes for `direction`, highest first only conceptually —
    /// the map is stored in the configured (ascending) order; callers that
    /// need "highest"/"lowest" index into `first()`/`last()`.
    pub fn lane_altitudes(&self, direction: Direction) -> &[f64] {
        self.direction_altitude_map
            .get(&direction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let grid_resolution_m = parse_env_or("UTM_GRID_RESOLUTION", defaults.grid_resolution_m)?;
        let time_resolution_s = parse_env_or("UTM_TIME_RESOLUTION", defaults.time_resolution_s)?;
        let horizontal_separation_m =
            parse_env_or("UTM_HORIZONTAL_SEPARATION", defaults.horizontal_separation_m)?;
        let vertical_separation_m =
            parse_env_or("UTM_VERTICAL_SEPARATION", defaults.vertical_separation_m)?;
        let drone_max_speed_mps = parse_env_or("UTM_DRONE_MAX_SPEED", defaults.drone_max_speed_mps)?;
        let drone_cruise_speed_mps =
            parse_env_or("UTM_DRONE_CRUISE_SPEED", defaults.drone_cruise_speed_mps)?;
        let max_expansions = parse_env_or("UTM_MAX_EXPANSIONS", defaults.max_expansions)?;
        let max_resolve_retries =
            parse_env_or("UTM_MAX_RESOLVE_RETRIES", defaults.max_resolve_retries)?;
        let speed_min_ratio = parse_env_or("UTM_SPEED_MIN_RATIO", defaults.speed_min_ratio)?;
        let dynamic_penalty = parse_env_or("UTM_DYNAMIC_PENALTY", defaults.dynamic_penalty)?;
        let resolver_deadline_s = parse_env_or("UTM_RESOLVER_DEADLINE", defaults.resolver_deadline_s)?;

        let direction_altitude_map = parse_json_env_or(
            "UTM_DIRECTION_ALTITUDE_MAP_JSON",
            defaults.direction_altitude_map,
        )?;
        let no_fly_zones = parse_json_env_or("UTM_NO_FLY_ZONES_JSON", defaults.no_fly_zones)?;
        let sensitive_areas = parse_json_env_or("UTM_SENSITIVE_AREAS_JSON", defaults.sensitive_areas)?;
        let operational_bounds =
            parse_json_env_or("UTM_OPERATIONAL_BOUNDS_JSON", defaults.operational_bounds)?;

        Ok(Self {
            grid_resolution_m,
            time_resolution_s,
            horizontal_separation_m,
            vertical_separation_m,
            drone_max_speed_mps,
            drone_cruise_speed_mps,
            direction_altitude_map,
            no_fly_zones,
            sensitive_areas,
            operational_bounds,
            max_expansions,
            max_resolve_retries,
            speed_min_ratio,
            dynamic_penalty,
            resolver_deadline_s,
        })
    }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} is set but failed to parse: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_json_env_or<T: for<'de> Deserialize<'de>>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("{key} is set but is not valid JSON for its type")),
        Err(_) => Ok(default),
    }
}
