//! UTM Core - drone delivery traffic management: 4D planning, geofencing,
//! conflict detection and resolution.
//!
//! This crate contains the domain models and business logic with NO
//! networking dependencies; see `Service` for the supported entry point.

pub mod config;
pub mod conflict;
pub mod error;
pub mod events;
pub mod geofence;
pub mod geometry;
pub mod model;
pub mod planner;
pub mod resolver;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{PlanError, ResolveError, UtmError};
pub use events::{Event, EventSink};
pub use geofence::GeofenceIndex;
pub use model::{
    BoundingBox, Conflict, Direction, Mission, MissionPhase, Point4D, Trajectory, Vehicle, VehicleState, Waypoint,
    Zone, ZoneKind,
};
pub use service::Service;
pub use store::{StoreError, TrajectoryStore};
