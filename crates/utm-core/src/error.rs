//! Error taxonomy for the service facade and its internal stages.

use thiserror::Error;

/// The closed set of errors the service facade (§6) can return.
#[derive(Debug, Error)]
pub enum UtmError {
    #[error("pickup ({pickup_lat}, {pickup_lon}) or delivery ({delivery_lat}, {delivery_lon}) is out of bounds or inside a no-fly zone")]
    OutOfBounds {
        pickup_lat: f64,
        pickup_lon: f64,
        delivery_lat: f64,
        delivery_lon: f64,
    },

    #[error("no idle vehicle available")]
    NoVehicle,

    #[error("planner could not find a path within the expansion budget")]
    Unroutable,

    #[error("conflicts remained after all resolution strategies")]
    ResolutionFailed,

    #[error("request exceeded its deadline of {deadline_s}s")]
    Timeout { deadline_s: f64 },

    #[error("illegal mission phase transition: {from:?} -> {to:?}")]
    IllegalTransition { from: String, to: String },

    #[error("unknown vehicle id {0}")]
    UnknownVehicle(u64),

    #[error("unknown mission id {0}")]
    UnknownMission(u64),
}

/// Planner-internal failure modes (§4.4). Mapped to `UtmError::Unroutable`
/// at the resolver boundary unless caught and retried first.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("search exceeded MAX_EXPANSIONS without reaching the goal")]
    Exhausted,

    #[error("no feasible path exists under the current constraints")]
    NoPath,

    #[error("start or goal lies in a forbidden cell")]
    StartOrGoalForbidden,
}

/// Resolver-internal failure modes (§4.6). Mapped to `UtmError::{ResolutionFailed,Timeout}`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("all resolution strategies exhausted, {remaining} conflict(s) remain")]
    AllStrategiesExhausted { remaining: usize },

    #[error("resolver deadline of {deadline_s}s exceeded")]
    DeadlineExceeded { deadline_s: f64 },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl From<ResolveError> for UtmError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::AllStrategiesExhausted { .. } => UtmError::ResolutionFailed,
            ResolveError::DeadlineExceeded { deadline_s } => UtmError::Timeout { deadline_s },
            ResolveError::Plan(_) => UtmError::Unroutable,
        }
    }
}
