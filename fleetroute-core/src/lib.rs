//! Core routing model for fleetroute.
//!
//! The crate turns raw stop and fleet data into a validated
//! [`ProblemInstance`], exposes the cost and constraint callbacks an
//! optimisation engine consumes through [`CostModel`], and decodes the
//! engine's [`Solution`] into auditable [`RouteResult`]s and a run
//! [`Report`]. The engine itself sits behind the [`Solver`] trait.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod assignment;
mod builder;
mod cost;
mod decoder;
mod error;
mod model;
mod planner;
mod report;
mod routing_index;
mod solver;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use assignment::{Assignment, AssignmentError};
pub use builder::{DEFAULT_SERVICE_TIME, ProblemModelBuilder};
pub use cost::{
    CapacityPolicy, CostModel, CostParameters, DimensionSpec, TIME_HORIZON_SECONDS,
    TIME_SLACK_SECONDS,
};
pub use decoder::{
    DecoderContractViolation, RouteResult, RouteStop, StopRole, decode_route, decode_routes,
    format_clock, fuel_litres,
};
pub use error::ConfigurationError;
pub use model::{
    Location, LocationKind, MAX_DISTANCE_METRES, MatrixKind, NodeIndex, ProblemInstance,
    SECONDS_PER_DAY,
    SquareMatrix, StopRecord, TimeWindow, Vehicle, WallClockWindow,
};
pub use planner::{InfeasibleGuidance, PlanError, PlanOutcome, plan};
pub use report::{ExportRow, Report};
pub use routing_index::{RoutingIndex, RoutingIndexManager};
pub use solver::{
    DEFAULT_TIME_LIMIT, Dimension, SearchBudget, SearchStrategy, Solution, SolveError,
    SolveOutcome, Solver,
};
