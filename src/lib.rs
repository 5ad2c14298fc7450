//! Facade crate for the fleetroute delivery planner.
//!
//! This crate re-exports the core planning types and exposes the vrp-core
//! solver and the SQLite run history behind feature flags.

#![forbid(unsafe_code)]

pub use fleetroute_core::{
    CapacityPolicy, ConfigurationError, CostParameters, DEFAULT_SERVICE_TIME, DEFAULT_TIME_LIMIT,
    ExportRow, InfeasibleGuidance, Location, LocationKind, PlanError, PlanOutcome,
    ProblemInstance, ProblemModelBuilder, Report, RouteResult, RouteStop, SearchBudget,
    SearchStrategy, SolveError, Solver, StopRecord, TimeWindow, Vehicle, WallClockWindow, plan,
};

#[cfg(feature = "store-sqlite")]
pub use fleetroute_store::{
    FuelReportRow, RunDetails, RunId, RunRequest, RunStatus, RunStore, RunSummary,
    SavedLocation, StoreError,
};

#[cfg(feature = "solver-vrp")]
pub use fleetroute_solver_vrp::VrpSolver;
