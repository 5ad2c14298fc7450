//! Test helpers for composing plan requests and solver stubs.

use camino::{Utf8Path, Utf8PathBuf};
use fleetroute_core::test_support::{ExhaustiveSolver, stop, window};
use fleetroute_core::{LocationKind, Solver, Vehicle};
use tempfile::TempDir;

use crate::CliError;
use crate::request::PlanRequest;
use crate::solve::{SolveArgs, SolveConfig, SolverBuilder};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

pub(super) fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace")
}

/// Two customers of 8 that need a truck each.
pub(super) fn two_truck_request() -> PlanRequest {
    PlanRequest {
        stops: vec![
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("Customer 1", LocationKind::Delivery, 8, window("08:00", "18:00")),
            stop("Customer 2", LocationKind::Delivery, 8, window("08:00", "18:00")),
        ],
        vehicles: vec![
            Vehicle::new("Truck 1", 10, 10.0),
            Vehicle::new("Truck 2", 10, 12.0),
        ],
        distances: vec![vec![0, 2000, 3000], vec![2000, 0, 2500], vec![3000, 2500, 0]],
        durations: vec![vec![0, 300, 420], vec![300, 0, 360], vec![420, 360, 0]],
    }
}

/// The two-customer request with a single van too small for either stop.
pub(super) fn undersized_request() -> PlanRequest {
    PlanRequest {
        vehicles: vec![Vehicle::new("Van", 6, 8.0)],
        ..two_truck_request()
    }
}

pub(super) fn write_request(path: &Utf8Path, request: &PlanRequest) {
    let payload = serde_json::to_string_pretty(request).expect("serialise request");
    write_utf8(path, payload.as_bytes());
}

/// Arguments that plan `request_path` with a short budget.
pub(super) fn solve_args(request_path: Utf8PathBuf) -> SolveArgs {
    SolveArgs {
        request_path: Some(request_path),
        time_limit_secs: Some(5),
        ..SolveArgs::default()
    }
}

/// Plans with the deterministic exhaustive solver.
#[derive(Debug, Default)]
pub(super) struct ExhaustiveSolverBuilder;

impl SolverBuilder for ExhaustiveSolverBuilder {
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Ok(Box::new(ExhaustiveSolver))
    }
}
