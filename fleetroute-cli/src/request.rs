//! JSON plan requests read by `fleetroute solve`.

use std::io::BufReader;

use camino::Utf8Path;
use fleetroute_core::{StopRecord, Vehicle};
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::fs::open_request;

/// Everything needed to plan one run, apart from the tuning options.
///
/// The first stop is the depot. Matrices are indexed by stop position.
/// When `vehicles` is empty and a run store is configured, the vehicles
/// still free on the run date are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PlanRequest {
    /// Depot followed by customer stops.
    pub(crate) stops: Vec<StopRecord>,
    /// Fleet for the run.
    #[serde(default)]
    pub(crate) vehicles: Vec<Vehicle>,
    /// Road distances in metres.
    pub(crate) distances: Vec<Vec<i64>>,
    /// Travel durations in seconds.
    pub(crate) durations: Vec<Vec<i64>>,
}

/// Loads a JSON-encoded [`PlanRequest`] from disk.
pub(crate) fn load_plan_request(path: &Utf8Path) -> Result<PlanRequest, CliError> {
    let file = open_request(path).map_err(|source| CliError::OpenPlanRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParsePlanRequest {
        path: path.to_path_buf(),
        source,
    })
}
