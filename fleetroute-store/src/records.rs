//! Typed rows exchanged with the run store.

use std::fmt;
use std::str::FromStr;

use fleetroute_core::{ExportRow, LocationKind, StopRecord, WallClockWindow};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Identifier of a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(i64);

impl RunId {
    /// Wrap a raw row identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw row identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Routes are planned but vehicles have not left.
    Planned,
    /// Vehicles are on the road.
    InProgress,
    /// Every vehicle has returned; fuel counts towards reports.
    Completed,
}

impl RunStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Whether a run may move from `self` to `next`.
    ///
    /// ```
    /// use fleetroute_store::RunStatus;
    ///
    /// assert!(RunStatus::Planned.can_advance_to(RunStatus::InProgress));
    /// assert!(!RunStatus::Completed.can_advance_to(RunStatus::Planned));
    /// ```
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planned, Self::InProgress) | (Self::InProgress, Self::Completed)
        )
    }

    /// Whether vehicles on a run in this state are unavailable to others.
    #[must_use]
    pub const fn holds_vehicles(self) -> bool {
        matches!(self, Self::Planned | Self::InProgress)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(other.to_owned()),
        }
    }
}

/// A run as listed in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier.
    pub id: RunId,
    /// Dispatch date.
    pub date: Date,
    /// Lifecycle state.
    pub status: RunStatus,
    /// Total planned distance, once routes are saved.
    pub total_distance_km: Option<f64>,
    /// Total estimated fuel, once routes are saved.
    pub total_fuel_litres: Option<f64>,
}

/// A customer request recorded against a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Stop name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Signed weight.
    pub weight: i64,
    /// Opening hours.
    pub window: WallClockWindow,
    /// Delivery or pickup.
    pub kind: LocationKind,
}

impl From<&StopRecord> for RunRequest {
    fn from(record: &StopRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            weight: record.demand,
            window: record.window,
            kind: record.kind,
        }
    }
}

/// Everything stored about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    /// Header row.
    pub summary: RunSummary,
    /// Customer requests in insertion order.
    pub requests: Vec<RunRequest>,
    /// Planned routes in insertion order.
    pub routes: Vec<ExportRow>,
}

/// Fuel and distance of one vehicle over a reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelReportRow {
    /// Vehicle name as recorded on the routes.
    pub vehicle_name: String,
    /// Litres consumed across completed runs.
    pub total_fuel_litres: f64,
    /// Kilometres driven across completed runs.
    pub total_distance_km: f64,
}

/// An address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLocation {
    /// Display name.
    pub name: String,
    /// Unique street address.
    pub address: String,
}
