//! Immutable records describing one planning run.
//!
//! Raw dispatcher input arrives as [`StopRecord`]s and [`Vehicle`]s. The
//! [`ProblemModelBuilder`](crate::ProblemModelBuilder) turns them into a
//! [`ProblemInstance`], which is never mutated afterwards.

use std::fmt;

use geo::Coord;
use jiff::civil::Time;
use serde::{Deserialize, Serialize};

use crate::routing_index::RoutingIndexManager;

/// Position of a location in the instance; index 0 is the depot.
pub type NodeIndex = usize;

/// Seconds in a day; cumulative time never exceeds this.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Longest single road distance accepted, in metres (one trip around the
/// equator).
pub const MAX_DISTANCE_METRES: i64 = 40_075_000;

/// Role a location plays in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// The single start and end point of every vehicle.
    Depot,
    /// Goods are dropped off.
    Delivery,
    /// Goods are collected.
    Pickup,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Depot => "depot",
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        };
        f.write_str(label)
    }
}

/// Which square matrix a value or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    /// Road distance in metres.
    Distance,
    /// Travel duration in seconds.
    Duration,
}

impl MatrixKind {
    /// Largest entry the matrix may hold.
    #[must_use]
    pub const fn max_entry(self) -> i64 {
        match self {
            Self::Distance => MAX_DISTANCE_METRES,
            Self::Duration => SECONDS_PER_DAY,
        }
    }
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => f.write_str("distance"),
            Self::Duration => f.write_str("duration"),
        }
    }
}

/// Inclusive window in seconds since midnight.
///
/// # Examples
///
/// ```
/// use fleetroute_core::TimeWindow;
///
/// let window = TimeWindow::new(8 * 3600, 18 * 3600);
/// assert!(window.contains(12 * 3600));
/// assert!(!window.is_inverted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest permitted cumulative time.
    pub start: i64,
    /// Latest permitted cumulative time.
    pub end: i64,
}

impl TimeWindow {
    /// Create a window; callers validate ordering through [`Self::is_inverted`].
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// The whole planning day.
    #[must_use]
    pub const fn full_day() -> Self {
        Self::new(0, SECONDS_PER_DAY)
    }

    /// Whether `seconds` falls inside the window.
    #[must_use]
    pub const fn contains(&self, seconds: i64) -> bool {
        self.start <= seconds && seconds <= self.end
    }

    /// True when the window closes before it opens.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Wall-clock opening hours as entered by a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClockWindow {
    /// Opening time.
    pub start: Time,
    /// Closing time.
    pub end: Time,
}

impl WallClockWindow {
    /// Create a wall-clock window.
    #[must_use]
    pub const fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    /// Convert to seconds since midnight.
    #[must_use]
    pub fn to_seconds(&self) -> TimeWindow {
        TimeWindow::new(seconds_of_day(self.start), seconds_of_day(self.end))
    }
}

impl Default for WallClockWindow {
    /// Standard fleet hours, 08:00 to 18:00.
    fn default() -> Self {
        Self::new(Time::constant(8, 0, 0, 0), Time::constant(18, 0, 0, 0))
    }
}

fn seconds_of_day(time: Time) -> i64 {
    i64::from(time.hour()) * 3600 + i64::from(time.minute()) * 60 + i64::from(time.second())
}

/// A stop as supplied by the dispatcher, before validation.
///
/// The first record of a request is the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    /// Human-readable stop name.
    pub name: String,
    /// Street address, forwarded to mapping collaborators.
    #[serde(default)]
    pub address: String,
    /// Geocoded position (`x` = longitude, `y` = latitude).
    pub coord: Coord<f64>,
    /// Role of the stop.
    pub kind: LocationKind,
    /// Signed weight handled at the stop.
    #[serde(default)]
    pub demand: i64,
    /// Opening hours at the stop.
    #[serde(default)]
    pub window: WallClockWindow,
}

/// A validated location inside a [`ProblemInstance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Node index of the location.
    pub id: NodeIndex,
    /// Human-readable name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Geocoded position.
    pub coord: Coord<f64>,
    /// Signed weight; always 0 for the depot.
    pub demand: i64,
    /// Role of the location.
    pub kind: LocationKind,
    /// Window the arrival time must honour.
    pub time_window: TimeWindow,
}

/// A vehicle available for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Registry identifier, 0 when the vehicle is ad hoc.
    #[serde(default)]
    pub id: u64,
    /// Display name, unique within a fleet.
    pub name: String,
    /// Maximum load in weight units.
    pub capacity: i64,
    /// Consumption in litres per 100 km.
    pub fuel_rate: f64,
}

impl Vehicle {
    /// Create an ad hoc vehicle without a registry identifier.
    pub fn new(name: impl Into<String>, capacity: i64, fuel_rate: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            capacity,
            fuel_rate,
        }
    }
}

/// Dense `N × N` matrix of non-negative integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquareMatrix {
    size: usize,
    values: Vec<i64>,
}

impl SquareMatrix {
    pub(crate) const fn from_parts(size: usize, values: Vec<i64>) -> Self {
        Self { size, values }
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Value for the arc `from → to`, or `None` outside the matrix.
    #[must_use]
    pub fn get(&self, from: NodeIndex, to: NodeIndex) -> Option<i64> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.values.get(from * self.size + to).copied()
    }
}

/// A validated, immutable routing problem for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemInstance {
    locations: Vec<Location>,
    distances: SquareMatrix,
    durations: SquareMatrix,
    vehicles: Vec<Vehicle>,
    service_time: i64,
    depot_window: TimeWindow,
}

impl ProblemInstance {
    pub(crate) const fn new(
        locations: Vec<Location>,
        distances: SquareMatrix,
        durations: SquareMatrix,
        vehicles: Vec<Vehicle>,
        service_time: i64,
        depot_window: TimeWindow,
    ) -> Self {
        Self {
            locations,
            distances,
            durations,
            vehicles,
            service_time,
            depot_window,
        }
    }

    /// All locations; index 0 is the depot.
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Location at `node`.
    #[must_use]
    pub fn location(&self, node: NodeIndex) -> Option<&Location> {
        self.locations.get(node)
    }

    /// Number of locations, depot included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.locations.len()
    }

    /// Road distances in metres.
    #[must_use]
    pub const fn distances(&self) -> &SquareMatrix {
        &self.distances
    }

    /// Travel durations in seconds.
    #[must_use]
    pub const fn durations(&self) -> &SquareMatrix {
        &self.durations
    }

    /// The fleet in input order.
    #[must_use]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Vehicle at fleet position `index`.
    #[must_use]
    pub fn vehicle(&self, index: usize) -> Option<&Vehicle> {
        self.vehicles.get(index)
    }

    /// Number of vehicles.
    #[must_use]
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Demand at `node`.
    #[must_use]
    pub fn demand(&self, node: NodeIndex) -> Option<i64> {
        self.location(node).map(|location| location.demand)
    }

    /// Demands indexed by node.
    #[must_use]
    pub fn demands(&self) -> Vec<i64> {
        self.locations.iter().map(|location| location.demand).collect()
    }

    /// Time window at `node`; the depot reports the fleet operating hours.
    #[must_use]
    pub fn time_window(&self, node: NodeIndex) -> Option<TimeWindow> {
        self.location(node).map(|location| location.time_window)
    }

    /// Service time spent at every stop, in seconds.
    #[must_use]
    pub const fn service_time(&self) -> i64 {
        self.service_time
    }

    /// Fleet operating hours, which bound every vehicle start.
    #[must_use]
    pub const fn depot_window(&self) -> TimeWindow {
        self.depot_window
    }

    /// Routing index space for this instance.
    #[must_use]
    pub fn index_manager(&self) -> RoutingIndexManager {
        RoutingIndexManager::new(self.node_count(), self.vehicle_count())
    }
}
