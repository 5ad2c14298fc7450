//! Validation errors raised while assembling a routing problem.
//!
//! Every variant names the offending field so a dispatcher can correct the
//! input before any optimisation time is spent.

use thiserror::Error;

use crate::model::{LocationKind, MatrixKind};

/// Errors returned when raw inputs cannot form a well-posed instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// No locations were supplied; the depot is mandatory.
    #[error("locations: at least the depot must be supplied")]
    EmptyLocations,
    /// The first location is not the depot.
    #[error("locations[0]: expected the depot, found a {found} stop")]
    DepotNotFirst {
        /// Kind found at index 0.
        found: LocationKind,
    },
    /// A second depot appears after index 0.
    #[error("locations[{index}]: only one depot is supported")]
    DepotNotUnique {
        /// Position of the extra depot.
        index: usize,
    },
    /// A matrix does not have one row per location.
    #[error("{matrix} matrix: expected {expected} rows, found {found}")]
    MatrixRowCount {
        /// Matrix being validated.
        matrix: MatrixKind,
        /// Number of locations.
        expected: usize,
        /// Rows supplied.
        found: usize,
    },
    /// A matrix row does not have one column per location.
    #[error("{matrix} matrix row {row}: expected {expected} entries, found {found}")]
    MatrixRowLength {
        /// Matrix being validated.
        matrix: MatrixKind,
        /// Offending row.
        row: usize,
        /// Number of locations.
        expected: usize,
        /// Columns supplied.
        found: usize,
    },
    /// Travelling from a location to itself must cost nothing.
    #[error("{matrix} matrix: diagonal entry {index} is {value}, expected 0")]
    NonZeroDiagonal {
        /// Matrix being validated.
        matrix: MatrixKind,
        /// Diagonal position.
        index: usize,
        /// Value found.
        value: i64,
    },
    /// Matrix entries are metres or seconds and cannot be negative.
    #[error("{matrix} matrix [{row}][{column}]: negative entry {value}")]
    NegativeMatrixEntry {
        /// Matrix being validated.
        matrix: MatrixKind,
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        column: usize,
        /// Value found.
        value: i64,
    },
    /// A matrix entry exceeds what a single day of driving can cover.
    #[error("{matrix} matrix [{row}][{column}]: entry {value} exceeds the limit of {limit}")]
    MatrixEntryOutOfRange {
        /// Matrix being validated.
        matrix: MatrixKind,
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        column: usize,
        /// Value found.
        value: i64,
        /// Largest accepted entry.
        limit: i64,
    },
    /// No vehicles were supplied.
    #[error("vehicles: the fleet is empty")]
    EmptyFleet,
    /// A vehicle cannot carry anything.
    #[error("vehicles[{index}] ({name}): capacity must be positive, found {capacity}")]
    NonPositiveCapacity {
        /// Fleet position.
        index: usize,
        /// Vehicle name.
        name: String,
        /// Capacity supplied.
        capacity: i64,
    },
    /// Fuel consumption must be a finite, non-negative rate.
    #[error("vehicles[{index}] ({name}): fuel rate must be finite and non-negative, found {rate}")]
    InvalidFuelRate {
        /// Fleet position.
        index: usize,
        /// Vehicle name.
        name: String,
        /// Rate supplied in litres per 100 km.
        rate: f64,
    },
    /// A stop window closes before it opens.
    #[error("locations[{index}] time window: start {start}s is after end {end}s")]
    InvertedTimeWindow {
        /// Location position.
        index: usize,
        /// Window start in seconds since midnight.
        start: i64,
        /// Window end in seconds since midnight.
        end: i64,
    },
    /// Fleet operating hours close before they open.
    #[error("depot hours: start {start}s is after end {end}s")]
    InvertedDepotHours {
        /// Opening time in seconds since midnight.
        start: i64,
        /// Closing time in seconds since midnight.
        end: i64,
    },
    /// Service time per stop must fit inside a single day.
    #[error("service time: {seconds}s exceeds the 24 h planning horizon")]
    ServiceTimeOutOfRange {
        /// Service time supplied.
        seconds: u64,
    },
    /// Cost weights must be finite and non-negative.
    #[error("cost parameters: {field} must be finite and non-negative, found {value}")]
    InvalidCostParameter {
        /// Parameter name.
        field: &'static str,
        /// Value supplied.
        value: f64,
    },
}
