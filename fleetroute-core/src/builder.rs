//! Validation and assembly of raw dispatcher input.

use std::time::Duration;

use log::debug;

use crate::error::ConfigurationError;
use crate::model::{
    Location, LocationKind, MatrixKind, ProblemInstance, SECONDS_PER_DAY, SquareMatrix,
    StopRecord, TimeWindow, Vehicle, WallClockWindow,
};

/// Default service time spent at each stop.
pub const DEFAULT_SERVICE_TIME: Duration = Duration::from_secs(20 * 60);

/// Collects raw inputs and validates them into a [`ProblemInstance`].
///
/// The depot row of the stop list is overridden: its demand becomes 0 and its
/// window becomes the fleet operating hours.
///
/// # Examples
///
/// ```
/// use fleetroute_core::{LocationKind, ProblemModelBuilder, StopRecord, Vehicle, WallClockWindow};
/// use geo::Coord;
///
/// # fn main() -> Result<(), fleetroute_core::ConfigurationError> {
/// let stop = |name: &str, kind, demand| StopRecord {
///     name: name.to_owned(),
///     address: String::new(),
///     coord: Coord { x: 0.0, y: 0.0 },
///     kind,
///     demand,
///     window: WallClockWindow::default(),
/// };
/// let instance = ProblemModelBuilder::new(WallClockWindow::default())
///     .stops(vec![stop("Depot", LocationKind::Depot, 0), stop("Shop", LocationKind::Delivery, 5)])
///     .vehicles(vec![Vehicle::new("Van", 10, 9.5)])
///     .distance_matrix(vec![vec![0, 100], vec![100, 0]])
///     .duration_matrix(vec![vec![0, 60], vec![60, 0]])
///     .build()?;
/// assert_eq!(instance.node_count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProblemModelBuilder {
    depot_hours: WallClockWindow,
    stops: Vec<StopRecord>,
    vehicles: Vec<Vehicle>,
    distances: Vec<Vec<i64>>,
    durations: Vec<Vec<i64>>,
    service_time: Duration,
}

impl ProblemModelBuilder {
    /// Start a builder for a fleet operating within `depot_hours`.
    #[must_use]
    pub const fn new(depot_hours: WallClockWindow) -> Self {
        Self {
            depot_hours,
            stops: Vec::new(),
            vehicles: Vec::new(),
            distances: Vec::new(),
            durations: Vec::new(),
            service_time: DEFAULT_SERVICE_TIME,
        }
    }

    /// Stops to plan, depot first.
    #[must_use]
    pub fn stops(mut self, stops: Vec<StopRecord>) -> Self {
        self.stops = stops;
        self
    }

    /// Vehicles available for the run.
    #[must_use]
    pub fn vehicles(mut self, vehicles: Vec<Vehicle>) -> Self {
        self.vehicles = vehicles;
        self
    }

    /// Road distances in metres, one row per stop.
    #[must_use]
    pub fn distance_matrix(mut self, rows: Vec<Vec<i64>>) -> Self {
        self.distances = rows;
        self
    }

    /// Travel durations in seconds, one row per stop.
    #[must_use]
    pub fn duration_matrix(mut self, rows: Vec<Vec<i64>>) -> Self {
        self.durations = rows;
        self
    }

    /// Time spent servicing each stop.
    #[must_use]
    pub const fn service_time(mut self, service_time: Duration) -> Self {
        self.service_time = service_time;
        self
    }

    /// Validate the collected inputs.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] naming the first field that cannot
    /// form a well-posed instance.
    pub fn build(self) -> Result<ProblemInstance, ConfigurationError> {
        let node_count = self.stops.len();
        validate_stop_kinds(&self.stops)?;
        let depot_window = self.depot_hours.to_seconds();
        if depot_window.is_inverted() {
            return Err(ConfigurationError::InvertedDepotHours {
                start: depot_window.start,
                end: depot_window.end,
            });
        }
        let distances = square_matrix(MatrixKind::Distance, &self.distances, node_count)?;
        let durations = square_matrix(MatrixKind::Duration, &self.durations, node_count)?;
        validate_fleet(&self.vehicles)?;
        let service_time = service_seconds(self.service_time)?;
        let locations = self
            .stops
            .into_iter()
            .enumerate()
            .map(|(index, record)| into_location(index, record, depot_window))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "built routing instance with {} stops and {} vehicles",
            node_count,
            self.vehicles.len()
        );
        Ok(ProblemInstance::new(
            locations,
            distances,
            durations,
            self.vehicles,
            service_time,
            depot_window,
        ))
    }
}

fn validate_stop_kinds(stops: &[StopRecord]) -> Result<(), ConfigurationError> {
    let Some(first) = stops.first() else {
        return Err(ConfigurationError::EmptyLocations);
    };
    if first.kind != LocationKind::Depot {
        return Err(ConfigurationError::DepotNotFirst { found: first.kind });
    }
    if let Some(index) = stops
        .iter()
        .skip(1)
        .position(|stop| stop.kind == LocationKind::Depot)
    {
        return Err(ConfigurationError::DepotNotUnique { index: index + 1 });
    }
    Ok(())
}

fn square_matrix(
    matrix: MatrixKind,
    rows: &[Vec<i64>],
    expected: usize,
) -> Result<SquareMatrix, ConfigurationError> {
    if rows.len() != expected {
        return Err(ConfigurationError::MatrixRowCount {
            matrix,
            expected,
            found: rows.len(),
        });
    }
    let mut values = Vec::with_capacity(expected * expected);
    for (row, entries) in rows.iter().enumerate() {
        if entries.len() != expected {
            return Err(ConfigurationError::MatrixRowLength {
                matrix,
                row,
                expected,
                found: entries.len(),
            });
        }
        for (column, &value) in entries.iter().enumerate() {
            if row == column && value != 0 {
                return Err(ConfigurationError::NonZeroDiagonal {
                    matrix,
                    index: row,
                    value,
                });
            }
            if value < 0 {
                return Err(ConfigurationError::NegativeMatrixEntry {
                    matrix,
                    row,
                    column,
                    value,
                });
            }
            if value > matrix.max_entry() {
                return Err(ConfigurationError::MatrixEntryOutOfRange {
                    matrix,
                    row,
                    column,
                    value,
                    limit: matrix.max_entry(),
                });
            }
            values.push(value);
        }
    }
    Ok(SquareMatrix::from_parts(expected, values))
}

fn validate_fleet(vehicles: &[Vehicle]) -> Result<(), ConfigurationError> {
    if vehicles.is_empty() {
        return Err(ConfigurationError::EmptyFleet);
    }
    for (index, vehicle) in vehicles.iter().enumerate() {
        if vehicle.capacity <= 0 {
            return Err(ConfigurationError::NonPositiveCapacity {
                index,
                name: vehicle.name.clone(),
                capacity: vehicle.capacity,
            });
        }
        if !vehicle.fuel_rate.is_finite() || vehicle.fuel_rate < 0.0 {
            return Err(ConfigurationError::InvalidFuelRate {
                index,
                name: vehicle.name.clone(),
                rate: vehicle.fuel_rate,
            });
        }
    }
    Ok(())
}

fn service_seconds(service_time: Duration) -> Result<i64, ConfigurationError> {
    let seconds = service_time.as_secs();
    i64::try_from(seconds)
        .ok()
        .filter(|value| *value <= SECONDS_PER_DAY)
        .ok_or(ConfigurationError::ServiceTimeOutOfRange { seconds })
}

fn into_location(
    index: usize,
    record: StopRecord,
    depot_window: TimeWindow,
) -> Result<Location, ConfigurationError> {
    let is_depot = index == 0;
    let time_window = if is_depot {
        depot_window
    } else {
        record.window.to_seconds()
    };
    if time_window.is_inverted() {
        return Err(ConfigurationError::InvertedTimeWindow {
            index,
            start: time_window.start,
            end: time_window.end,
        });
    }
    Ok(Location {
        id: index,
        name: record.name,
        address: record.address,
        coord: record.coord,
        demand: if is_depot { 0 } else { record.demand },
        kind: record.kind,
        time_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_DISTANCE_METRES;
    use crate::test_support::{stop, window};
    use rstest::{fixture, rstest};

    #[fixture]
    fn builder() -> ProblemModelBuilder {
        ProblemModelBuilder::new(window("08:00", "18:00"))
            .stops(vec![
                stop("Depot", LocationKind::Depot, 7, window("00:00", "23:00")),
                stop("A", LocationKind::Delivery, 5, window("09:00", "12:00")),
                stop("B", LocationKind::Pickup, -3, window("10:00", "16:00")),
            ])
            .vehicles(vec![Vehicle::new("Van", 10, 8.0)])
            .distance_matrix(vec![vec![0, 10, 20], vec![10, 0, 15], vec![20, 15, 0]])
            .duration_matrix(vec![vec![0, 60, 120], vec![60, 0, 90], vec![120, 90, 0]])
    }

    #[rstest]
    fn depot_row_is_overridden(builder: ProblemModelBuilder) {
        let instance = builder.build().expect("valid instance");
        assert_eq!(instance.demand(0), Some(0));
        assert_eq!(instance.time_window(0), Some(TimeWindow::new(28_800, 64_800)));
        assert_eq!(instance.depot_window(), TimeWindow::new(28_800, 64_800));
        assert_eq!(instance.demands(), vec![0, 5, -3]);
        assert_eq!(instance.service_time(), 1200);
    }

    #[rstest]
    fn empty_stop_list_is_rejected() {
        let err = ProblemModelBuilder::new(WallClockWindow::default())
            .build()
            .expect_err("no stops");
        assert_eq!(err, ConfigurationError::EmptyLocations);
    }

    #[rstest]
    fn first_stop_must_be_depot(builder: ProblemModelBuilder) {
        let stops = vec![
            stop("A", LocationKind::Delivery, 5, window("09:00", "12:00")),
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("B", LocationKind::Pickup, -3, window("10:00", "16:00")),
        ];
        let err = builder.stops(stops).build().expect_err("depot misplaced");
        assert_eq!(
            err,
            ConfigurationError::DepotNotFirst {
                found: LocationKind::Delivery
            }
        );
    }

    #[rstest]
    fn second_depot_is_rejected(builder: ProblemModelBuilder) {
        let stops = vec![
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("A", LocationKind::Delivery, 5, window("09:00", "12:00")),
            stop("Depot 2", LocationKind::Depot, 0, window("08:00", "18:00")),
        ];
        let err = builder.stops(stops).build().expect_err("two depots");
        assert_eq!(err, ConfigurationError::DepotNotUnique { index: 2 });
    }

    #[rstest]
    fn matrix_row_count_must_match(builder: ProblemModelBuilder) {
        let err = builder
            .distance_matrix(vec![vec![0, 10, 20], vec![10, 0, 15]])
            .build()
            .expect_err("short matrix");
        assert_eq!(
            err,
            ConfigurationError::MatrixRowCount {
                matrix: MatrixKind::Distance,
                expected: 3,
                found: 2
            }
        );
    }

    #[rstest]
    fn matrix_row_length_must_match(builder: ProblemModelBuilder) {
        let err = builder
            .duration_matrix(vec![vec![0, 60, 120], vec![60, 0], vec![120, 90, 0]])
            .build()
            .expect_err("ragged matrix");
        assert_eq!(
            err,
            ConfigurationError::MatrixRowLength {
                matrix: MatrixKind::Duration,
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[rstest]
    fn diagonal_must_be_zero(builder: ProblemModelBuilder) {
        let err = builder
            .distance_matrix(vec![vec![0, 10, 20], vec![10, 4, 15], vec![20, 15, 0]])
            .build()
            .expect_err("non-zero diagonal");
        assert!(matches!(
            err,
            ConfigurationError::NonZeroDiagonal { index: 1, value: 4, .. }
        ));
    }

    #[rstest]
    fn negative_entries_are_rejected(builder: ProblemModelBuilder) {
        let err = builder
            .duration_matrix(vec![vec![0, 60, -1], vec![60, 0, 90], vec![120, 90, 0]])
            .build()
            .expect_err("negative duration");
        assert!(matches!(
            err,
            ConfigurationError::NegativeMatrixEntry {
                matrix: MatrixKind::Duration,
                row: 0,
                column: 2,
                value: -1
            }
        ));
    }

    #[rstest]
    #[case(MatrixKind::Duration, SECONDS_PER_DAY + 1)]
    #[case(MatrixKind::Duration, i64::MAX)]
    #[case(MatrixKind::Distance, MAX_DISTANCE_METRES + 1)]
    #[case(MatrixKind::Distance, i64::MAX)]
    fn oversized_entries_are_rejected(
        builder: ProblemModelBuilder,
        #[case] matrix: MatrixKind,
        #[case] value: i64,
    ) {
        let rows = vec![vec![0, value, 20], vec![10, 0, 15], vec![20, 15, 0]];
        let candidate = match matrix {
            MatrixKind::Distance => builder.distance_matrix(rows),
            MatrixKind::Duration => builder.duration_matrix(rows),
        };
        let err = candidate.build().expect_err("entry too large");
        assert_eq!(
            err,
            ConfigurationError::MatrixEntryOutOfRange {
                matrix,
                row: 0,
                column: 1,
                value,
                limit: matrix.max_entry(),
            }
        );
    }

    #[rstest]
    fn entries_at_the_limit_are_accepted(builder: ProblemModelBuilder) {
        let instance = builder
            .distance_matrix(vec![
                vec![0, MAX_DISTANCE_METRES, 20],
                vec![10, 0, 15],
                vec![20, 15, 0],
            ])
            .duration_matrix(vec![
                vec![0, SECONDS_PER_DAY, 120],
                vec![60, 0, 90],
                vec![120, 90, 0],
            ])
            .build()
            .expect("limits are inclusive");
        assert_eq!(instance.durations().get(0, 1), Some(SECONDS_PER_DAY));
    }

    #[rstest]
    fn empty_fleet_is_rejected(builder: ProblemModelBuilder) {
        let err = builder.vehicles(Vec::new()).build().expect_err("no fleet");
        assert_eq!(err, ConfigurationError::EmptyFleet);
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn capacity_must_be_positive(builder: ProblemModelBuilder, #[case] capacity: i64) {
        let err = builder
            .vehicles(vec![Vehicle::new("Van", capacity, 8.0)])
            .build()
            .expect_err("bad capacity");
        assert!(matches!(err, ConfigurationError::NonPositiveCapacity { index: 0, .. }));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn fuel_rate_must_be_finite(builder: ProblemModelBuilder, #[case] rate: f64) {
        let err = builder
            .vehicles(vec![Vehicle::new("Van", 10, rate)])
            .build()
            .expect_err("bad fuel rate");
        assert!(matches!(err, ConfigurationError::InvalidFuelRate { index: 0, .. }));
    }

    #[rstest]
    fn inverted_stop_window_names_location(builder: ProblemModelBuilder) {
        let stops = vec![
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("A", LocationKind::Delivery, 5, window("09:00", "12:00")),
            stop("B", LocationKind::Pickup, -3, window("16:00", "10:00")),
        ];
        let err = builder.stops(stops).build().expect_err("inverted window");
        assert_eq!(
            err,
            ConfigurationError::InvertedTimeWindow {
                index: 2,
                start: 57_600,
                end: 36_000
            }
        );
    }

    #[rstest]
    fn inverted_depot_window_is_ignored_in_favour_of_hours(builder: ProblemModelBuilder) {
        let stops = vec![
            stop("Depot", LocationKind::Depot, 0, window("18:00", "08:00")),
            stop("A", LocationKind::Delivery, 5, window("09:00", "12:00")),
            stop("B", LocationKind::Pickup, -3, window("10:00", "16:00")),
        ];
        assert!(builder.stops(stops).build().is_ok());
    }

    #[rstest]
    fn inverted_depot_hours_are_rejected(builder: ProblemModelBuilder) {
        let mut inverted = builder;
        inverted.depot_hours = window("18:00", "08:00");
        let err = inverted.build().expect_err("inverted hours");
        assert!(matches!(err, ConfigurationError::InvertedDepotHours { .. }));
    }

    #[rstest]
    fn service_time_beyond_a_day_is_rejected(builder: ProblemModelBuilder) {
        let err = builder
            .service_time(Duration::from_secs(90_000))
            .build()
            .expect_err("service time too long");
        assert_eq!(
            err,
            ConfigurationError::ServiceTimeOutOfRange { seconds: 90_000 }
        );
    }
}
