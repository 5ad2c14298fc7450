//! Behavioural tests for `ProblemModelBuilder` using rstest-bdd.

use std::cell::RefCell;

use fleetroute_core::test_support::{stop, window};
use fleetroute_core::{
    ConfigurationError, LocationKind, MatrixKind, ProblemInstance, ProblemModelBuilder,
    StopRecord, Vehicle,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Default)]
struct BuilderWorld {
    stops: RefCell<Vec<StopRecord>>,
    vehicles: RefCell<Vec<Vehicle>>,
    matrix_size: RefCell<usize>,
    result: RefCell<Option<Result<ProblemInstance, ConfigurationError>>>,
}

impl BuilderWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn result(&self) -> Result<ProblemInstance, ConfigurationError> {
        self.result
            .borrow()
            .clone()
            .expect("instance should be built before assertions")
    }
}

fn square(size: usize, value: i64) -> Vec<Vec<i64>> {
    (0..size)
        .map(|row| {
            (0..size)
                .map(|column| if row == column { 0 } else { value })
                .collect()
        })
        .collect()
}

#[fixture]
fn world() -> BuilderWorld {
    BuilderWorld::default()
}

#[given("a depot and {count} customers")]
fn given_stops(world: &BuilderWorld, count: usize) {
    let mut stops = vec![stop("Depot", LocationKind::Depot, 40, window("06:00", "22:00"))];
    stops.extend((1..=count).map(|index| {
        stop(
            &format!("Shop {index}"),
            LocationKind::Delivery,
            10,
            window("09:00", "17:00"),
        )
    }));
    world.stops.replace(stops);
}

#[given("a fleet of {count} vehicles")]
fn given_fleet(world: &BuilderWorld, count: usize) {
    let vehicles = (1..=count)
        .map(|index| Vehicle::new(format!("Van {index}"), 500, 9.5))
        .collect();
    world.vehicles.replace(vehicles);
}

#[given("matrices sized for {size} locations")]
fn given_matrices(world: &BuilderWorld, size: usize) {
    world.matrix_size.replace(size);
}

#[when("the instance is built")]
fn when_built(world: &BuilderWorld) {
    let size = *world.matrix_size.borrow();
    let result = ProblemModelBuilder::new(window("08:00", "18:00"))
        .stops(world.stops.borrow().clone())
        .vehicles(world.vehicles.borrow().clone())
        .distance_matrix(square(size, 1500))
        .duration_matrix(square(size, 240))
        .build();
    world.result.replace(Some(result));
}

#[then("the instance has {count} locations")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_location_count(world: &BuilderWorld, count: usize) {
    let instance = world.result().expect("instance should build");
    assert_eq!(instance.node_count(), count);
}

#[then("the depot demand is 0")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_depot_demand(world: &BuilderWorld) {
    let instance = world.result().expect("instance should build");
    assert_eq!(instance.demand(0), Some(0));
    assert_eq!(instance.time_window(0), Some(instance.depot_window()));
}

#[then("building fails naming the distance matrix")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_distance_error(world: &BuilderWorld) {
    let err = world.result().expect_err("short matrix should fail");
    assert!(matches!(
        err,
        ConfigurationError::MatrixRowCount {
            matrix: MatrixKind::Distance,
            ..
        }
    ));
    assert!(err.to_string().starts_with("distance matrix"));
}

#[then("building fails because the fleet is empty")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_empty_fleet(world: &BuilderWorld) {
    let err = world.result().expect_err("empty fleet should fail");
    assert_eq!(err, ConfigurationError::EmptyFleet);
}

#[scenario(path = "tests/features/model_builder.feature", index = 0)]
fn well_formed_request(world: BuilderWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/model_builder.feature", index = 1)]
fn short_matrix(world: BuilderWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/model_builder.feature", index = 2)]
fn empty_fleet(world: BuilderWorld) {
    let _ = world;
}
