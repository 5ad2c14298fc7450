//! Behavioural tests for `RunStore` using rstest-bdd.

use std::cell::RefCell;
use std::path::PathBuf;

use fleetroute_core::test_support::{ExhaustiveSolver, scenario_d};
use fleetroute_core::{CostParameters, PlanOutcome, SearchBudget, Vehicle, plan};
use fleetroute_store::{RunId, RunStatus, RunStore, StoreError};
use jiff::civil::Date;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

struct StoreWorld {
    dir: TempDir,
    store: RefCell<Option<RunStore>>,
    run: RefCell<Option<RunId>>,
    transition: RefCell<Option<Result<(), StoreError>>>,
}

impl StoreWorld {
    fn path(&self) -> PathBuf {
        self.dir.path().join("runs.db")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn with_store<T>(&self, action: impl FnOnce(&mut RunStore) -> T) -> T {
        let mut slot = self.store.borrow_mut();
        let store = slot.as_mut().expect("store should be opened first");
        action(store)
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn run(&self) -> RunId {
        self.run.borrow().expect("a run should be saved first")
    }

    fn advance(&self, status: RunStatus) {
        let run = self.run();
        let result = self.with_store(|store| store.update_status(run, status));
        self.transition.replace(Some(result));
    }
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[fixture]
fn world() -> StoreWorld {
    StoreWorld {
        dir: TempDir::new().expect("create temp dir"),
        store: RefCell::new(None),
        run: RefCell::new(None),
        transition: RefCell::new(None),
    }
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[given("a run store with Truck 1, Truck 2 and Van 3 registered")]
fn given_store(world: &StoreWorld) {
    let store = RunStore::open(world.path()).expect("open run store");
    for vehicle in [
        Vehicle::new("Truck 1", 10, 10.0),
        Vehicle::new("Truck 2", 10, 12.0),
        Vehicle::new("Van 3", 6, 8.0),
    ] {
        store.add_vehicle(&vehicle).expect("register vehicle");
    }
    world.store.replace(Some(store));
}

#[expect(
    clippy::expect_used,
    clippy::panic,
    reason = "behaviour tests use expect for readable failures"
)]
#[when("the two-truck plan is saved as a run on {date}")]
fn when_saved(world: &StoreWorld, date: Date) {
    let outcome = plan(
        &scenario_d(),
        CostParameters::default(),
        &ExhaustiveSolver,
        &SearchBudget::default(),
    )
    .expect("planning runs");
    let PlanOutcome::Planned(report) = outcome else {
        panic!("the two-truck network is feasible");
    };
    let run = world.with_store(|store| {
        let run = store.create_run(date).expect("create run");
        store.save_report(run, &report).expect("save routes");
        run
    });
    world.run.replace(Some(run));
}

#[when("the run is started")]
fn when_started(world: &StoreWorld) {
    world.advance(RunStatus::InProgress);
}

#[when("the run is completed")]
fn when_completed(world: &StoreWorld) {
    world.advance(RunStatus::Completed);
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[when("the database is reopened")]
fn when_reopened(world: &StoreWorld) {
    drop(world.store.take());
    let store = RunStore::open(world.path()).expect("reopen run store");
    world.store.replace(Some(store));
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[then("only {name} is available on {date}")]
fn then_only_available(world: &StoreWorld, name: String, date: Date) {
    let available: Vec<String> = world
        .with_store(|store| store.available_vehicles(date))
        .expect("list available vehicles")
        .into_iter()
        .map(|vehicle| vehicle.name)
        .collect();
    assert_eq!(available, vec![name]);
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[then("every vehicle is available on {date}")]
fn then_all_available(world: &StoreWorld, date: Date) {
    let available = world
        .with_store(|store| store.available_vehicles(date))
        .expect("list available vehicles");
    assert_eq!(available.len(), 3);
}

#[then("the status change is rejected")]
fn then_rejected(world: &StoreWorld) {
    let transition = world.transition.borrow();
    assert!(
        matches!(
            transition.as_ref(),
            Some(Err(StoreError::InvalidTransition {
                from: RunStatus::Planned,
                to: RunStatus::Completed,
                ..
            }))
        ),
        "{transition:?}"
    );
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[then("the fuel report for May 2024 lists {count} vehicles")]
fn then_fuel_report(world: &StoreWorld, count: usize) {
    let from = Date::new(2024, 5, 1).expect("valid date");
    let to = Date::new(2024, 5, 31).expect("valid date");
    let rows = world
        .with_store(|store| store.fuel_report(from, to))
        .expect("build fuel report");
    assert_eq!(rows.len(), count);
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
#[then("the run history lists {count} run with {distance} km planned")]
fn then_history(world: &StoreWorld, count: usize, distance: f64) {
    let runs = world
        .with_store(|store| store.list_runs())
        .expect("list runs");
    assert_eq!(runs.len(), count);
    let planned = runs
        .first()
        .and_then(|run| run.total_distance_km)
        .expect("distance recorded");
    assert!((planned - distance).abs() < 1e-9);
    assert_eq!(runs.first().map(|run| run.id), Some(world.run()));
}

#[scenario(path = "tests/features/run_store.feature", index = 0)]
fn planned_run_holds_vehicles(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/run_store.feature", index = 1)]
fn completed_run_reports_fuel(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/run_store.feature", index = 2)]
fn runs_cannot_skip_the_road(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/run_store.feature", index = 3)]
fn history_survives_reopening(world: StoreWorld) {
    let _ = world;
}
