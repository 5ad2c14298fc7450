//! Tests for the `VrpSolver`.

use std::time::Duration;

use super::*;
use fleetroute_core::test_support::{scenario_a, scenario_b, scenario_c, scenario_d};
use fleetroute_core::{CostParameters, Dimension, ProblemInstance, decode_routes};
use rstest::rstest;

use crate::test_support::quick_budget;

fn solve(instance: &ProblemInstance) -> SolveOutcome {
    let model = CostModel::new(instance, CostParameters::default()).expect("valid model");
    VrpSolver::new()
        .solve(&model, &quick_budget())
        .expect("search runs")
}

#[rstest]
#[case(SearchStrategy::CheapestArc, 1)]
#[case(SearchStrategy::GuidedLocalSearch { max_generations: 75 }, 75)]
#[case(SearchStrategy::GuidedLocalSearch { max_generations: 0 }, 1)]
fn strategy_selects_generation_limit(#[case] strategy: SearchStrategy, #[case] expected: usize) {
    let budget = SearchBudget {
        time_limit: Duration::from_millis(1500),
        strategy,
    };
    let limits = VrpSolver::new().limits(&budget).expect("positive budget");
    assert_eq!(limits.max_generations, expected);
    assert_eq!(limits.max_time_secs, 1);
}

#[rstest]
fn sub_second_budget_rounds_up() {
    let limits = VrpSolver::new()
        .limits(&SearchBudget::with_time_limit(Duration::from_millis(200)))
        .expect("positive budget");
    assert_eq!(limits.max_time_secs, 1);
}

#[rstest]
fn zero_budget_is_rejected() {
    let instance = scenario_a();
    let model = CostModel::new(&instance, CostParameters::default()).expect("valid model");
    let err = VrpSolver::new()
        .solve(&model, &SearchBudget::with_time_limit(Duration::ZERO))
        .expect_err("zero budget");
    assert_eq!(err, SolveError::ZeroBudget);
}

#[rstest]
fn single_vehicle_visits_both_customers() {
    let instance = scenario_a();
    let SolveOutcome::Solved(solution) = solve(&instance) else {
        panic!("scenario A is feasible");
    };
    let routes = decode_routes(&instance, solution.as_ref()).expect("solution decodes");
    assert_eq!(routes.len(), 1);
    let route = routes.first().expect("one route");
    assert_eq!(route.total_distance_m, 45);
    assert_eq!(route.visits().count(), 2);

    let manager = instance.index_manager();
    let start = manager.start(0).expect("vehicle 0 exists");
    let departure = solution
        .cumulative_value(Dimension::Time, start)
        .expect("start is timed");
    assert!(instance.depot_window().contains(departure));
}

#[rstest]
#[case::over_capacity(scenario_b())]
#[case::closed_window(scenario_c())]
fn unservable_instances_are_infeasible(#[case] instance: ProblemInstance) {
    assert!(solve(&instance).is_infeasible());
}

#[rstest]
fn heavy_customers_use_separate_trucks() {
    let instance = scenario_d();
    let SolveOutcome::Solved(solution) = solve(&instance) else {
        panic!("scenario D is feasible");
    };
    let routes = decode_routes(&instance, solution.as_ref()).expect("solution decodes");
    assert_eq!(routes.len(), 2);
    let total: i64 = routes.iter().map(|route| route.total_distance_m).sum();
    assert_eq!(total, 10_000);
}

#[rstest]
fn construction_only_budget_still_serves_everyone() {
    let instance = scenario_a();
    let model = CostModel::new(&instance, CostParameters::default()).expect("valid model");
    let budget = SearchBudget {
        time_limit: Duration::from_secs(5),
        strategy: SearchStrategy::CheapestArc,
    };
    let outcome = VrpSolver::with_config(VrpSolverConfig {
        construction_generations: 3,
    })
    .solve(&model, &budget)
    .expect("search runs");
    assert!(!outcome.is_infeasible());
}
