//! Test-only fixtures and solvers used by unit and behaviour tests.
//!
//! The exhaustive solver enumerates every assignment and is only suitable for
//! a handful of stops.

use std::collections::HashMap;
use std::time::Instant;

use geo::Coord;
use jiff::civil::Time;

use crate::assignment::Assignment;
use crate::builder::ProblemModelBuilder;
use crate::cost::CostModel;
use crate::model::{
    LocationKind, NodeIndex, ProblemInstance, StopRecord, Vehicle, WallClockWindow,
};
use crate::routing_index::{RoutingIndex, RoutingIndexManager};
use crate::solver::{Dimension, SearchBudget, Solution, SolveError, SolveOutcome, Solver};

/// Parse a wall-clock window such as `("08:00", "18:00")`.
///
/// # Panics
///
/// Panics when either bound is not a valid civil time.
#[must_use]
#[expect(
    clippy::expect_used,
    reason = "fixtures use literal times and fail loudly when mistyped"
)]
pub fn window(start: &str, end: &str) -> WallClockWindow {
    let parse = |value: &str| value.parse::<Time>().expect("fixture time should parse");
    WallClockWindow::new(parse(start), parse(end))
}

/// A stop at the origin whose address is derived from its name.
#[must_use]
pub fn stop(name: &str, kind: LocationKind, demand: i64, window: WallClockWindow) -> StopRecord {
    StopRecord {
        name: name.to_owned(),
        address: format!("{name} address"),
        coord: Coord { x: 0.0, y: 0.0 },
        kind,
        demand,
        window,
    }
}

/// Assemble an instance with a 20 minute service time and 08:00–18:00 hours.
///
/// # Panics
///
/// Panics when the fixture data is inconsistent.
#[must_use]
#[expect(
    clippy::expect_used,
    reason = "fixtures are hand-written and must be valid"
)]
pub fn instance(
    stops: Vec<StopRecord>,
    vehicles: Vec<Vehicle>,
    distances: Vec<Vec<i64>>,
    durations: Vec<Vec<i64>>,
) -> ProblemInstance {
    ProblemModelBuilder::new(window("08:00", "18:00"))
        .stops(stops)
        .vehicles(vehicles)
        .distance_matrix(distances)
        .duration_matrix(durations)
        .build()
        .expect("fixture instance should be valid")
}

fn triangle(capacity: i64, late_window: WallClockWindow) -> ProblemInstance {
    instance(
        vec![
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("A", LocationKind::Delivery, 5, window("00:00", "23:59")),
            stop("B", LocationKind::Delivery, 5, late_window),
        ],
        vec![Vehicle::new("Van", capacity, 8.0)],
        vec![vec![0, 10, 20], vec![10, 0, 15], vec![20, 15, 0]],
        vec![vec![0, 60, 120], vec![60, 0, 90], vec![120, 90, 0]],
    )
}

/// Depot and two customers served by one vehicle of capacity 100.
#[must_use]
pub fn scenario_a() -> ProblemInstance {
    triangle(100, window("00:00", "23:59"))
}

/// As [`scenario_a`], but the only vehicle carries 6 units.
#[must_use]
pub fn scenario_b() -> ProblemInstance {
    triangle(6, window("00:00", "23:59"))
}

/// As [`scenario_a`], but customer B closes before anyone can reach it.
#[must_use]
pub fn scenario_c() -> ProblemInstance {
    triangle(100, window("08:00", "08:10"))
}

/// Two trucks of capacity 10 and two customers demanding 8 each.
#[must_use]
pub fn scenario_d() -> ProblemInstance {
    instance(
        vec![
            stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00")),
            stop("Customer 1", LocationKind::Delivery, 8, window("08:00", "18:00")),
            stop("Customer 2", LocationKind::Delivery, 8, window("08:00", "18:00")),
        ],
        vec![Vehicle::new("Truck 1", 10, 10.0), Vehicle::new("Truck 2", 10, 12.0)],
        vec![vec![0, 2000, 3000], vec![2000, 0, 2500], vec![3000, 2500, 0]],
        vec![vec![0, 300, 420], vec![300, 0, 360], vec![420, 360, 0]],
    )
}

/// One vehicle of capacity 100 and a customer per `(demand, start, end)`.
///
/// All arcs are 10 m long and take 60 s.
#[must_use]
pub fn scenario_with_windows(customers: &[(i64, &str, &str)]) -> ProblemInstance {
    let mut stops = vec![stop("Depot", LocationKind::Depot, 0, window("08:00", "18:00"))];
    for (position, &(demand, start, end)) in customers.iter().enumerate() {
        let kind = if demand < 0 {
            LocationKind::Pickup
        } else {
            LocationKind::Delivery
        };
        stops.push(stop(
            &format!("Customer {}", position + 1),
            kind,
            demand,
            window(start, end),
        ));
    }
    let size = stops.len();
    let uniform = |value: i64| -> Vec<Vec<i64>> {
        (0..size)
            .map(|row| {
                (0..size)
                    .map(|column| if row == column { 0 } else { value })
                    .collect()
            })
            .collect()
    };
    instance(
        stops,
        vec![Vehicle::new("Van", 100, 8.0)],
        uniform(10),
        uniform(60),
    )
}

/// Hand-written [`Solution`] for exercising decoder contract checks.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSolution {
    next: HashMap<(usize, RoutingIndex), RoutingIndex>,
    cumulative: HashMap<(Dimension, RoutingIndex), i64>,
}

impl ScriptedSolution {
    /// Record a successor.
    #[must_use]
    pub fn with_next(mut self, vehicle: usize, from: RoutingIndex, to: RoutingIndex) -> Self {
        self.next.insert((vehicle, from), to);
        self
    }

    /// Record a cumulative value.
    #[must_use]
    pub fn with_cumulative(mut self, dimension: Dimension, index: RoutingIndex, value: i64) -> Self {
        self.cumulative.insert((dimension, index), value);
        self
    }

    /// Forget a cumulative value.
    #[must_use]
    pub fn without_cumulative(mut self, dimension: Dimension, index: RoutingIndex) -> Self {
        self.cumulative.remove(&(dimension, index));
        self
    }

    /// Record a full start-to-end chain through `nodes` with ten-minute
    /// spacing from 08:00.
    #[must_use]
    pub fn with_route(
        mut self,
        manager: &RoutingIndexManager,
        vehicle: usize,
        nodes: &[NodeIndex],
    ) -> Self {
        let mut chain: Vec<RoutingIndex> = manager.start(vehicle).into_iter().collect();
        chain.extend(nodes.iter().filter_map(|&node| manager.node_to_index(node)));
        chain.extend(manager.end(vehicle));
        let mut time = 28_800;
        let mut load = 0;
        for pair in chain.windows(2) {
            if let [from, to] = pair {
                self.next.insert((vehicle, *from), *to);
            }
        }
        for index in chain {
            self.cumulative.insert((Dimension::Time, index), time);
            self.cumulative.insert((Dimension::Capacity, index), load);
            time += 600;
            load += 1;
        }
        self
    }
}

impl Solution for ScriptedSolution {
    fn next_node(&self, vehicle: usize, index: RoutingIndex) -> Option<RoutingIndex> {
        self.next.get(&(vehicle, index)).copied()
    }

    fn cumulative_value(&self, dimension: Dimension, index: RoutingIndex) -> Option<i64> {
        self.cumulative.get(&(dimension, index)).copied()
    }
}

/// Brute-force [`Solver`] returning the cheapest feasible assignment.
///
/// Enumerates every ordered split of customers across vehicles; ties keep the
/// first assignment found, so results are deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExhaustiveSolver;

impl Solver for ExhaustiveSolver {
    fn solve(
        &self,
        model: &CostModel<'_>,
        budget: &SearchBudget,
    ) -> Result<SolveOutcome, SolveError> {
        if budget.time_limit.is_zero() {
            return Err(SolveError::ZeroBudget);
        }
        let instance = model.instance();
        let mut search = Search {
            model,
            deadline: Instant::now().checked_add(budget.time_limit),
            routes: vec![Vec::new(); instance.vehicle_count()],
            pending: (1..instance.node_count()).collect(),
            best: None,
        };
        search.explore();
        match search.best {
            Some((_, routes)) => Assignment::from_routes(model, &routes)
                .map(|assignment| SolveOutcome::Solved(Box::new(assignment)))
                .map_err(|err| SolveError::Engine {
                    message: err.to_string(),
                }),
            None => Ok(SolveOutcome::Infeasible),
        }
    }
}

struct Search<'m, 'a> {
    model: &'m CostModel<'a>,
    deadline: Option<Instant>,
    routes: Vec<Vec<NodeIndex>>,
    pending: Vec<NodeIndex>,
    best: Option<(i64, Vec<Vec<NodeIndex>>)>,
}

impl Search<'_, '_> {
    fn explore(&mut self) {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return;
        }
        if self.pending.is_empty() {
            self.evaluate();
            return;
        }
        for position in 0..self.pending.len() {
            let node = self.pending.remove(position);
            for vehicle in 0..self.routes.len() {
                if let Some(route) = self.routes.get_mut(vehicle) {
                    route.push(node);
                }
                self.explore();
                if let Some(route) = self.routes.get_mut(vehicle) {
                    route.pop();
                }
            }
            self.pending.insert(position, node);
        }
    }

    fn evaluate(&mut self) {
        let instance = self.model.instance();
        let mut total: i64 = 0;
        for (route, vehicle) in self.routes.iter().zip(instance.vehicles()) {
            if route.is_empty() {
                continue;
            }
            let mut chain = Vec::with_capacity(route.len() + 2);
            chain.push(0);
            chain.extend_from_slice(route);
            chain.push(0);
            if !self.model.capacity_feasible(vehicle, &chain) || self.model.schedule(&chain).is_none()
            {
                return;
            }
            let Some(cost) = self.model.route_cost(vehicle, &chain) else {
                return;
            };
            total = total.saturating_add(cost);
        }
        if self.best.as_ref().is_none_or(|(best, _)| total < *best) {
            self.best = Some((total, self.routes.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostParameters;
    use crate::decoder::decode_routes;
    use rstest::rstest;

    fn solve(instance: &ProblemInstance) -> SolveOutcome {
        let model = CostModel::new(instance, CostParameters::default()).expect("model");
        ExhaustiveSolver
            .solve(&model, &SearchBudget::default())
            .expect("search runs")
    }

    #[rstest]
    fn finds_single_route_for_scenario_a() {
        let instance = scenario_a();
        let SolveOutcome::Solved(solution) = solve(&instance) else {
            panic!("scenario A is feasible");
        };
        let routes = decode_routes(&instance, solution.as_ref()).expect("decodes");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.first().map(|route| route.total_distance_m), Some(45));
    }

    #[rstest]
    #[case::capacity(scenario_b())]
    #[case::time_window(scenario_c())]
    fn reports_infeasible(#[case] instance: ProblemInstance) {
        assert!(solve(&instance).is_infeasible());
    }

    #[rstest]
    fn zero_budget_is_rejected() {
        let instance = scenario_a();
        let model = CostModel::new(&instance, CostParameters::default()).expect("model");
        let err = ExhaustiveSolver
            .solve(
                &model,
                &SearchBudget::with_time_limit(std::time::Duration::ZERO),
            )
            .expect_err("zero budget");
        assert_eq!(err, SolveError::ZeroBudget);
    }
}
