//! `vrp-core` modelling helpers for `VrpSolver`.
//!
//! This module converts a [`CostModel`] into a `vrp-core` problem, runs the
//! search, and reads the resulting tours back as customer sequences indexed
//! by vehicle.

use std::fmt;
use std::sync::Arc;

use fleetroute_core::{CapacityPolicy, CostModel, NodeIndex, SolveError};
use log::debug;
use vrp_core::models::common::{Location, Profile, TimeWindow as VrpTimeWindow};
use vrp_core::models::problem::TravelTime;
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;

custom_dimension!(VehicleSlot typeof usize);

const DEPOT_LOCATION: Location = 0;

/// Search limits handed to `vrp-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EngineLimits {
    pub(super) max_time_secs: usize,
    pub(super) max_generations: usize,
}

fn engine_error(err: impl fmt::Display) -> SolveError {
    SolveError::Engine {
        message: err.to_string(),
    }
}

/// Narrow a model quantity to the 32-bit range `vrp-core` loads use.
fn narrow(value: i64, what: impl FnOnce() -> String) -> Result<i32, SolveError> {
    i32::try_from(value).map_err(|_| SolveError::Unsupported { what: what() })
}

fn define_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let capacity_feature = CapacityFeatureBuilder::<SingleDimLoad>::new("capacity").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-cost")
        .set_transport_cost(transport)
        .set_time_constrained(true)
        .build_minimize_cost()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, capacity_feature, transport_feature])?
        .build()
}

/// Demand of one stop in `vrp-core` terms.
///
/// Under [`CapacityPolicy::PickupRelease`] positive demand is a static
/// delivery loaded at the depot and negative demand a static pickup brought
/// back to it. Accumulated demand is always delivered.
fn stop_demand(policy: CapacityPolicy, demand: i32) -> Demand<SingleDimLoad> {
    match policy {
        CapacityPolicy::PickupRelease if demand < 0 => Demand {
            pickup: (SingleDimLoad::new(demand.saturating_abs()), SingleDimLoad::default()),
            delivery: (SingleDimLoad::default(), SingleDimLoad::default()),
        },
        CapacityPolicy::PickupRelease | CapacityPolicy::Accumulate => {
            Demand::delivery(demand.saturating_abs())
        }
    }
}

fn define_jobs(model: &CostModel<'_>) -> Result<Vec<Job>, SolveError> {
    let instance = model.instance();
    let policy = model.parameters().capacity_policy;
    instance
        .locations()
        .iter()
        .skip(1)
        .map(|location| {
            let node = location.id;
            let demand = narrow(location.demand, || format!("demand of stop {}", location.name))?;
            let window = location.time_window;
            let start = narrow(window.start, || format!("window start of stop {}", location.name))?;
            let end = narrow(window.end, || format!("window end of stop {}", location.name))?;
            SingleBuilder::default()
                .id(format!("stop{node}").as_str())
                .demand(stop_demand(policy, demand))
                .location(node)
                .and_then(|builder| {
                    builder.times(vec![VrpTimeWindow::new(f64::from(start), f64::from(end))])
                })
                .and_then(SingleBuilder::build_as_job)
                .map_err(engine_error)
        })
        .collect()
}

fn define_vehicles(model: &CostModel<'_>) -> Result<Vec<Vehicle>, SolveError> {
    let instance = model.instance();
    let depot = instance.depot_window();
    let open = narrow(depot.start, || "depot opening time".to_owned())?;
    let close = narrow(depot.end, || "depot closing time".to_owned())?;
    instance
        .vehicles()
        .iter()
        .enumerate()
        .map(|(slot, details)| {
            let capacity = narrow(details.capacity, || format!("capacity of {}", details.name))?;
            let fixed = narrow(model.fixed_vehicle_cost(details), || {
                format!("activation cost of {}", details.name)
            })?;
            let detail = VehicleDetailBuilder::default()
                .set_start_location(DEPOT_LOCATION)
                .set_start_time(f64::from(open))
                .set_start_time_latest(f64::from(close))
                .set_end_location(DEPOT_LOCATION)
                .set_end_time(f64::from(close))
                .build()
                .map_err(engine_error)?;
            let mut vehicle = VehicleBuilder::default()
                .id(format!("vehicle{slot}").as_str())
                .add_detail(detail)
                .capacity(SingleDimLoad::new(capacity))
                .dimension(|dimens| {
                    dimens.set_vehicle_slot(slot);
                })
                .build()
                .map_err(engine_error)?;
            vehicle.costs.fixed = f64::from(fixed);
            Ok(vehicle)
        })
        .collect()
}

/// Routing matrices derived from the cost model callbacks.
///
/// Durations already include the service time spent at the origin, so jobs
/// carry no separate service duration.
struct ModelTransportCost {
    size: usize,
    distances: Vec<f64>,
    durations: Vec<f64>,
}

impl ModelTransportCost {
    fn from_model(model: &CostModel<'_>) -> Result<Self, SolveError> {
        let size = model.instance().node_count();
        let mut distances = Vec::with_capacity(size.saturating_mul(size));
        let mut durations = Vec::with_capacity(size.saturating_mul(size));
        for from in 0..size {
            for to in 0..size {
                let distance = model
                    .arc_cost(from, to)
                    .ok_or_else(|| engine_error(format!("no distance from {from} to {to}")))?;
                let duration = model
                    .time_transit(from, to)
                    .ok_or_else(|| engine_error(format!("no duration from {from} to {to}")))?;
                distances.push(f64::from(narrow(distance, || {
                    format!("distance from {from} to {to}")
                })?));
                durations.push(f64::from(narrow(duration, || {
                    format!("duration from {from} to {to}")
                })?));
            }
        }
        Ok(Self {
            size,
            distances,
            durations,
        })
    }

    fn lookup(&self, values: &[f64], from: Location, to: Location) -> f64 {
        let result = from
            .checked_mul(self.size)
            .and_then(|offset| offset.checked_add(to))
            .and_then(|cell| values.get(cell))
            .copied();
        debug_assert!(
            result.is_some(),
            "Matrix lookup failed: from={from}, to={to}"
        );
        result.unwrap_or(0.0)
    }
}

impl TransportCost for ModelTransportCost {
    fn distance(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> Cost {
        self.lookup(&self.distances, from, to)
    }

    fn duration(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> f64 {
        self.lookup(&self.durations, from, to)
    }

    fn distance_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.lookup(&self.distances, from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.lookup(&self.durations, from, to)
    }
}

fn define_problem(
    model: &CostModel<'_>,
    goal: GoalContext,
    transport: Arc<dyn TransportCost>,
) -> Result<Problem, SolveError> {
    let jobs = define_jobs(model)?;
    let vehicles = define_vehicles(model)?;
    debug!(
        "defined vrp-core problem with {} jobs and {} vehicles",
        jobs.len(),
        vehicles.len()
    );
    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(vehicles.into_iter())
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
        .map_err(engine_error)
}

/// Context for running a `vrp-core` solve against one cost model.
pub(super) struct VrpSolveContext<'m, 'a> {
    model: &'m CostModel<'a>,
}

impl<'m, 'a> VrpSolveContext<'m, 'a> {
    /// Create a new solve context.
    pub(super) const fn new(model: &'m CostModel<'a>) -> Self {
        Self { model }
    }

    /// Run the search and return one customer sequence per vehicle.
    ///
    /// Returns `Ok(None)` when the engine leaves any stop unassigned.
    pub(super) fn solve(
        &self,
        limits: EngineLimits,
    ) -> Result<Option<Vec<Vec<NodeIndex>>>, SolveError> {
        let transport = Arc::new(ModelTransportCost::from_model(self.model)?);
        let goal = define_goal(transport.clone()).map_err(engine_error)?;
        let problem = Arc::new(define_problem(self.model, goal, transport)?);

        let vrp_config = VrpConfigBuilder::new(problem.clone())
            .prebuild()
            .map_err(engine_error)?
            .with_max_time(Some(limits.max_time_secs))
            .with_max_generations(Some(limits.max_generations))
            .build()
            .map_err(engine_error)?;

        let solution = vrp_core::solver::Solver::new(problem, vrp_config)
            .solve()
            .map_err(engine_error)?;

        if !solution.unassigned.is_empty() {
            debug!("vrp-core left {} stops unassigned", solution.unassigned.len());
            return Ok(None);
        }

        let mut routes = vec![Vec::new(); self.model.instance().vehicle_count()];
        for route in &solution.routes {
            let slot = route
                .actor
                .vehicle
                .dimens
                .get_vehicle_slot()
                .copied()
                .ok_or_else(|| engine_error("tour without a vehicle slot"))?;
            let customers = route
                .tour
                .all_activities()
                .map(|activity| activity.place.location)
                .filter(|&location| location != DEPOT_LOCATION)
                .collect();
            let entry = routes
                .get_mut(slot)
                .ok_or_else(|| engine_error(format!("tour for unknown vehicle slot {slot}")))?;
            *entry = customers;
        }
        Ok(Some(routes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetroute_core::CostParameters;
    use fleetroute_core::test_support::{scenario_a, scenario_d};
    use rstest::rstest;

    #[rstest]
    fn transport_durations_include_service_time() {
        let instance = scenario_a();
        let model = CostModel::new(&instance, CostParameters::default()).expect("valid model");
        let transport = ModelTransportCost::from_model(&model).expect("matrices fit");
        let service = 1200.0;
        assert!((transport.lookup(&transport.durations, 0, 1) - (60.0 + service)).abs() < 1e-9);
        assert!((transport.lookup(&transport.distances, 1, 2) - 15.0).abs() < 1e-9);
    }

    #[rstest]
    fn vehicles_carry_activation_cost_and_slot() {
        let instance = scenario_d();
        let model = CostModel::new(&instance, CostParameters::default()).expect("valid model");
        let vehicles = define_vehicles(&model).expect("vehicles fit");
        assert_eq!(vehicles.len(), 2);
        for (slot, vehicle) in vehicles.iter().enumerate() {
            assert_eq!(vehicle.dimens.get_vehicle_slot(), Some(&slot));
            assert!((vehicle.costs.fixed - 20_020.0).abs() < 1e-9);
        }
    }

    #[rstest]
    fn vehicles_return_before_depot_closes() {
        let instance = scenario_a();
        let model = CostModel::new(&instance, CostParameters::default()).expect("valid model");
        let vehicles = define_vehicles(&model).expect("vehicles fit");
        let detail = vehicles
            .first()
            .and_then(|vehicle| vehicle.details.first())
            .expect("one shift");
        let start = detail.start.as_ref().expect("start place");
        let end = detail.end.as_ref().expect("end place");
        assert_eq!(start.time.earliest, Some(28_800.0));
        assert_eq!(start.time.latest, Some(64_800.0));
        assert_eq!(end.time.latest, Some(64_800.0));
    }

    #[rstest]
    #[case(CapacityPolicy::Accumulate, -4, 0, 4)]
    #[case(CapacityPolicy::PickupRelease, 4, 0, 4)]
    #[case(CapacityPolicy::PickupRelease, -4, 4, 0)]
    fn demands_follow_capacity_policy(
        #[case] policy: CapacityPolicy,
        #[case] demand: i32,
        #[case] pickup: i32,
        #[case] delivery: i32,
    ) {
        let converted = stop_demand(policy, demand);
        assert_eq!(converted.pickup.0, SingleDimLoad::new(pickup));
        assert_eq!(converted.delivery.0, SingleDimLoad::new(delivery));
    }

    #[rstest]
    fn oversized_quantities_are_unsupported() {
        let err = narrow(i64::from(i32::MAX) + 1, || "capacity of Van".to_owned())
            .expect_err("value exceeds 32 bits");
        assert_eq!(
            err,
            SolveError::Unsupported {
                what: "capacity of Van".to_owned()
            }
        );
    }
}
