//! Cost and constraint callbacks handed to a solver.
//!
//! Every quantity is an integer in a shared unit: metres for arc costs and
//! fixed vehicle costs, weight units for capacity, seconds for time.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::model::{NodeIndex, ProblemInstance, SECONDS_PER_DAY, TimeWindow, Vehicle};
use crate::solver::Dimension;

/// Maximum waiting time absorbed at a single stop, in seconds.
pub const TIME_SLACK_SECONDS: i64 = 3600;

/// Upper bound on any cumulative time value, in seconds.
pub const TIME_HORIZON_SECONDS: i64 = SECONDS_PER_DAY;

/// How signed demands accumulate against vehicle capacity.
///
/// A positive demand is goods dropped at the stop; a negative demand is goods
/// collected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Every stop consumes `|demand|`; pickups and deliveries both add load.
    #[default]
    Accumulate,
    /// The vehicle leaves the depot loaded with every delivery on its route.
    /// Each delivery unloads its demand and each pickup loads `|demand|`, so
    /// capacity freed by deliveries is reused by later pickups.
    PickupRelease,
}

/// Weights of the fixed vehicle activation cost.
///
/// Both weights are expressed in kilometre-equivalents so they share units
/// with the distance objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParameters {
    /// Flat cost of using any vehicle.
    pub base_cost: f64,
    /// Extra cost per 1000 units of vehicle capacity.
    pub capacity_coefficient: f64,
    /// Capacity accumulation rule.
    #[serde(default)]
    pub capacity_policy: CapacityPolicy,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            base_cost: 20.0,
            capacity_coefficient: 2.0,
            capacity_policy: CapacityPolicy::Accumulate,
        }
    }
}

impl CostParameters {
    /// Reject negative or non-finite weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidCostParameter`] naming the weight.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("base_cost", self.base_cost),
            ("capacity_coefficient", self.capacity_coefficient),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidCostParameter { field, value });
            }
        }
        Ok(())
    }
}

/// Bounds a solver must enforce on one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSpec {
    /// Dimension described.
    pub dimension: Dimension,
    /// Largest slack permitted at a single node.
    pub max_slack: i64,
    /// Upper bound on the cumulative value, per vehicle.
    pub vehicle_limits: Vec<i64>,
    /// Whether every vehicle starts the dimension at zero.
    pub start_at_zero: bool,
}

/// Callbacks over a validated [`ProblemInstance`].
#[derive(Debug, Clone, Copy)]
pub struct CostModel<'a> {
    instance: &'a ProblemInstance,
    parameters: CostParameters,
}

impl<'a> CostModel<'a> {
    /// Bind validated parameters to an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidCostParameter`] when a weight is
    /// negative or not finite.
    pub fn new(
        instance: &'a ProblemInstance,
        parameters: CostParameters,
    ) -> Result<Self, ConfigurationError> {
        parameters.validate()?;
        Ok(Self {
            instance,
            parameters,
        })
    }

    /// The instance the callbacks read from.
    #[must_use]
    pub const fn instance(&self) -> &'a ProblemInstance {
        self.instance
    }

    /// Parameters in effect.
    #[must_use]
    pub const fn parameters(&self) -> CostParameters {
        self.parameters
    }

    /// Arc cost: the road distance in metres.
    #[must_use]
    pub fn arc_cost(&self, from: NodeIndex, to: NodeIndex) -> Option<i64> {
        self.instance.distances().get(from, to)
    }

    /// Change in load when leaving `node`.
    #[must_use]
    pub fn capacity_transit(&self, node: NodeIndex) -> Option<i64> {
        let demand = self.instance.demand(node)?;
        match self.parameters.capacity_policy {
            CapacityPolicy::Accumulate => demand.checked_abs(),
            CapacityPolicy::PickupRelease => demand.checked_neg(),
        }
    }

    /// Load on board when the vehicle leaves the depot along `chain`.
    ///
    /// Zero under [`CapacityPolicy::Accumulate`]; the sum of the deliveries
    /// on the chain under [`CapacityPolicy::PickupRelease`].
    #[must_use]
    pub fn initial_load(&self, chain: &[NodeIndex]) -> Option<i64> {
        match self.parameters.capacity_policy {
            CapacityPolicy::Accumulate => Some(0),
            CapacityPolicy::PickupRelease => chain.iter().try_fold(0_i64, |total, &node| {
                total.checked_add(self.instance.demand(node)?.max(0))
            }),
        }
    }

    /// Travel duration plus the service time spent at `from`.
    #[must_use]
    pub fn time_transit(&self, from: NodeIndex, to: NodeIndex) -> Option<i64> {
        let travel = self.instance.durations().get(from, to)?;
        travel.checked_add(self.instance.service_time())
    }

    /// Activation cost of `vehicle` in metre-equivalents.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        reason = "the cost weights are fractional kilometre-equivalents rounded to whole metres"
    )]
    pub fn fixed_vehicle_cost(&self, vehicle: &Vehicle) -> i64 {
        let capacity_thousands = vehicle.capacity as f64 / 1000.0;
        let kilometres =
            self.parameters.base_cost + capacity_thousands * self.parameters.capacity_coefficient;
        (kilometres * 1000.0).round() as i64
    }

    /// Bounds for `dimension`.
    #[must_use]
    pub fn dimension_spec(&self, dimension: Dimension) -> DimensionSpec {
        match dimension {
            Dimension::Capacity => DimensionSpec {
                dimension,
                max_slack: 0,
                vehicle_limits: self
                    .instance
                    .vehicles()
                    .iter()
                    .map(|vehicle| vehicle.capacity)
                    .collect(),
                start_at_zero: self.parameters.capacity_policy == CapacityPolicy::Accumulate,
            },
            Dimension::Time => DimensionSpec {
                dimension,
                max_slack: TIME_SLACK_SECONDS,
                vehicle_limits: vec![TIME_HORIZON_SECONDS; self.instance.vehicle_count()],
                start_at_zero: false,
            },
        }
    }

    /// Cumulative capacity at each position of a depot-to-depot chain.
    ///
    /// Returns `None` when the chain references an unknown node or the load
    /// leaves the `i64` range.
    #[must_use]
    pub fn load_profile(&self, chain: &[NodeIndex]) -> Option<Vec<i64>> {
        let mut loads = Vec::with_capacity(chain.len());
        let mut load = self.initial_load(chain)?;
        for (position, &node) in chain.iter().enumerate() {
            if position > 0 {
                let previous = chain.get(position - 1).copied()?;
                load = load.checked_add(self.capacity_transit(previous)?)?;
            }
            if self.instance.location(node).is_none() {
                return None;
            }
            loads.push(load);
        }
        Some(loads)
    }

    /// Whether `vehicle` can carry the chain without leaving `[0, capacity]`.
    #[must_use]
    pub fn capacity_feasible(&self, vehicle: &Vehicle, chain: &[NodeIndex]) -> bool {
        self.load_profile(chain).is_some_and(|loads| {
            loads
                .iter()
                .all(|&load| (0..=vehicle.capacity).contains(&load))
        })
    }

    /// Earliest-return cumulative times along a depot-to-depot chain.
    ///
    /// The start and the return honour the depot window, each intermediate
    /// stop its own window. Waiting at a stop is limited to
    /// [`TIME_SLACK_SECONDS`]. The departure is pushed as late as the return
    /// allows. Returns `None` when no timing satisfies every bound.
    #[must_use]
    pub fn schedule(&self, chain: &[NodeIndex]) -> Option<Vec<i64>> {
        let last = chain.len().checked_sub(1)?;
        if last == 0 || chain.first() != Some(&0) || chain.get(last) != Some(&0) {
            return None;
        }

        let mut transits = Vec::with_capacity(last);
        let mut bounds: Vec<(i64, i64)> = Vec::with_capacity(chain.len());
        let start = self.window_at(0, chain, last)?;
        bounds.push((start.start, start.end.min(TIME_HORIZON_SECONDS)));
        for (position, pair) in chain.windows(2).enumerate() {
            let [from, to] = pair else { return None };
            let transit = self.time_transit(*from, *to)?;
            let &(earliest, latest) = bounds.last()?;
            let window = self.window_at(position + 1, chain, last)?;
            let low = earliest.checked_add(transit)?.max(window.start);
            let high = latest
                .checked_add(transit)?
                .checked_add(TIME_SLACK_SECONDS)?
                .min(window.end);
            if low > high {
                return None;
            }
            transits.push(transit);
            bounds.push((low, high));
        }

        let mut times = vec![0; chain.len()];
        let mut next = bounds.last()?.0;
        for position in (0..chain.len()).rev() {
            let &(_, latest) = bounds.get(position)?;
            let value = if position == last {
                next
            } else {
                latest.min(next.checked_sub(*transits.get(position)?)?)
            };
            *times.get_mut(position)? = value;
            next = value;
        }
        Some(times)
    }

    /// Arc costs of the chain plus the fixed cost when it visits anyone.
    #[must_use]
    pub fn route_cost(&self, vehicle: &Vehicle, chain: &[NodeIndex]) -> Option<i64> {
        let mut total: i64 = 0;
        for pair in chain.windows(2) {
            let [from, to] = pair else { return None };
            total = total.checked_add(self.arc_cost(*from, *to)?)?;
        }
        if chain.len() > 2 {
            total = total.checked_add(self.fixed_vehicle_cost(vehicle))?;
        }
        Some(total)
    }

    fn window_at(&self, position: usize, chain: &[NodeIndex], last: usize) -> Option<TimeWindow> {
        if position == 0 || position == last {
            return Some(self.instance.depot_window());
        }
        let node = *chain.get(position)?;
        if node == 0 {
            return None;
        }
        self.instance.time_window(node)
    }
}
