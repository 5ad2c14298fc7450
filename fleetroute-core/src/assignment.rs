//! Recorded [`Solution`] assembled from per-vehicle node sequences.
//!
//! Engine adapters translate their own tour representation into plain node
//! lists and let [`Assignment::from_routes`] derive successors and
//! cumulative values from the [`CostModel`], so decoded output never depends
//! on engine-internal bookkeeping.

use log::debug;
use thiserror::Error;

use crate::cost::CostModel;
use crate::model::NodeIndex;
use crate::routing_index::{RoutingIndex, RoutingIndexManager};
use crate::solver::{Dimension, Solution};

/// Reasons a set of routes cannot become an [`Assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// One route per vehicle is required.
    #[error("expected {expected} routes, one per vehicle, found {found}")]
    RouteCount {
        /// Fleet size.
        expected: usize,
        /// Routes supplied.
        found: usize,
    },
    /// A route names a node outside the instance or the depot.
    #[error("vehicle {vehicle}: node {node} is not a customer")]
    NotACustomer {
        /// Vehicle whose route is malformed.
        vehicle: usize,
        /// Offending node.
        node: NodeIndex,
    },
    /// A customer appears on more than one route or twice on one route.
    #[error("node {node} is visited more than once")]
    RepeatedNode {
        /// Offending node.
        node: NodeIndex,
    },
    /// A customer is left without a vehicle.
    #[error("node {node} is not visited by any vehicle")]
    Unvisited {
        /// Unserved node.
        node: NodeIndex,
    },
    /// The route exceeds the vehicle capacity.
    #[error("vehicle {vehicle}: route exceeds capacity")]
    CapacityExceeded {
        /// Overloaded vehicle.
        vehicle: usize,
    },
    /// The route cost does not fit the integer cost range.
    #[error("vehicle {vehicle}: route cost overflows")]
    CostOverflow {
        /// Vehicle whose route cannot be costed.
        vehicle: usize,
    },
    /// No timing honours every window, the slack limit and the horizon.
    #[error("vehicle {vehicle}: route violates time windows")]
    TimeInfeasible {
        /// Vehicle whose route cannot be timed.
        vehicle: usize,
    },
}

impl AssignmentError {
    /// Whether the error reflects a constraint violation rather than a
    /// malformed route list.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::TimeInfeasible { .. }
        )
    }
}

/// Successor table and cumulative values for every routing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    manager: RoutingIndexManager,
    owners: Vec<Option<usize>>,
    successors: Vec<Option<RoutingIndex>>,
    loads: Vec<Option<i64>>,
    times: Vec<Option<i64>>,
    objective: i64,
}

impl Assignment {
    /// Build an assignment from customer sequences, one per vehicle.
    ///
    /// Each sequence lists the customers visited in order, without depot
    /// terminals. Empty sequences leave the vehicle inactive.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError`] when the routes do not cover every
    /// customer exactly once, break a capacity or time constraint, or cost
    /// more than the integer cost range holds.
    pub fn from_routes(
        model: &CostModel<'_>,
        routes: &[Vec<NodeIndex>],
    ) -> Result<Self, AssignmentError> {
        let instance = model.instance();
        let manager = instance.index_manager();
        if routes.len() != manager.vehicle_count() {
            return Err(AssignmentError::RouteCount {
                expected: manager.vehicle_count(),
                found: routes.len(),
            });
        }

        let size = manager.size();
        let mut assignment = Self {
            manager,
            owners: vec![None; size],
            successors: vec![None; size],
            loads: vec![None; size],
            times: vec![None; size],
            objective: 0,
        };
        let mut seen = vec![false; instance.node_count()];
        for (vehicle, (customers, details)) in routes.iter().zip(instance.vehicles()).enumerate() {
            let chain = depot_chain(customers);
            let indices = chain_indices(&manager, vehicle, customers)?;
            for &node in customers {
                let slot = seen
                    .get_mut(node)
                    .ok_or(AssignmentError::NotACustomer { vehicle, node })?;
                if *slot {
                    return Err(AssignmentError::RepeatedNode { node });
                }
                *slot = true;
            }
            if !model.capacity_feasible(details, &chain) {
                return Err(AssignmentError::CapacityExceeded { vehicle });
            }
            let loads = model
                .load_profile(&chain)
                .ok_or(AssignmentError::CapacityExceeded { vehicle })?;
            let times = if customers.is_empty() {
                let start = instance.depot_window().start;
                vec![start, start]
            } else {
                model
                    .schedule(&chain)
                    .ok_or(AssignmentError::TimeInfeasible { vehicle })?
            };
            assignment.objective = model
                .route_cost(details, &chain)
                .and_then(|cost| assignment.objective.checked_add(cost))
                .ok_or(AssignmentError::CostOverflow { vehicle })?;
            assignment.record(vehicle, &indices, &loads, &times);
        }
        if let Some(node) = seen.iter().skip(1).position(|visited| !visited) {
            return Err(AssignmentError::Unvisited { node: node + 1 });
        }

        debug!(
            "recorded assignment for {} vehicles with objective {}",
            routes.len(),
            assignment.objective
        );
        Ok(assignment)
    }

    /// Total arc and activation cost of the assignment.
    #[must_use]
    pub const fn objective(&self) -> i64 {
        self.objective
    }

    fn record(&mut self, vehicle: usize, indices: &[RoutingIndex], loads: &[i64], times: &[i64]) {
        for (position, index) in indices.iter().enumerate() {
            let raw = index.get();
            if let Some(owner) = self.owners.get_mut(raw) {
                *owner = Some(vehicle);
            }
            if let Some(next) = self.successors.get_mut(raw) {
                *next = indices.get(position + 1).copied();
            }
            if let Some(load) = self.loads.get_mut(raw) {
                *load = loads.get(position).copied();
            }
            if let Some(time) = self.times.get_mut(raw) {
                *time = times.get(position).copied();
            }
        }
    }
}

impl Solution for Assignment {
    fn next_node(&self, vehicle: usize, index: RoutingIndex) -> Option<RoutingIndex> {
        if self.manager.start(vehicle).is_none() {
            return None;
        }
        match self.owners.get(index.get()).copied().flatten() {
            Some(owner) if owner == vehicle => self.successors.get(index.get()).copied().flatten(),
            _ => None,
        }
    }

    fn cumulative_value(&self, dimension: Dimension, index: RoutingIndex) -> Option<i64> {
        let values = match dimension {
            Dimension::Capacity => &self.loads,
            Dimension::Time => &self.times,
        };
        values.get(index.get()).copied().flatten()
    }
}

fn depot_chain(customers: &[NodeIndex]) -> Vec<NodeIndex> {
    let mut chain = Vec::with_capacity(customers.len() + 2);
    chain.push(0);
    chain.extend_from_slice(customers);
    chain.push(0);
    chain
}

fn chain_indices(
    manager: &RoutingIndexManager,
    vehicle: usize,
    customers: &[NodeIndex],
) -> Result<Vec<RoutingIndex>, AssignmentError> {
    let start = manager
        .start(vehicle)
        .ok_or(AssignmentError::NotACustomer { vehicle, node: 0 })?;
    let end = manager
        .end(vehicle)
        .ok_or(AssignmentError::NotACustomer { vehicle, node: 0 })?;
    let mut indices = Vec::with_capacity(customers.len() + 2);
    indices.push(start);
    for &node in customers {
        indices.push(
            manager
                .node_to_index(node)
                .ok_or(AssignmentError::NotACustomer { vehicle, node })?,
        );
    }
    indices.push(end);
    Ok(indices)
}
