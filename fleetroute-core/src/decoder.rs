//! Turns a raw [`Solution`] into per-vehicle operational output.
//!
//! Metrics are recomputed from the instance rather than read from the
//! engine's objective: distance sums matrix entries over the traversal,
//! including the closing arc to the depot exactly once.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LocationKind, NodeIndex, ProblemInstance, Vehicle};
use crate::routing_index::RoutingIndex;
use crate::solver::{Dimension, Solution};

/// A malformed [`Solution`]; always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderContractViolation {
    /// The requested vehicle is not part of the fleet.
    #[error("vehicle {vehicle} is not part of the fleet")]
    UnknownVehicle {
        /// Vehicle requested.
        vehicle: usize,
    },
    /// The successor chain revisits an index before reaching the end.
    #[error("vehicle {vehicle}: traversal revisits routing index {index}")]
    Cycle {
        /// Vehicle being decoded.
        vehicle: usize,
        /// First revisited index.
        index: RoutingIndex,
    },
    /// The successor chain stops early or leaves the index space.
    #[error("vehicle {vehicle}: routing index {index} has no valid successor")]
    DanglingIndex {
        /// Vehicle being decoded.
        vehicle: usize,
        /// Index with a missing or invalid successor.
        index: RoutingIndex,
    },
    /// A visited index has no cumulative value.
    #[error("vehicle {vehicle}: no {dimension} value at routing index {index}")]
    MissingCumulative {
        /// Vehicle being decoded.
        vehicle: usize,
        /// Dimension queried.
        dimension: Dimension,
        /// Index queried.
        index: RoutingIndex,
    },
}

/// Position of a stop within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRole {
    /// Leaving the depot.
    Departure,
    /// A delivery or pickup.
    Visit,
    /// Back at the depot.
    Return,
}

/// One stop of a decoded route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Node visited.
    pub node: NodeIndex,
    /// Location name.
    pub name: String,
    /// Location address.
    pub address: String,
    /// Location kind.
    pub kind: LocationKind,
    /// Position within the route.
    pub role: StopRole,
    /// Cumulative time in seconds since midnight.
    pub arrival_seconds: i64,
}

impl RouteStop {
    /// Arrival formatted as `HH:MM:SS`.
    #[must_use]
    pub fn arrival_clock(&self) -> String {
        format_clock(self.arrival_seconds)
    }
}

/// Decoded route of one active vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Fleet position of the vehicle.
    pub vehicle_index: usize,
    /// The vehicle itself.
    pub vehicle: Vehicle,
    /// Stops in travel order, depot first and last.
    pub stops: Vec<RouteStop>,
    /// Recomputed road distance in metres.
    pub total_distance_m: i64,
    /// Signed sum of the demands served.
    pub total_load: i64,
    /// Fuel estimate in litres.
    pub fuel_litres: f64,
}

impl RouteResult {
    /// Distance in kilometres.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "report figures are fractional kilometres"
    )]
    pub fn distance_km(&self) -> f64 {
        self.total_distance_m as f64 / 1000.0
    }

    /// Human-readable stop sequence with arrival times.
    ///
    /// ```text
    /// Depot (dep. 08:00:00) -> Bakery (arr. 08:21:00) -> Depot (ret. 09:02:00)
    /// ```
    #[must_use]
    pub fn route_text(&self) -> String {
        self.stops
            .iter()
            .map(|stop| {
                let label = match stop.role {
                    StopRole::Departure => "dep.",
                    StopRole::Visit => "arr.",
                    StopRole::Return => "ret.",
                };
                format!("{} ({label} {})", stop.name, stop.arrival_clock())
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Ordered addresses for a mapping collaborator.
    #[must_use]
    pub fn waypoints(&self) -> Vec<&str> {
        self.stops.iter().map(|stop| stop.address.as_str()).collect()
    }

    /// Customer stops only.
    pub fn visits(&self) -> impl Iterator<Item = &RouteStop> {
        self.stops
            .iter()
            .filter(|stop| stop.role == StopRole::Visit)
    }
}

/// Format seconds since midnight as `HH:MM:SS`.
///
/// Values past midnight keep counting hours, so the horizon prints as
/// `24:00:00`.
#[must_use]
pub fn format_clock(seconds: i64) -> String {
    let clamped = seconds.max(0);
    let hours = clamped.div_euclid(3600);
    let minutes = clamped.rem_euclid(3600).div_euclid(60);
    let secs = clamped.rem_euclid(60);
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Fuel in litres for `distance_m` metres at `rate` litres per 100 km.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "fuel estimates are fractional litres"
)]
pub fn fuel_litres(distance_m: i64, rate: f64) -> f64 {
    (distance_m as f64 / 1000.0) / 100.0 * rate
}

/// Decode the route of `vehicle`.
///
/// Returns `Ok(None)` when the vehicle stays at the depot.
///
/// # Errors
///
/// Returns [`DecoderContractViolation`] when the solution does not describe a
/// finite chain from the vehicle's start to its end with cumulative times.
pub fn decode_route(
    instance: &ProblemInstance,
    solution: &(impl Solution + ?Sized),
    vehicle: usize,
) -> Result<Option<RouteResult>, DecoderContractViolation> {
    let manager = instance.index_manager();
    let details = instance
        .vehicle(vehicle)
        .ok_or(DecoderContractViolation::UnknownVehicle { vehicle })?;
    let (Some(start), Some(end)) = (manager.start(vehicle), manager.end(vehicle)) else {
        return Err(DecoderContractViolation::UnknownVehicle { vehicle });
    };
    let dangling = |index| DecoderContractViolation::DanglingIndex { vehicle, index };

    let first = solution.next_node(vehicle, start).ok_or_else(|| dangling(start))?;
    if first == end {
        return Ok(None);
    }

    let mut chain = vec![start];
    let mut visited = HashSet::from([start]);
    let mut current = start;
    loop {
        let next = solution.next_node(vehicle, current).ok_or_else(|| dangling(current))?;
        if next == end {
            chain.push(end);
            break;
        }
        if next.get() >= manager.size() || manager.is_start(next) || manager.is_end(next) {
            return Err(dangling(current));
        }
        if !visited.insert(next) {
            return Err(DecoderContractViolation::Cycle {
                vehicle,
                index: next,
            });
        }
        chain.push(next);
        current = next;
    }

    let mut stops = Vec::with_capacity(chain.len());
    let mut total_distance_m: i64 = 0;
    let mut total_load: i64 = 0;
    let mut previous: Option<NodeIndex> = None;
    let last = chain.len() - 1;
    for (position, &index) in chain.iter().enumerate() {
        let node = manager.index_to_node(index).ok_or_else(|| dangling(index))?;
        let location = instance.location(node).ok_or_else(|| dangling(index))?;
        let arrival_seconds = solution.cumulative_value(Dimension::Time, index).ok_or(
            DecoderContractViolation::MissingCumulative {
                vehicle,
                dimension: Dimension::Time,
                index,
            },
        )?;
        if let Some(from) = previous {
            let arc = instance
                .distances()
                .get(from, node)
                .ok_or_else(|| dangling(index))?;
            total_distance_m = total_distance_m.saturating_add(arc);
        }
        let role = if position == 0 {
            StopRole::Departure
        } else if position == last {
            StopRole::Return
        } else {
            total_load = total_load.saturating_add(location.demand);
            StopRole::Visit
        };
        stops.push(RouteStop {
            node,
            name: location.name.clone(),
            address: location.address.clone(),
            kind: location.kind,
            role,
            arrival_seconds,
        });
        previous = Some(node);
    }

    debug!(
        "decoded vehicle {} ({}): {} stops, {} m",
        vehicle,
        details.name,
        stops.len().saturating_sub(2),
        total_distance_m
    );
    Ok(Some(RouteResult {
        vehicle_index: vehicle,
        vehicle: details.clone(),
        stops,
        total_distance_m,
        total_load,
        fuel_litres: fuel_litres(total_distance_m, details.fuel_rate),
    }))
}

/// Decode every active vehicle in fleet order.
///
/// # Errors
///
/// Propagates the first [`DecoderContractViolation`] encountered.
pub fn decode_routes(
    instance: &ProblemInstance,
    solution: &(impl Solution + ?Sized),
) -> Result<Vec<RouteResult>, DecoderContractViolation> {
    let mut routes = Vec::new();
    for vehicle in 0..instance.vehicle_count() {
        if let Some(route) = decode_route(instance, solution, vehicle)? {
            routes.push(route);
        }
    }
    Ok(routes)
}
