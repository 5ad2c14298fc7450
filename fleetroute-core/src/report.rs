//! Run-level totals and renderings of decoded routes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decoder::RouteResult;

/// Outcome of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    routes: Vec<RouteResult>,
    active_vehicle_count: usize,
    total_distance_m: i64,
}

/// Flat row for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// Vehicle display name.
    pub vehicle_name: String,
    /// Vehicle capacity.
    pub vehicle_capacity: i64,
    /// Stop sequence with arrival times.
    pub route_text: String,
    /// Route distance in kilometres.
    pub distance_km: f64,
    /// Signed load served.
    pub load: i64,
    /// Fuel estimate in litres.
    pub fuel_litres: f64,
}

impl Report {
    /// Aggregate decoded routes, ordering them by fleet position.
    #[must_use]
    pub fn aggregate(mut routes: Vec<RouteResult>) -> Self {
        routes.sort_by_key(|route| route.vehicle_index);
        let total_distance_m = routes.iter().map(|route| route.total_distance_m).sum();
        Self {
            active_vehicle_count: routes.len(),
            total_distance_m,
            routes,
        }
    }

    /// Routes of active vehicles in fleet order.
    #[must_use]
    pub fn routes(&self) -> &[RouteResult] {
        &self.routes
    }

    /// Number of vehicles that leave the depot.
    #[must_use]
    pub const fn active_vehicle_count(&self) -> usize {
        self.active_vehicle_count
    }

    /// Sum of recomputed route distances in metres.
    #[must_use]
    pub const fn total_distance_m(&self) -> i64 {
        self.total_distance_m
    }

    /// Total distance in kilometres.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "report figures are fractional kilometres"
    )]
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m as f64 / 1000.0
    }

    /// Total fuel estimate in litres.
    #[must_use]
    pub fn total_fuel_litres(&self) -> f64 {
        self.routes.iter().map(|route| route.fuel_litres).sum()
    }

    /// One export row per active vehicle.
    #[must_use]
    pub fn rows(&self) -> Vec<ExportRow> {
        self.routes
            .iter()
            .map(|route| ExportRow {
                vehicle_name: route.vehicle.name.clone(),
                vehicle_capacity: route.vehicle.capacity,
                route_text: route.route_text(),
                distance_km: route.distance_km(),
                load: route.total_load,
                fuel_litres: route.fuel_litres,
            })
            .collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active vehicles: {}", self.active_vehicle_count)?;
        writeln!(f, "Total distance: {:.2} km", self.total_distance_km())?;
        writeln!(f, "Total fuel: {:.2} l", self.total_fuel_litres())?;
        for route in &self.routes {
            writeln!(f)?;
            writeln!(
                f,
                "{} ({} kg):",
                route.vehicle.name, route.vehicle.capacity
            )?;
            writeln!(f, "  - Route: {}", route.route_text())?;
            writeln!(f, "  - Distance: {:.2} km", route.distance_km())?;
            writeln!(f, "  - Load: {} kg", route.total_load)?;
            writeln!(f, "  - Fuel: {:.2} l", route.fuel_litres)?;
        }
        Ok(())
    }
}
