//! One synchronous planning run: model, solve, decode, aggregate.

use std::fmt;

use log::{info, warn};
use thiserror::Error;

use crate::cost::{CostModel, CostParameters};
use crate::decoder::{DecoderContractViolation, decode_routes};
use crate::error::ConfigurationError;
use crate::model::ProblemInstance;
use crate::report::Report;
use crate::solver::{SearchBudget, SolveError, SolveOutcome, Solver};

/// Corrective hints shown when no feasible plan exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfeasibleGuidance;

impl fmt::Display for InfeasibleGuidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            "no route plan satisfies every constraint; widen the stop time windows, \
             add vehicles or capacity, or lower the vehicle cost parameters",
        )
    }
}

/// Result of [`plan`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Every stop is assigned.
    Planned(Report),
    /// The solver found no feasible assignment; nothing was decoded.
    Infeasible(InfeasibleGuidance),
}

/// Errors returned by [`plan`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The cost parameters are invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The engine failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
    /// The engine returned a malformed solution.
    #[error(transparent)]
    Decode(#[from] DecoderContractViolation),
}

/// Plan one run against `solver` within `budget`.
///
/// # Errors
///
/// Returns [`PlanError`] for invalid parameters, engine failures or malformed
/// solutions. Infeasibility is reported through [`PlanOutcome::Infeasible`].
pub fn plan(
    instance: &ProblemInstance,
    parameters: CostParameters,
    solver: &dyn Solver,
    budget: &SearchBudget,
) -> Result<PlanOutcome, PlanError> {
    let model = CostModel::new(instance, parameters)?;
    match solver.solve(&model, budget)? {
        SolveOutcome::Infeasible => {
            warn!(
                "no feasible plan for {} stops and {} vehicles",
                instance.node_count().saturating_sub(1),
                instance.vehicle_count()
            );
            Ok(PlanOutcome::Infeasible(InfeasibleGuidance))
        }
        SolveOutcome::Solved(solution) => {
            let routes = decode_routes(instance, solution.as_ref())?;
            let report = Report::aggregate(routes);
            info!(
                "planned {} active vehicles covering {} m",
                report.active_vehicle_count(),
                report.total_distance_m()
            );
            Ok(PlanOutcome::Planned(report))
        }
    }
}
