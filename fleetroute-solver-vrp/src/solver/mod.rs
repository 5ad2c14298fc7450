//! `VrpSolver` implementation backed by `vrp-core`.

use std::time::Instant;

use fleetroute_core::{
    Assignment, CostModel, SearchBudget, SearchStrategy, Solution, SolveError, SolveOutcome,
    Solver,
};
use log::{info, warn};

use crate::vrp::{EngineLimits, VrpSolveContext};

/// Configuration for [`VrpSolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrpSolverConfig {
    /// Generations run when the budget asks for the construction only.
    pub construction_generations: usize,
}

impl Default for VrpSolverConfig {
    fn default() -> Self {
        Self {
            construction_generations: 1,
        }
    }
}

/// Native solver using `vrp-core` to search for low-cost route plans.
///
/// The engine's tours are re-timed and re-checked by [`Assignment`], so any
/// plan it returns satisfies the core capacity and time rules exactly.
#[derive(Debug, Clone, Default)]
pub struct VrpSolver {
    config: VrpSolverConfig,
}

impl VrpSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpSolverConfig) -> Self {
        Self { config }
    }

    fn limits(&self, budget: &SearchBudget) -> Result<EngineLimits, SolveError> {
        if budget.time_limit.is_zero() {
            return Err(SolveError::ZeroBudget);
        }
        let max_time_secs = usize::try_from(budget.time_limit.as_secs())
            .unwrap_or(usize::MAX)
            .max(1);
        let max_generations = match budget.strategy {
            SearchStrategy::CheapestArc => self.config.construction_generations,
            SearchStrategy::GuidedLocalSearch { max_generations } => max_generations,
        }
        .max(1);
        Ok(EngineLimits {
            max_time_secs,
            max_generations,
        })
    }
}

impl Solver for VrpSolver {
    fn solve(
        &self,
        model: &CostModel<'_>,
        budget: &SearchBudget,
    ) -> Result<SolveOutcome, SolveError> {
        let limits = self.limits(budget)?;
        let started_at = Instant::now();
        let instance = model.instance();

        let routes = if instance.node_count() <= 1 {
            vec![Vec::new(); instance.vehicle_count()]
        } else {
            match VrpSolveContext::new(model).solve(limits)? {
                Some(routes) => routes,
                None => return Ok(SolveOutcome::Infeasible),
            }
        };

        match Assignment::from_routes(model, &routes) {
            Ok(assignment) => {
                info!(
                    "vrp-core found a plan with objective {} in {:?}",
                    assignment.objective(),
                    started_at.elapsed()
                );
                let solution: Box<dyn Solution + Send + Sync> = Box::new(assignment);
                Ok(SolveOutcome::Solved(solution))
            }
            Err(err) if err.is_constraint_violation() => {
                warn!("discarding vrp-core plan that breaks the route model: {err}");
                Ok(SolveOutcome::Infeasible)
            }
            Err(err) => Err(SolveError::Engine {
                message: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
