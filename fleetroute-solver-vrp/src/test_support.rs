//! Test-only utilities for `fleetroute-solver-vrp`.
//!
//! The helpers in this module are available to unit tests and behavioural
//! tests. They are gated behind the `test-support` feature (and `cfg(test)`).

use std::time::Duration;

use fleetroute_core::{
    CostParameters, PlanError, PlanOutcome, ProblemInstance, SearchBudget, SearchStrategy, plan,
};

use crate::VrpSolver;

/// A short budget that still lets `vrp-core` converge on tiny instances.
///
/// # Examples
/// ```rust
/// use fleetroute_solver_vrp::test_support::quick_budget;
///
/// assert_eq!(quick_budget().time_limit.as_secs(), 5);
/// ```
#[must_use]
pub const fn quick_budget() -> SearchBudget {
    SearchBudget {
        time_limit: Duration::from_secs(5),
        strategy: SearchStrategy::GuidedLocalSearch {
            max_generations: 200,
        },
    }
}

/// Plan `instance` with default parameters, a default [`VrpSolver`] and
/// [`quick_budget`].
///
/// # Errors
///
/// Propagates the [`PlanError`] returned by [`plan`].
pub fn plan_quickly(instance: &ProblemInstance) -> Result<PlanOutcome, PlanError> {
    plan(
        instance,
        CostParameters::default(),
        &VrpSolver::new(),
        &quick_budget(),
    )
}
