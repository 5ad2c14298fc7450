//! Contract between the core and an optimisation engine.
//!
//! The engine is opaque: it receives a [`CostModel`] and a [`SearchBudget`],
//! and answers with a [`Solution`] the core can query through two calls, or
//! with [`SolveOutcome::Infeasible`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::CostModel;
use crate::routing_index::RoutingIndex;

/// Default wall-clock budget for a search.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(20);

/// Constraint dimension tracked per routing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Cumulative load.
    Capacity,
    /// Cumulative time in seconds since midnight.
    Time,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity => f.write_str("capacity"),
            Self::Time => f.write_str("time"),
        }
    }
}

/// Read-only view of a solver assignment.
///
/// Implementations must describe, for every vehicle, a chain of successors
/// from its start index to its end index.
pub trait Solution: fmt::Debug {
    /// Successor of `index` on `vehicle`'s route.
    fn next_node(&self, vehicle: usize, index: RoutingIndex) -> Option<RoutingIndex>;

    /// Cumulative value of `dimension` at `index`.
    fn cumulative_value(&self, dimension: Dimension, index: RoutingIndex) -> Option<i64>;
}

/// First-solution and improvement strategy requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SearchStrategy {
    /// Stop at the cheapest-arc construction.
    CheapestArc,
    /// Improve the construction with guided local search.
    GuidedLocalSearch {
        /// Upper bound on improvement iterations.
        max_generations: usize,
    },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::GuidedLocalSearch {
            max_generations: 2000,
        }
    }
}

/// Bounds on a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Wall-clock limit; the solver returns before it elapses.
    pub time_limit: Duration,
    /// Search strategy.
    pub strategy: SearchStrategy,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            strategy: SearchStrategy::default(),
        }
    }
}

impl SearchBudget {
    /// Budget with the default strategy and the given wall-clock limit.
    #[must_use]
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit,
            ..Self::default()
        }
    }
}

/// Result of a completed search.
#[derive(Debug)]
pub enum SolveOutcome {
    /// Every stop was assigned.
    Solved(Box<dyn Solution + Send + Sync>),
    /// No assignment satisfying all constraints was found within the budget.
    Infeasible,
}

impl SolveOutcome {
    /// Whether the search found no assignment.
    #[must_use]
    pub const fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible)
    }
}

/// Errors returned by [`Solver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The budget leaves no time to search.
    #[error("search budget must allow a positive time limit")]
    ZeroBudget,
    /// The instance does not fit the engine's numeric range.
    #[error("instance exceeds engine limits: {what}")]
    Unsupported {
        /// Quantity that overflowed.
        what: String,
    },
    /// The engine failed while building or searching.
    #[error("optimisation engine failed: {message}")]
    Engine {
        /// Engine diagnostic.
        message: String,
    },
}

/// Alias for the solver error type.
pub type Error = SolveError;

/// Optimisation engine behind the core.
///
/// Solvers must be `Send + Sync` to operate safely across threads and must
/// return before `budget.time_limit` elapses.
pub trait Solver: Send + Sync {
    /// Search for an assignment of every stop to a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] when the engine cannot run. Infeasibility is an
    /// outcome, not an error.
    fn solve(&self, model: &CostModel<'_>, budget: &SearchBudget) -> Result<SolveOutcome, Error>;
}
