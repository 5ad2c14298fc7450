//! Metaheuristic solver for fleetroute backed by `vrp-core`.
//!
//! [`VrpSolver`] implements [`Solver`](fleetroute_core::Solver). It translates
//! a [`CostModel`](fleetroute_core::CostModel) into a capacitated, time
//! windowed `vrp-core` problem, runs the evolutionary search within the
//! requested budget, and re-validates the resulting tours against the core
//! model before handing them back as an
//! [`Assignment`](fleetroute_core::Assignment).

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod solver;
mod vrp;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use solver::{VrpSolver, VrpSolverConfig};
