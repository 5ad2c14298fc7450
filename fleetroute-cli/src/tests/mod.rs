//! Shared test harness modules for the fleetroute CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod fs_unit;
mod helpers;
mod solve_steps;
