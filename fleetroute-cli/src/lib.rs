//! Command-line interface for planning delivery runs with fleetroute.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod fuel_report;
mod output;
mod request;
mod solve;

pub use error::CliError;

use fuel_report::{FuelReportArgs, run_fuel_report};
use solve::{SolveArgs, run_solve};

pub(crate) const ARG_SOLVE_REQUEST: &str = "request";
pub(crate) const ARG_SERVICE_MINUTES: &str = "service-minutes";
pub(crate) const ARG_DEPOT_OPEN: &str = "depot-open";
pub(crate) const ARG_DEPOT_CLOSE: &str = "depot-close";
pub(crate) const ARG_BASE_COST: &str = "base-cost";
pub(crate) const ARG_CAPACITY_COEFFICIENT: &str = "capacity-coefficient";
pub(crate) const ARG_CAPACITY_POLICY: &str = "capacity-policy";
pub(crate) const ARG_TIME_LIMIT: &str = "time-limit-secs";
pub(crate) const ARG_FORMAT: &str = "format";
pub(crate) const ARG_STORE: &str = "store";
pub(crate) const ARG_RUN_DATE: &str = "run-date";
pub(crate) const ARG_FROM: &str = "from";
pub(crate) const ARG_TO: &str = "to";

pub(crate) const ENV_SOLVE_REQUEST: &str = "FLEETROUTE_CMDS_SOLVE_REQUEST_PATH";
pub(crate) const ENV_SOLVE_STORE: &str = "FLEETROUTE_CMDS_SOLVE_STORE";
pub(crate) const ENV_SOLVE_RUN_DATE: &str = "FLEETROUTE_CMDS_SOLVE_RUN_DATE";
pub(crate) const ENV_FUEL_REPORT_STORE: &str = "FLEETROUTE_CMDS_FUEL_REPORT_STORE";
pub(crate) const ENV_FUEL_REPORT_FROM: &str = "FLEETROUTE_CMDS_FUEL_REPORT_FROM";
pub(crate) const ENV_FUEL_REPORT_TO: &str = "FLEETROUTE_CMDS_FUEL_REPORT_TO";

/// Run the fleetroute CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// request cannot be planned, or output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    match cli.command {
        Command::Solve(args) => run_solve(args),
        Command::FuelReport(args) => run_fuel_report(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "fleetroute",
    about = "Plan capacitated delivery routes and keep a dispatch history",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Plan routes for one day from a JSON request.
    Solve(SolveArgs),
    /// Summarise fuel used by completed runs.
    FuelReport(FuelReportArgs),
}

#[cfg(test)]
mod tests;
