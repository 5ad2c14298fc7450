//! Fuel report command for the fleetroute CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use jiff::civil::Date;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;
use crate::solve::require_existing;
use crate::{
    ARG_FORMAT, ARG_FROM, ARG_STORE, ARG_TO, CliError, ENV_FUEL_REPORT_FROM,
    ENV_FUEL_REPORT_STORE, ENV_FUEL_REPORT_TO,
};

/// CLI arguments for the `fuel-report` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Summarise fuel and distance per vehicle over completed runs \
                 dated within an inclusive range. Planned and in-progress runs \
                 are left out.",
    about = "Summarise fuel used by completed runs"
)]
#[ortho_config(prefix = "FLEETROUTE")]
pub(crate) struct FuelReportArgs {
    /// SQLite dispatch history to read.
    #[arg(long = ARG_STORE, value_name = "path")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// First dispatch date included (YYYY-MM-DD).
    #[arg(long = ARG_FROM, value_name = "date")]
    #[serde(default)]
    pub(crate) from: Option<Date>,
    /// Last dispatch date included (YYYY-MM-DD).
    #[arg(long = ARG_TO, value_name = "date")]
    #[serde(default)]
    pub(crate) to: Option<Date>,
    /// Output format (default text).
    #[arg(long = ARG_FORMAT, value_enum)]
    #[serde(default)]
    pub(crate) format: Option<OutputFormat>,
}

impl FuelReportArgs {
    pub(crate) fn into_config(self) -> Result<FuelReportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FuelReportConfig::try_from(merged)
    }
}

/// Resolved `fuel-report` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FuelReportConfig {
    pub(crate) store: Utf8PathBuf,
    pub(crate) from: Date,
    pub(crate) to: Date,
    pub(crate) format: OutputFormat,
}

impl TryFrom<FuelReportArgs> for FuelReportConfig {
    type Error = CliError;

    fn try_from(args: FuelReportArgs) -> Result<Self, Self::Error> {
        let store = args.store.ok_or(CliError::MissingArgument {
            field: ARG_STORE,
            env: ENV_FUEL_REPORT_STORE,
        })?;
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_FROM,
            env: ENV_FUEL_REPORT_FROM,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_TO,
            env: ENV_FUEL_REPORT_TO,
        })?;
        if from > to {
            return Err(CliError::InvalidOption {
                field: ARG_FROM,
                reason: format!("{from} is after {to}"),
            });
        }
        Ok(Self {
            store,
            from,
            to,
            format: args.format.unwrap_or_default(),
        })
    }
}

pub(crate) fn run_fuel_report(args: FuelReportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_fuel_report_with(args, &mut stdout)
}

#[cfg(feature = "store-sqlite")]
pub(crate) fn run_fuel_report_with(
    args: FuelReportArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    use fleetroute_store::RunStore;

    let config = args.into_config()?;
    // Opening a missing file would create an empty history.
    require_existing(&config.store, ARG_STORE)?;
    let store = RunStore::open(&config.store)?;
    let rows = store.fuel_report(config.from, config.to)?;
    log::info!(
        "fuel report {}..={} covers {} vehicles",
        config.from,
        config.to,
        rows.len()
    );
    rendering::write_fuel_report(writer, &config, &rows)
}

#[cfg(not(feature = "store-sqlite"))]
pub(crate) fn run_fuel_report_with(
    args: FuelReportArgs,
    _writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.store, ARG_STORE)?;
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "fuel reports",
    })
}

#[cfg(feature = "store-sqlite")]
mod rendering {
    use std::io::Write;

    use fleetroute_store::FuelReportRow;

    use super::FuelReportConfig;
    use crate::CliError;
    use crate::output::{OutputFormat, write_json, write_rows, write_text};

    pub(super) fn write_fuel_report(
        writer: &mut dyn Write,
        config: &FuelReportConfig,
        rows: &[FuelReportRow],
    ) -> Result<(), CliError> {
        match config.format {
            OutputFormat::Text => write_text(writer, &render_text(config, rows)),
            OutputFormat::Json => write_json(writer, rows),
            OutputFormat::Rows => write_rows(writer, rows),
        }
    }

    fn render_text(config: &FuelReportConfig, rows: &[FuelReportRow]) -> String {
        if rows.is_empty() {
            return format!(
                "No completed runs between {} and {}\n",
                config.from, config.to
            );
        }
        let total_fuel: f64 = rows.iter().map(|row| row.total_fuel_litres).sum();
        let total_distance: f64 = rows.iter().map(|row| row.total_distance_km).sum();
        let mut text = format!(
            "Fuel report {} to {}\nTotal fuel: {total_fuel:.2} l\nTotal distance: {total_distance:.2} km\n",
            config.from, config.to
        );
        for row in rows {
            text.push_str(&format!(
                "  - {}: {:.2} l over {:.2} km\n",
                row.vehicle_name, row.total_fuel_litres, row.total_distance_km
            ));
        }
        text
    }
}
