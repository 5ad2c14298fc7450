//! Solve command implementation for the fleetroute CLI.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use fleetroute_core::{
    CapacityPolicy, CostParameters, DEFAULT_SERVICE_TIME, DEFAULT_TIME_LIMIT, PlanOutcome,
    ProblemInstance, ProblemModelBuilder, Report, SearchBudget, Solver, Vehicle, WallClockWindow,
    plan,
};
use jiff::civil::{Date, Time};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{OutputFormat, write_json, write_rows, write_text};
use crate::request::{PlanRequest, load_plan_request};
use crate::{
    ARG_BASE_COST, ARG_CAPACITY_COEFFICIENT, ARG_CAPACITY_POLICY, ARG_DEPOT_CLOSE,
    ARG_DEPOT_OPEN, ARG_FORMAT, ARG_RUN_DATE, ARG_SERVICE_MINUTES, ARG_SOLVE_REQUEST, ARG_STORE,
    ARG_TIME_LIMIT, CliError, ENV_SOLVE_REQUEST, ENV_SOLVE_RUN_DATE, ENV_SOLVE_STORE,
};

/// Capacity rule as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PolicyChoice {
    /// Pickups and deliveries both add load.
    Accumulate,
    /// Demands apply with their sign.
    PickupRelease,
}

impl From<PolicyChoice> for CapacityPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Accumulate => Self::Accumulate,
            PolicyChoice::PickupRelease => Self::PickupRelease,
        }
    }
}

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan capacitated, time-windowed routes for one day. The \
                 request is a JSON file holding the stops (depot first), the \
                 fleet and the distance and duration matrices. With --store \
                 and --run-date the planned run is recorded in the dispatch \
                 history, and an empty fleet is filled with the vehicles \
                 still free on that date.",
    about = "Plan delivery routes for one day"
)]
#[ortho_config(prefix = "FLEETROUTE")]
pub(crate) struct SolveArgs {
    /// Path to a JSON file containing a plan request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Minutes spent servicing each stop (default 20).
    #[arg(long = ARG_SERVICE_MINUTES, value_name = "minutes")]
    #[serde(default)]
    pub(crate) service_minutes: Option<u64>,
    /// Time the depot opens (default 08:00).
    #[arg(long = ARG_DEPOT_OPEN, value_name = "HH:MM")]
    #[serde(default)]
    pub(crate) depot_open: Option<Time>,
    /// Time the depot closes (default 18:00).
    #[arg(long = ARG_DEPOT_CLOSE, value_name = "HH:MM")]
    #[serde(default)]
    pub(crate) depot_close: Option<Time>,
    /// Flat cost of using a vehicle, in kilometre-equivalents (default 20).
    #[arg(long = ARG_BASE_COST, value_name = "km")]
    #[serde(default)]
    pub(crate) base_cost: Option<f64>,
    /// Extra cost per 1000 units of capacity (default 2.0).
    #[arg(long = ARG_CAPACITY_COEFFICIENT, value_name = "km")]
    #[serde(default)]
    pub(crate) capacity_coefficient: Option<f64>,
    /// How pickups count against capacity (default accumulate).
    #[arg(long = ARG_CAPACITY_POLICY, value_enum)]
    #[serde(default)]
    pub(crate) capacity_policy: Option<PolicyChoice>,
    /// Wall-clock search limit in seconds (default 20).
    #[arg(long = ARG_TIME_LIMIT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) time_limit_secs: Option<u64>,
    /// Output format (default text).
    #[arg(long = ARG_FORMAT, value_enum)]
    #[serde(default)]
    pub(crate) format: Option<OutputFormat>,
    /// SQLite dispatch history to record the run in.
    #[arg(long = ARG_STORE, value_name = "path")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Dispatch date of the run (YYYY-MM-DD).
    #[arg(long = ARG_RUN_DATE, value_name = "date")]
    #[serde(default)]
    pub(crate) run_date: Option<Date>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Where and when a planned run is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunRecord {
    /// SQLite dispatch history.
    pub(crate) store: Utf8PathBuf,
    /// Dispatch date.
    pub(crate) date: Date,
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SolveConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Time spent at each stop.
    pub(crate) service_time: Duration,
    /// Fleet operating hours.
    pub(crate) depot_hours: WallClockWindow,
    /// Vehicle activation cost and capacity rule.
    pub(crate) parameters: CostParameters,
    /// Search limits.
    pub(crate) budget: SearchBudget,
    /// Output format.
    pub(crate) format: OutputFormat,
    /// Run history target, when recording.
    pub(crate) record: Option<RunRecord>,
}

impl SolveConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_SOLVE_REQUEST)
    }
}

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match crate::fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_SOLVE_REQUEST,
            env: ENV_SOLVE_REQUEST,
        })?;

        let service_time = args.service_minutes.map_or(DEFAULT_SERVICE_TIME, |minutes| {
            Duration::from_secs(minutes.saturating_mul(60))
        });
        let default_hours = WallClockWindow::default();
        let depot_hours = WallClockWindow::new(
            args.depot_open.unwrap_or(default_hours.start),
            args.depot_close.unwrap_or(default_hours.end),
        );

        let time_limit = args
            .time_limit_secs
            .map_or(DEFAULT_TIME_LIMIT, Duration::from_secs);
        if time_limit.is_zero() {
            return Err(CliError::InvalidOption {
                field: ARG_TIME_LIMIT,
                reason: "the search needs at least one second".to_owned(),
            });
        }

        let defaults = CostParameters::default();
        let parameters = CostParameters {
            base_cost: args.base_cost.unwrap_or(defaults.base_cost),
            capacity_coefficient: args
                .capacity_coefficient
                .unwrap_or(defaults.capacity_coefficient),
            capacity_policy: args
                .capacity_policy
                .map_or(defaults.capacity_policy, CapacityPolicy::from),
        };

        let record = match (args.store, args.run_date) {
            (Some(store), Some(date)) => Some(RunRecord { store, date }),
            (Some(_), None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_RUN_DATE,
                    env: ENV_SOLVE_RUN_DATE,
                });
            }
            (None, Some(_)) => {
                return Err(CliError::MissingArgument {
                    field: ARG_STORE,
                    env: ENV_SOLVE_STORE,
                });
            }
            (None, None) => None,
        };

        Ok(Self {
            request_path,
            service_time,
            depot_hours,
            parameters,
            budget: SearchBudget::with_time_limit(time_limit),
            format: args.format.unwrap_or_default(),
            record,
        })
    }
}

/// Builds a solver instance for the current solve invocation.
pub(crate) trait SolverBuilder {
    fn build(&self, config: &SolveConfig) -> Result<Box<dyn Solver>, CliError>;
}

pub(crate) struct DefaultSolverBuilder;

impl SolverBuilder for DefaultSolverBuilder {
    #[cfg(feature = "solver-vrp")]
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Ok(Box::new(fleetroute_solver_vrp::VrpSolver::new()))
    }

    #[cfg(not(feature = "solver-vrp"))]
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Err(CliError::MissingFeature {
            feature: "solver-vrp",
            action: "solving",
        })
    }
}

/// A run recorded in the dispatch history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SavedRun {
    /// Run identifier.
    pub(crate) id: i64,
    /// Dispatch date.
    pub(crate) date: Date,
}

#[derive(Debug, Serialize)]
struct SolveOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<SavedRun>,
    report: &'a Report,
}

pub(crate) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_solve_with(args, &DefaultSolverBuilder, &mut stdout)
}

pub(crate) fn run_solve_with(
    args: SolveArgs,
    builder: &dyn SolverBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_solve_config(args)?;
    let request = load_plan_request(&config.request_path)?;
    let instance = build_instance(&config, &request)?;
    let solver = builder.build(&config)?;
    let report = match plan(&instance, config.parameters, solver.as_ref(), &config.budget)? {
        PlanOutcome::Planned(report) => report,
        PlanOutcome::Infeasible(guidance) => return Err(CliError::Infeasible(guidance)),
    };
    let saved = config
        .record
        .as_ref()
        .map(|record| record_run(record, &request, &report))
        .transpose()?;
    write_report(writer, config.format, &report, saved)
}

fn resolve_solve_config(args: SolveArgs) -> Result<SolveConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn build_instance(config: &SolveConfig, request: &PlanRequest) -> Result<ProblemInstance, CliError> {
    let vehicles = if request.vehicles.is_empty() {
        config
            .record
            .as_ref()
            .map_or_else(|| Ok(Vec::new()), available_vehicles)?
    } else {
        request.vehicles.clone()
    };
    ProblemModelBuilder::new(config.depot_hours)
        .stops(request.stops.clone())
        .vehicles(vehicles)
        .distance_matrix(request.distances.clone())
        .duration_matrix(request.durations.clone())
        .service_time(config.service_time)
        .build()
        .map_err(|source| CliError::InvalidPlanRequest {
            path: config.request_path.clone(),
            source,
        })
}

fn write_report(
    writer: &mut dyn Write,
    format: OutputFormat,
    report: &Report,
    saved: Option<SavedRun>,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            write_text(writer, &report.to_string())?;
            saved.map_or(Ok(()), |run| {
                write_text(
                    writer,
                    &format!("\nSaved run #{} for {}\n", run.id, run.date),
                )
            })
        }
        OutputFormat::Json => write_json(
            writer,
            &SolveOutput {
                run: saved,
                report,
            },
        ),
        OutputFormat::Rows => write_rows(writer, &report.rows()),
    }
}

#[cfg(feature = "store-sqlite")]
fn open_store(path: &Utf8Path) -> Result<fleetroute_store::RunStore, CliError> {
    crate::fs::create_store_parent(path).map_err(|source| CliError::PrepareStoreDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(fleetroute_store::RunStore::open(path)?)
}

#[cfg(feature = "store-sqlite")]
fn available_vehicles(record: &RunRecord) -> Result<Vec<Vehicle>, CliError> {
    let store = open_store(&record.store)?;
    let vehicles = store.available_vehicles(record.date)?;
    info!("{} vehicles are free on {}", vehicles.len(), record.date);
    Ok(vehicles)
}

#[cfg(feature = "store-sqlite")]
fn record_run(
    record: &RunRecord,
    request: &PlanRequest,
    report: &Report,
) -> Result<SavedRun, CliError> {
    use fleetroute_store::RunRequest;

    let mut store = open_store(&record.store)?;
    let run = store.create_run(record.date)?;
    let customers: Vec<RunRequest> = request.stops.iter().skip(1).map(RunRequest::from).collect();
    store.save_requests(run, &customers)?;
    let fuel = store.save_report(run, report)?;
    for stop in request.stops.iter().filter(|stop| !stop.address.is_empty()) {
        store.save_location(&stop.name, &stop.address)?;
    }
    info!("recorded run {run} for {} using {fuel:.2} l", record.date);
    Ok(SavedRun {
        id: run.get(),
        date: record.date,
    })
}

#[cfg(not(feature = "store-sqlite"))]
const fn missing_store() -> CliError {
    CliError::MissingFeature {
        feature: "store-sqlite",
        action: "recording runs",
    }
}

#[cfg(not(feature = "store-sqlite"))]
fn available_vehicles(_record: &RunRecord) -> Result<Vec<Vehicle>, CliError> {
    Err(missing_store())
}

#[cfg(not(feature = "store-sqlite"))]
fn record_run(
    _record: &RunRecord,
    _request: &PlanRequest,
    _report: &Report,
) -> Result<SavedRun, CliError> {
    Err(missing_store())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
