//! Behaviour-driven step definitions driving the solve CLI scenarios.

use super::helpers::{
    ExhaustiveSolverBuilder, two_truck_request, undersized_request, utf8_root, write_request,
    write_utf8,
};
use super::*;
use crate::solve::run_solve_with;
use camino::Utf8PathBuf;
use fleetroute_core::ExportRow;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct SolveWorld {
    _tmp: TempDir,
    request_path: Utf8PathBuf,
    include_request: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl SolveWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let request_path = utf8_root(&tmp).join("request.json");
        Self {
            _tmp: tmp,
            request_path,
            include_request: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["fleetroute".to_owned(), "solve".to_owned()];
        if *self.include_request.borrow() {
            argv.push(self.request_path.as_str().to_owned());
        }
        argv.extend([format!("--{ARG_TIME_LIMIT}"), "5".to_owned()]);
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }

    fn stdout(&self) -> String {
        String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8")
    }
}

#[fixture]
fn world() -> SolveWorld {
    SolveWorld::new()
}

#[given("a two-truck plan request exists on disk")]
fn two_truck_request_exists(#[from(world)] world: &SolveWorld) {
    write_request(&world.request_path, &two_truck_request());
}

#[given("a plan request whose only van is too small exists on disk")]
fn undersized_request_exists(#[from(world)] world: &SolveWorld) {
    write_request(&world.request_path, &undersized_request());
}

#[given("the plan request contains invalid JSON")]
fn request_contains_invalid_json(#[from(world)] world: &SolveWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("I omit the plan request path")]
fn omit_request_path(#[from(world)] world: &SolveWorld) {
    *world.include_request.borrow_mut() = false;
}

#[given("I ask for rows output")]
fn ask_for_rows(#[from(world)] world: &SolveWorld) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_FORMAT}"), "rows".to_owned()]);
}

#[when("I run the solve command")]
fn run_solve_command(#[from(world)] world: &SolveWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Solve(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_solve_with(args, &ExhaustiveSolverBuilder, &mut *buffer)
        }
        Command::FuelReport(_) => panic!("expected solve command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and reports {count} active vehicles")]
fn command_succeeds(#[from(world)] world: &SolveWorld, count: usize) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");
    let stdout = world.stdout();
    assert!(
        stdout.starts_with(&format!("Active vehicles: {count}\n")),
        "{stdout}"
    );
}

#[then("the command prints {count} export rows")]
fn command_prints_rows(#[from(world)] world: &SolveWorld, count: usize) {
    let stdout = world.stdout();
    let rows: Vec<ExportRow> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("export row JSON"))
        .collect();
    assert_eq!(rows.len(), count);
}

#[then("the command fails because the request JSON is invalid")]
fn command_fails_invalid_json(#[from(world)] world: &SolveWorld) {
    match &*world.error() {
        CliError::ParsePlanRequest { .. } => {}
        other => panic!("expected ParsePlanRequest, found {other:?}"),
    }
}

#[then("the command fails with corrective guidance")]
fn command_fails_infeasible(#[from(world)] world: &SolveWorld) {
    match &*world.error() {
        CliError::Infeasible(guidance) => {
            assert!(guidance.to_string().contains("widen the stop time windows"));
        }
        other => panic!("expected Infeasible, found {other:?}"),
    }
    assert!(world.stdout().is_empty());
}

#[then("the command fails because the request path is missing")]
fn command_fails_missing_request_path(#[from(world)] world: &SolveWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_SOLVE_REQUEST),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_solve_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/solve_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: SolveWorld) {
            let _ = world;
        }
    };
}

register_solve_scenario!(solve_happy_path, "planning a request from JSON");
register_solve_scenario!(solve_rows_output, "printing export rows");
register_solve_scenario!(solve_invalid_json, "rejecting invalid JSON input");
register_solve_scenario!(solve_infeasible, "reporting infeasible requests");
register_solve_scenario!(solve_missing_request, "rejecting missing request paths");
