//! Errors raised by the run store.

use std::path::PathBuf;

use rusqlite::Error as SqliteError;
use thiserror::Error;

use crate::records::{RunId, RunStatus};

/// Errors returned by [`RunStore`](crate::RunStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A migration step failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step being applied.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by an incompatible release.
    #[error(
        "expected fleetroute schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this release understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// A query or statement failed.
    #[error("failed to {operation}: {source}")]
    Sqlite {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A vehicle with the same name is already registered.
    #[error("vehicle '{name}' already exists")]
    DuplicateVehicle {
        /// Rejected name.
        name: String,
    },
    /// No run has the given identifier.
    #[error("run {id} does not exist")]
    UnknownRun {
        /// Missing run.
        id: RunId,
    },
    /// Runs only move forward from planned to in progress to completed.
    #[error("run {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Run being updated.
        id: RunId,
        /// Current status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },
    /// A stored value could not be read back into its typed form.
    #[error("stored {column} value '{value}' is invalid")]
    InvalidColumn {
        /// Column holding the value.
        column: &'static str,
        /// Raw stored text.
        value: String,
    },
    /// A value does not fit SQLite's signed 64-bit integers.
    #[error("{what} {value} exceeds the storable range")]
    OutOfRange {
        /// Quantity being stored.
        what: &'static str,
        /// Rejected value.
        value: u64,
    },
}
