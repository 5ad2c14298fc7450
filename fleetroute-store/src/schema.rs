//! Schema for the run history database.

use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::error::StoreError;

/// Schema version written by this release.
pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the run history schema inside an open SQLite database.
///
/// Enables foreign keys, creates the tables and indexes, and records the
/// schema version. Databases stamped with another version are rejected so
/// migrations can be applied explicitly.
pub(crate) fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::Migration {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_registry_tables(&transaction)?;
    create_run_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_registry_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create locations",
        "CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            address TEXT NOT NULL UNIQUE
        )",
    )?;
    run_migration_step(
        transaction,
        "create vehicles",
        "CREATE TABLE IF NOT EXISTS vehicles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
            capacity INTEGER NOT NULL CHECK (capacity > 0),
            fuel_rate REAL NOT NULL DEFAULT 10.0
        )",
    )
}

fn create_run_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create runs",
        "CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'planned'
                CHECK (status IN ('planned', 'in_progress', 'completed')),
            total_distance_km REAL,
            total_fuel_litres REAL
        )",
    )?;
    run_migration_step(
        transaction,
        "create run_requests",
        "CREATE TABLE IF NOT EXISTS run_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            weight INTEGER NOT NULL,
            time_from TEXT NOT NULL,
            time_to TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'delivery',
            FOREIGN KEY (run_id) REFERENCES runs(id)
        )",
    )?;
    run_migration_step(
        transaction,
        "create vehicle_routes",
        "CREATE TABLE IF NOT EXISTS vehicle_routes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL,
            vehicle_name TEXT NOT NULL,
            vehicle_capacity INTEGER NOT NULL,
            route_text TEXT NOT NULL,
            distance_km REAL NOT NULL,
            load INTEGER NOT NULL,
            fuel_litres REAL NOT NULL,
            FOREIGN KEY (run_id) REFERENCES runs(id)
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index runs by date",
        "CREATE INDEX IF NOT EXISTS idx_runs_date_status ON runs(run_date, status)",
    )?;
    run_migration_step(
        transaction,
        "index vehicle_routes by run",
        "CREATE INDEX IF NOT EXISTS idx_vehicle_routes_run
            ON vehicle_routes(run_id, vehicle_name)",
    )?;
    run_migration_step(
        transaction,
        "index run_requests by run",
        "CREATE INDEX IF NOT EXISTS idx_run_requests_run ON run_requests(run_id)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS fleetroute_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM fleetroute_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(StoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO fleetroute_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Migration { step, source })
}
