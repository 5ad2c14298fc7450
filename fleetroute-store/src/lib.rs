//! SQLite persistence for fleetroute dispatch runs.
//!
//! [`RunStore`] is an explicit session over one `rusqlite` connection. It
//! keeps the vehicle registry, a saved-address book, and the history of runs
//! with their requests, planned routes and fuel totals.
//!
//! The module is split into focused submodules:
//! - `schema` materialises the tables and checks the schema version.
//! - `records` holds the typed rows returned to callers.
//! - `store` implements the operations.

#![forbid(unsafe_code)]

mod error;
mod records;
mod schema;
mod store;

pub use error::StoreError;
pub use records::{
    FuelReportRow, RunDetails, RunId, RunRequest, RunStatus, RunSummary, SavedLocation,
};
pub use schema::SCHEMA_VERSION;
pub use store::RunStore;
