//! `RunStore`: the run history session.

use std::fmt;
use std::path::Path;

use fleetroute_core::{ExportRow, LocationKind, Report, Vehicle, WallClockWindow};
use jiff::civil::{Date, Time};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::records::{
    FuelReportRow, RunDetails, RunId, RunRequest, RunStatus, RunSummary, SavedLocation,
};
use crate::schema::initialise_schema;

/// Session over one run history database.
///
/// Every operation runs against the wrapped connection; multi-statement
/// writes run inside a transaction.
pub struct RunStore {
    connection: Connection,
}

impl fmt::Debug for RunStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

type RawSummary = (i64, String, String, Option<f64>, Option<f64>);
type RawRequest = (String, String, i64, String, String, String);

fn raw_summary(row: &Row<'_>) -> rusqlite::Result<RawSummary> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn invalid(column: &'static str, value: &str) -> StoreError {
    StoreError::InvalidColumn {
        column,
        value: value.to_owned(),
    }
}

fn parse_date(text: &str) -> Result<Date, StoreError> {
    text.parse().map_err(|_| invalid("runs.run_date", text))
}

fn parse_time(column: &'static str, text: &str) -> Result<Time, StoreError> {
    text.parse().map_err(|_| invalid(column, text))
}

fn parse_kind(text: &str) -> Result<LocationKind, StoreError> {
    match text {
        "delivery" => Ok(LocationKind::Delivery),
        "pickup" => Ok(LocationKind::Pickup),
        "depot" => Ok(LocationKind::Depot),
        other => Err(invalid("run_requests.kind", other)),
    }
}

fn summary_from_raw(raw: RawSummary) -> Result<RunSummary, StoreError> {
    let (id, date, status, total_distance_km, total_fuel_litres) = raw;
    Ok(RunSummary {
        id: RunId::new(id),
        date: parse_date(&date)?,
        status: status
            .parse()
            .map_err(|value: String| invalid("runs.status", &value))?,
        total_distance_km,
        total_fuel_litres,
    })
}

fn request_from_raw(raw: RawRequest) -> Result<RunRequest, StoreError> {
    let (name, address, weight, time_from, time_to, kind) = raw;
    Ok(RunRequest {
        name,
        address,
        weight,
        window: WallClockWindow::new(
            parse_time("run_requests.time_from", &time_from)?,
            parse_time("run_requests.time_to", &time_to)?,
        ),
        kind: parse_kind(&kind)?,
    })
}

fn vehicle_id(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| invalid("vehicles.id", &raw.to_string()))
}

impl RunStore {
    /// Open (or create) the database at `path` and initialise its schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OpenDatabase`] when SQLite cannot open the file,
    /// or a migration error when the schema cannot be prepared.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let location = path.as_ref();
        let connection = Connection::open(location).map_err(|source| StoreError::OpenDatabase {
            path: location.to_path_buf(),
            source,
        })?;
        debug!("opened run store at {}", location.display());
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns a migration error when the schema cannot be prepared.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| StoreError::OpenDatabase {
                path: ":memory:".into(),
                source,
            })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self { connection })
    }

    /// Register a vehicle and return it with its new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateVehicle`] when the name is taken.
    pub fn add_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, StoreError> {
        let taken = self
            .connection
            .query_row(
                "SELECT 1 FROM vehicles WHERE name = ?1 LIMIT 1",
                [vehicle.name.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "look up vehicle name",
                source,
            })?;
        if taken.is_some() {
            return Err(StoreError::DuplicateVehicle {
                name: vehicle.name.clone(),
            });
        }
        self.connection
            .execute(
                "INSERT INTO vehicles (name, capacity, fuel_rate) VALUES (?1, ?2, ?3)",
                (vehicle.name.as_str(), vehicle.capacity, vehicle.fuel_rate),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "insert vehicle",
                source,
            })?;
        let id = vehicle_id(self.connection.last_insert_rowid())?;
        info!("registered vehicle '{}' as {id}", vehicle.name);
        Ok(Vehicle {
            id,
            ..vehicle.clone()
        })
    }

    /// Every registered vehicle, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT id, name, capacity, fuel_rate FROM vehicles ORDER BY name")
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare vehicle listing",
                source,
            })?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .and_then(Iterator::collect::<Result<Vec<_>, _>>)
            .map_err(|source| StoreError::Sqlite {
                operation: "list vehicles",
                source,
            })?;
        rows.into_iter()
            .map(|(id, name, capacity, fuel_rate)| {
                Ok(Vehicle {
                    id: vehicle_id(id)?,
                    name,
                    capacity,
                    fuel_rate,
                })
            })
            .collect()
    }

    /// Remove a vehicle from the registry; returns whether it existed.
    ///
    /// Stored routes keep the vehicle's name and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfRange`] for identifiers SQLite cannot hold.
    pub fn delete_vehicle(&self, id: u64) -> Result<bool, StoreError> {
        let raw = i64::try_from(id).map_err(|_| StoreError::OutOfRange {
            what: "vehicle id",
            value: id,
        })?;
        let removed = self
            .connection
            .execute("DELETE FROM vehicles WHERE id = ?1", [raw])
            .map_err(|source| StoreError::Sqlite {
                operation: "delete vehicle",
                source,
            })?;
        Ok(removed > 0)
    }

    /// Remember an address; saving a known address again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the insert fails.
    pub fn save_location(&self, name: &str, address: &str) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR IGNORE INTO locations (name, address) VALUES (?1, ?2)",
                (name, address),
            )
            .map(|_| ())
            .map_err(|source| StoreError::Sqlite {
                operation: "save location",
                source,
            })
    }

    /// Saved addresses ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn list_locations(&self) -> Result<Vec<SavedLocation>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT name, address FROM locations ORDER BY name, address")
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare location listing",
                source,
            })?;
        let locations = statement
            .query_map([], |row| {
                Ok(SavedLocation {
                    name: row.get(0)?,
                    address: row.get(1)?,
                })
            })
            .and_then(Iterator::collect)
            .map_err(|source| StoreError::Sqlite {
                operation: "list locations",
                source,
            })?;
        Ok(locations)
    }

    /// Open a new planned run for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the insert fails.
    pub fn create_run(&self, date: Date) -> Result<RunId, StoreError> {
        self.connection
            .execute(
                "INSERT INTO runs (run_date, status) VALUES (?1, ?2)",
                (date.to_string(), RunStatus::Planned.as_str()),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "create run",
                source,
            })?;
        let id = RunId::new(self.connection.last_insert_rowid());
        info!("created run {id} for {date}");
        Ok(id)
    }

    /// Record the customer requests of `run`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownRun`] for a missing run; nothing is
    /// written when any insert fails.
    pub fn save_requests(&mut self, run: RunId, requests: &[RunRequest]) -> Result<(), StoreError> {
        self.summary(run)?;
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin request transaction",
                source,
            })?;
        {
            let mut insert = transaction
                .prepare_cached(
                    "INSERT INTO run_requests (
                        run_id, name, address, weight, time_from, time_to, kind
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare insert request",
                    source,
                })?;
            for request in requests {
                insert
                    .execute((
                        run.get(),
                        request.name.as_str(),
                        request.address.as_str(),
                        request.weight,
                        request.window.start.to_string(),
                        request.window.end.to_string(),
                        request.kind.to_string(),
                    ))
                    .map_err(|source| StoreError::Sqlite {
                        operation: "insert request",
                        source,
                    })?;
            }
        }
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit requests",
            source,
        })?;
        debug!("saved {} requests for run {run}", requests.len());
        Ok(())
    }

    /// Store the planned routes of `run` and its totals; returns total fuel.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownRun`] for a missing run; nothing is
    /// written when any statement fails.
    pub fn save_report(&mut self, run: RunId, report: &Report) -> Result<f64, StoreError> {
        self.summary(run)?;
        let rows = report.rows();
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin route transaction",
                source,
            })?;
        let mut total_fuel = 0.0;
        {
            let mut insert = transaction
                .prepare_cached(
                    "INSERT INTO vehicle_routes (
                        run_id, vehicle_name, vehicle_capacity, route_text,
                        distance_km, load, fuel_litres
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare insert route",
                    source,
                })?;
            for row in &rows {
                insert
                    .execute((
                        run.get(),
                        row.vehicle_name.as_str(),
                        row.vehicle_capacity,
                        row.route_text.as_str(),
                        row.distance_km,
                        row.load,
                        row.fuel_litres,
                    ))
                    .map_err(|source| StoreError::Sqlite {
                        operation: "insert route",
                        source,
                    })?;
                total_fuel = accumulate(total_fuel, row.fuel_litres);
            }
        }
        transaction
            .execute(
                "UPDATE runs SET total_distance_km = ?1, total_fuel_litres = ?2 WHERE id = ?3",
                (report.total_distance_km(), total_fuel, run.get()),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "update run totals",
                source,
            })?;
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit routes",
            source,
        })?;
        info!(
            "saved {} routes for run {run} using {total_fuel:.2} l",
            rows.len()
        );
        Ok(total_fuel)
    }

    /// Run history, newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails and
    /// [`StoreError::InvalidColumn`] for unreadable rows.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT id, run_date, status, total_distance_km, total_fuel_litres
                 FROM runs ORDER BY run_date DESC, id DESC",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare run listing",
                source,
            })?;
        let raw = statement
            .query_map([], raw_summary)
            .and_then(Iterator::collect::<Result<Vec<_>, _>>)
            .map_err(|source| StoreError::Sqlite {
                operation: "list runs",
                source,
            })?;
        raw.into_iter().map(summary_from_raw).collect()
    }

    fn summary(&self, run: RunId) -> Result<RunSummary, StoreError> {
        let raw = self
            .connection
            .query_row(
                "SELECT id, run_date, status, total_distance_km, total_fuel_litres
                 FROM runs WHERE id = ?1",
                [run.get()],
                raw_summary,
            )
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "read run",
                source,
            })?
            .ok_or(StoreError::UnknownRun { id: run })?;
        summary_from_raw(raw)
    }

    /// Header, requests and routes of `run`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownRun`] for a missing run.
    pub fn run_details(&self, run: RunId) -> Result<RunDetails, StoreError> {
        let summary = self.summary(run)?;

        let mut request_statement = self
            .connection
            .prepare_cached(
                "SELECT name, address, weight, time_from, time_to, kind
                 FROM run_requests WHERE run_id = ?1 ORDER BY id",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare request listing",
                source,
            })?;
        let raw_requests = request_statement
            .query_map([run.get()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .and_then(Iterator::collect::<Result<Vec<RawRequest>, _>>)
            .map_err(|source| StoreError::Sqlite {
                operation: "list requests",
                source,
            })?;

        let mut route_statement = self
            .connection
            .prepare_cached(
                "SELECT vehicle_name, vehicle_capacity, route_text, distance_km, load, fuel_litres
                 FROM vehicle_routes WHERE run_id = ?1 ORDER BY id",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare route listing",
                source,
            })?;
        let routes = route_statement
            .query_map([run.get()], |row| {
                Ok(ExportRow {
                    vehicle_name: row.get(0)?,
                    vehicle_capacity: row.get(1)?,
                    route_text: row.get(2)?,
                    distance_km: row.get(3)?,
                    load: row.get(4)?,
                    fuel_litres: row.get(5)?,
                })
            })
            .and_then(Iterator::collect)
            .map_err(|source| StoreError::Sqlite {
                operation: "list routes",
                source,
            })?;

        Ok(RunDetails {
            summary,
            requests: raw_requests
                .into_iter()
                .map(request_from_raw)
                .collect::<Result<_, _>>()?,
            routes,
        })
    }

    /// Move `run` to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] unless the run moves one
    /// step forward, and [`StoreError::UnknownRun`] for a missing run.
    pub fn update_status(&self, run: RunId, status: RunStatus) -> Result<(), StoreError> {
        let current = self.summary(run)?.status;
        if !current.can_advance_to(status) {
            return Err(StoreError::InvalidTransition {
                id: run,
                from: current,
                to: status,
            });
        }
        self.connection
            .execute(
                "UPDATE runs SET status = ?1 WHERE id = ?2",
                (status.as_str(), run.get()),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "update run status",
                source,
            })?;
        info!("run {run} is now {status}");
        Ok(())
    }

    /// Delete `run` with its requests and routes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownRun`] for a missing run; nothing is
    /// removed when any statement fails.
    pub fn delete_run(&mut self, run: RunId) -> Result<(), StoreError> {
        self.summary(run)?;
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin delete transaction",
                source,
            })?;
        for (operation, sql) in [
            ("delete routes", "DELETE FROM vehicle_routes WHERE run_id = ?1"),
            ("delete requests", "DELETE FROM run_requests WHERE run_id = ?1"),
            ("delete run", "DELETE FROM runs WHERE id = ?1"),
        ] {
            transaction
                .execute(sql, [run.get()])
                .map_err(|source| StoreError::Sqlite { operation, source })?;
        }
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit delete",
            source,
        })?;
        info!("deleted run {run}");
        Ok(())
    }

    /// Names of vehicles already routed on planned or in-progress runs on
    /// `date`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn assigned_vehicles(&self, date: Date) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT DISTINCT vr.vehicle_name
                 FROM vehicle_routes vr JOIN runs r ON vr.run_id = r.id
                 WHERE r.run_date = ?1 AND r.status IN (?2, ?3)
                 ORDER BY vr.vehicle_name",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare assigned vehicle lookup",
                source,
            })?;
        let names = statement
            .query_map(
                (
                    date.to_string(),
                    RunStatus::Planned.as_str(),
                    RunStatus::InProgress.as_str(),
                ),
                |row| row.get(0),
            )
            .and_then(Iterator::collect)
            .map_err(|source| StoreError::Sqlite {
                operation: "list assigned vehicles",
                source,
            })?;
        Ok(names)
    }

    /// Registered vehicles not assigned on `date`, ordered by name.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::list_vehicles`] and
    /// [`Self::assigned_vehicles`].
    pub fn available_vehicles(&self, date: Date) -> Result<Vec<Vehicle>, StoreError> {
        let assigned = self.assigned_vehicles(date)?;
        let mut vehicles = self.list_vehicles()?;
        vehicles.retain(|vehicle| !assigned.contains(&vehicle.name));
        Ok(vehicles)
    }

    /// Fuel and distance per vehicle over completed runs dated within
    /// `from..=to`, most fuel first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn fuel_report(&self, from: Date, to: Date) -> Result<Vec<FuelReportRow>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT vr.vehicle_name,
                        SUM(vr.fuel_litres) AS total_fuel,
                        SUM(vr.distance_km) AS total_distance
                 FROM vehicle_routes vr JOIN runs r ON vr.run_id = r.id
                 WHERE r.run_date BETWEEN ?1 AND ?2 AND r.status = ?3
                 GROUP BY vr.vehicle_name
                 ORDER BY total_fuel DESC, vr.vehicle_name",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare fuel report",
                source,
            })?;
        let rows = statement
            .query_map(
                (
                    from.to_string(),
                    to.to_string(),
                    RunStatus::Completed.as_str(),
                ),
                |row| {
                    Ok(FuelReportRow {
                        vehicle_name: row.get(0)?,
                        total_fuel_litres: row.get(1)?,
                        total_distance_km: row.get(2)?,
                    })
                },
            )
            .and_then(Iterator::collect)
            .map_err(|source| StoreError::Sqlite {
                operation: "build fuel report",
                source,
            })?;
        Ok(rows)
    }
}

#[expect(clippy::float_arithmetic, reason = "fuel totals are fractional litres")]
fn accumulate(total: f64, litres: f64) -> f64 {
    total + litres
}
