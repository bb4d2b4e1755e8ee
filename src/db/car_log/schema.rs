use rusqlite::Row;
use std::sync::OnceLock;
use time::{Date, OffsetDateTime};

pub const TABLE_NAME: &str = "car_log";
pub const STOP_TABLE_NAME: &str = "car_log_stop";

pub enum Columns {
    Id,
    DriverId,
    Timestamp,
    TripDate,
    Issues,
    CreatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::DriverId => "driver_id",
            Columns::Timestamp => "timestamp",
            Columns::TripDate => "trip_date",
            Columns::Issues => "issues",
            Columns::CreatedAt => "created_at",
        }
    }
}

pub enum StopColumns {
    Id,
    CarLogId,
    MachineId,
    Position,
}

impl StopColumns {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopColumns::Id => "id",
            StopColumns::CarLogId => "car_log_id",
            StopColumns::MachineId => "machine_id",
            StopColumns::Position => "position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarLog {
    pub id: i64,
    pub driver_id: Option<i64>,
    pub timestamp: OffsetDateTime,
    pub trip_date: Option<Date>,
    pub issues: String,
    pub created_at: OffsetDateTime,
}

impl CarLog {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::DriverId,
                Columns::Timestamp,
                Columns::TripDate,
                Columns::Issues,
                Columns::CreatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<CarLog> {
        |row| {
            Ok(CarLog {
                id: row.get(Columns::Id.as_str())?,
                driver_id: row.get(Columns::DriverId.as_str())?,
                timestamp: row.get(Columns::Timestamp.as_str())?,
                trip_date: row.get(Columns::TripDate.as_str())?,
                issues: row.get(Columns::Issues.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
            })
        }
    }
}

/// One machine on a driver's route, in visiting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarLogStop {
    pub id: i64,
    pub car_log_id: i64,
    pub machine_id: i64,
    pub position: i64,
}

impl CarLogStop {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                StopColumns::Id,
                StopColumns::CarLogId,
                StopColumns::MachineId,
                StopColumns::Position,
            ]
            .iter()
            .map(StopColumns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<CarLogStop> {
        |row| {
            Ok(CarLogStop {
                id: row.get(StopColumns::Id.as_str())?,
                car_log_id: row.get(StopColumns::CarLogId.as_str())?,
                machine_id: row.get(StopColumns::MachineId.as_str())?,
                position: row.get(StopColumns::Position.as_str())?,
            })
        }
    }
}

// A stop joined with its trip, as shown on the daily summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripStop {
    pub car_log_id: i64,
    pub machine_id: i64,
    pub position: i64,
    pub driver_name: Option<String>,
    pub issues: String,
}
