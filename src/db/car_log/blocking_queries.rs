use super::schema::{self, CarLog, CarLogStop, Columns, StopColumns, TripStop};
use crate::{db, Result};
use rusqlite::{named_params, params, Connection};
use time::{Date, OffsetDateTime};

pub fn insert(
    driver_id: Option<i64>,
    timestamp: OffsetDateTime,
    trip_date: Option<Date>,
    issues: &str,
    conn: &Connection,
) -> Result<CarLog> {
    let sql = format!(
        r#"
            INSERT INTO {table} ({driver_id}, {timestamp}, {trip_date}, {issues})
            VALUES (:driver_id, :timestamp, :trip_date, :issues)
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        driver_id = Columns::DriverId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        trip_date = Columns::TripDate.as_str(),
        issues = Columns::Issues.as_str(),
        projection = CarLog::projection(),
    );
    let timestamp = db::format_timestamp(timestamp)?;
    let trip_date = trip_date.map(db::format_date);
    let params = named_params! {
        ":driver_id": driver_id,
        ":timestamp": timestamp,
        ":trip_date": trip_date,
        ":issues": issues.trim(),
    };
    conn.query_row(&sql, params, CarLog::mapper())
        .map_err(Into::into)
}

pub fn insert_stop(
    car_log_id: i64,
    machine_id: i64,
    position: i64,
    conn: &Connection,
) -> Result<CarLogStop> {
    let sql = format!(
        r#"
            INSERT INTO {table} ({car_log_id}, {machine_id}, {position})
            VALUES (?1, ?2, ?3)
            RETURNING {projection}
        "#,
        table = schema::STOP_TABLE_NAME,
        car_log_id = StopColumns::CarLogId.as_str(),
        machine_id = StopColumns::MachineId.as_str(),
        position = StopColumns::Position.as_str(),
        projection = CarLogStop::projection(),
    );
    conn.query_row(
        &sql,
        params![car_log_id, machine_id, position],
        CarLogStop::mapper(),
    )
    .map_err(Into::into)
}

pub fn exists(driver_id: Option<i64>, timestamp: OffsetDateTime, conn: &Connection) -> Result<bool> {
    let sql = format!(
        r#"
            SELECT count(*)
            FROM {table}
            WHERE {driver_id} IS ?1 AND {timestamp} = ?2
        "#,
        table = schema::TABLE_NAME,
        driver_id = Columns::DriverId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
    );
    let count: i64 = conn.query_row(
        &sql,
        params![driver_id, db::format_timestamp(timestamp)?],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Every stop of every trip made on `trip_date`, ordered by driver name then route position.
pub fn select_stops_by_trip_date(trip_date: Date, conn: &Connection) -> Result<Vec<TripStop>> {
    let sql = format!(
        r#"
            SELECT s.{car_log_id}, s.{machine_id}, s.{position}, o.{operator_name}, c.{issues}
            FROM {stop_table} s
            JOIN {table} c ON c.{id} = s.{car_log_id}
            LEFT JOIN {operator_table} o ON o.{operator_id} = c.{driver_id}
            WHERE c.{trip_date} = ?1
            ORDER BY o.{operator_name}, c.{id}, s.{position}
        "#,
        stop_table = schema::STOP_TABLE_NAME,
        table = schema::TABLE_NAME,
        operator_table = db::operator::schema::TABLE_NAME,
        operator_id = db::operator::schema::Columns::Id.as_str(),
        operator_name = db::operator::schema::Columns::Name.as_str(),
        car_log_id = StopColumns::CarLogId.as_str(),
        machine_id = StopColumns::MachineId.as_str(),
        position = StopColumns::Position.as_str(),
        id = Columns::Id.as_str(),
        driver_id = Columns::DriverId.as_str(),
        issues = Columns::Issues.as_str(),
        trip_date = Columns::TripDate.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(params![db::format_date(trip_date)], |row| {
            Ok(TripStop {
                car_log_id: row.get(0)?,
                machine_id: row.get(1)?,
                position: row.get(2)?,
                driver_name: row.get(3)?,
                issues: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}
