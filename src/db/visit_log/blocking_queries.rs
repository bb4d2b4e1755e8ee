use super::schema::{
    self, void_percentage, Columns, DuplicateGroup, NewVisitLog, OperatorCounts, VisitLog,
};
use crate::{db, Result};
use rusqlite::{named_params, params, params_from_iter, types::Value, Connection};
use time::{Date, OffsetDateTime};

pub fn insert(log: &NewVisitLog, conn: &Connection) -> Result<VisitLog> {
    let timestamp = log.timestamp.unwrap_or(OffsetDateTime::now_utc());
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {machine_id},
                {operator_id},
                {timestamp},
                {transactions},
                {voids},
                {void_percentage},
                {visit_location},
                {machine_issue},
                {product_issue},
                {comments},
                {raw_machine_name}
            ) VALUES (
                :machine_id,
                :operator_id,
                :timestamp,
                :transactions,
                :voids,
                :void_percentage,
                :visit_location,
                :machine_issue,
                :product_issue,
                :comments,
                :raw_machine_name
            )
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        machine_id = Columns::MachineId.as_str(),
        operator_id = Columns::OperatorId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        transactions = Columns::Transactions.as_str(),
        voids = Columns::Voids.as_str(),
        void_percentage = Columns::VoidPercentage.as_str(),
        visit_location = Columns::VisitLocation.as_str(),
        machine_issue = Columns::MachineIssue.as_str(),
        product_issue = Columns::ProductIssue.as_str(),
        comments = Columns::Comments.as_str(),
        raw_machine_name = Columns::RawMachineName.as_str(),
        projection = VisitLog::projection(),
    );
    let timestamp = db::format_timestamp(timestamp)?;
    let params = named_params! {
        ":machine_id": log.machine_id,
        ":operator_id": log.operator_id,
        ":timestamp": timestamp,
        ":transactions": log.transactions,
        ":voids": log.voids,
        ":void_percentage": void_percentage(log.voids, log.transactions),
        ":visit_location": log.visit_location,
        ":machine_issue": log.machine_issue,
        ":product_issue": log.product_issue,
        ":comments": log.comments,
        ":raw_machine_name": log.raw_machine_name,
    };
    conn.query_row(&sql, params, VisitLog::mapper())
        .map_err(Into::into)
}

pub fn exists(machine_id: i64, timestamp: OffsetDateTime, conn: &Connection) -> Result<bool> {
    let sql = format!(
        r#"
            SELECT count(*)
            FROM {table}
            WHERE {machine_id} = ?1 AND {timestamp} = ?2
        "#,
        table = schema::TABLE_NAME,
        machine_id = Columns::MachineId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
    );
    let count: i64 = conn.query_row(
        &sql,
        params![machine_id, db::format_timestamp(timestamp)?],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Visits whose UTC calendar date falls within `start..=end`, ordered by machine then time.
/// `None` means every machine.
pub fn select_between(
    machine_ids: Option<&[i64]>,
    start: Date,
    end: Date,
    conn: &Connection,
) -> Result<Vec<VisitLog>> {
    let mut values = vec![
        Value::Text(db::format_date(start)),
        Value::Text(db::format_date(end)),
    ];
    let machine_filter = match machine_ids {
        Some(ids) => {
            values.extend(ids.iter().map(|it| Value::Integer(*it)));
            format!(
                "AND {machine_id} IN ({placeholders})",
                machine_id = Columns::MachineId.as_str(),
                placeholders = db::in_placeholders(ids.len()),
            )
        }
        None => String::new(),
    };
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE date({timestamp}) BETWEEN ? AND ? {machine_filter}
            ORDER BY {machine_id}, {timestamp}, {id}
        "#,
        projection = VisitLog::projection(),
        table = schema::TABLE_NAME,
        timestamp = Columns::Timestamp.as_str(),
        machine_id = Columns::MachineId.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(params_from_iter(values.iter()), VisitLog::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_by_machine_id(
    machine_id: i64,
    range: Option<(Date, Date)>,
    limit: Option<i64>,
    conn: &Connection,
) -> Result<Vec<VisitLog>> {
    let (start, end) = range.unwrap_or((Date::MIN, Date::MAX));
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {machine_id} = ?1 AND date({timestamp}) BETWEEN ?2 AND ?3
            ORDER BY {timestamp} DESC, {id} DESC
            LIMIT ?4
        "#,
        projection = VisitLog::projection(),
        table = schema::TABLE_NAME,
        machine_id = Columns::MachineId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(
            params![
                machine_id,
                db::format_date(start),
                db::format_date(end),
                limit.unwrap_or(i64::MAX)
            ],
            VisitLog::mapper(),
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_by_operator_id(
    operator_id: i64,
    start: Date,
    end: Date,
    limit: Option<i64>,
    conn: &Connection,
) -> Result<Vec<VisitLog>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {operator_id} = ?1 AND date({timestamp}) BETWEEN ?2 AND ?3
            ORDER BY {timestamp} DESC, {id} DESC
            LIMIT ?4
        "#,
        projection = VisitLog::projection(),
        table = schema::TABLE_NAME,
        operator_id = Columns::OperatorId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(
            params![
                operator_id,
                db::format_date(start),
                db::format_date(end),
                limit.unwrap_or(i64::MAX)
            ],
            VisitLog::mapper(),
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Visit and distinct machine counts per operator, for operators with at least one visit in range.
pub fn select_operator_counts(start: Date, end: Date, conn: &Connection) -> Result<Vec<OperatorCounts>> {
    let sql = format!(
        r#"
            SELECT {operator_id}, count(*), count(DISTINCT {machine_id})
            FROM {table}
            WHERE {operator_id} IS NOT NULL AND date({timestamp}) BETWEEN ?1 AND ?2
            GROUP BY {operator_id}
            ORDER BY {operator_id}
        "#,
        operator_id = Columns::OperatorId.as_str(),
        machine_id = Columns::MachineId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        table = schema::TABLE_NAME,
    );
    conn.prepare(&sql)?
        .query_map(params![db::format_date(start), db::format_date(end)], |row| {
            Ok(OperatorCounts {
                operator_id: row.get(0)?,
                visits: row.get(1)?,
                machines: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Distinct `YYYY-MM` months having at least one visit, newest first.
pub fn select_months(conn: &Connection) -> Result<Vec<String>> {
    let sql = format!(
        r#"
            SELECT DISTINCT strftime('%Y-%m', {timestamp}) AS month
            FROM {table}
            WHERE month IS NOT NULL
            ORDER BY month DESC
        "#,
        timestamp = Columns::Timestamp.as_str(),
        table = schema::TABLE_NAME,
    );
    conn.prepare(&sql)?
        .query_map((), |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_duplicates(limit: i64, conn: &Connection) -> Result<Vec<DuplicateGroup>> {
    let sql = format!(
        r#"
            SELECT m.{machine_name}, v.{timestamp}, count(*) AS copies
            FROM {table} v
            JOIN {machine_table} m ON m.{machine_pk} = v.{machine_id}
            GROUP BY m.{machine_name}, v.{timestamp}
            HAVING copies > 1
            ORDER BY copies DESC, v.{timestamp}
            LIMIT ?1
        "#,
        machine_name = db::machine::schema::Columns::Name.as_str(),
        machine_table = db::machine::schema::TABLE_NAME,
        machine_pk = db::machine::schema::Columns::Id.as_str(),
        timestamp = Columns::Timestamp.as_str(),
        machine_id = Columns::MachineId.as_str(),
        table = schema::TABLE_NAME,
    );
    conn.prepare(&sql)?
        .query_map(params![limit], |row| {
            Ok(DuplicateGroup {
                machine_name: row.get(0)?,
                timestamp: row.get(1)?,
                copies: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn count_duplicate_groups(conn: &Connection) -> Result<i64> {
    let sql = format!(
        r#"
            SELECT count(*) FROM (
                SELECT 1
                FROM {table}
                GROUP BY {machine_id}, {timestamp}
                HAVING count(*) > 1
            )
        "#,
        table = schema::TABLE_NAME,
        machine_id = Columns::MachineId.as_str(),
        timestamp = Columns::Timestamp.as_str(),
    );
    conn.query_row(&sql, (), |row| row.get(0))
        .map_err(Into::into)
}
