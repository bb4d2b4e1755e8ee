use super::schema::{self, Columns, Operator};
use crate::{db, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};

pub fn insert(name: &str, driver: bool, conn: &Connection) -> Result<Operator> {
    let code = db::unused_code(schema::TABLE_NAME, Columns::Code.as_str(), conn)?;
    let sql = format!(
        r#"
            INSERT INTO {table} ({name}, {code}, {driver})
            VALUES (:name, :code, :driver)
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        name = Columns::Name.as_str(),
        code = Columns::Code.as_str(),
        driver = Columns::Driver.as_str(),
        projection = Operator::projection(),
    );
    let params = named_params! {
        ":name": name.trim(),
        ":code": code,
        ":driver": driver,
    };
    conn.query_row(&sql, params, Operator::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Operator>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {name}
        "#,
        projection = Operator::projection(),
        table = schema::TABLE_NAME,
        name = Columns::Name.as_str(),
    );
    conn.prepare(&sql)?
        .query_map((), Operator::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Operator> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Operator::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Operator::mapper())
        .map_err(Into::into)
}

pub fn select_by_name(name: &str, conn: &Connection) -> Result<Option<Operator>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {name} = ?1
        "#,
        projection = Operator::projection(),
        table = schema::TABLE_NAME,
        name = Columns::Name.as_str(),
    );
    conn.query_row(&sql, params![name.trim()], Operator::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn set_driver(id: i64, driver: bool, conn: &Connection) -> Result<Operator> {
    let sql = format!(
        r#"
            UPDATE {table}
            SET {driver} = ?2
            WHERE {id} = ?1
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        driver = Columns::Driver.as_str(),
        id = Columns::Id.as_str(),
        projection = Operator::projection(),
    );
    conn.query_row(&sql, params![id, driver], Operator::mapper())
        .map_err(Into::into)
}

/// Looks the operator up by name and creates it when missing. A known operator
/// gets promoted to driver when seen in a driver log, never demoted.
pub fn select_or_insert(name: &str, driver: bool, conn: &Connection) -> Result<(Operator, bool)> {
    match select_by_name(name, conn)? {
        Some(operator) if driver && !operator.driver => {
            Ok((set_driver(operator.id, true, conn)?, false))
        }
        Some(operator) => Ok((operator, false)),
        None => Ok((insert(name, driver, conn)?, true)),
    }
}
