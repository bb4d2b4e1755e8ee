use super::schema::{self, Columns, Machine};
use crate::{db, Result};
use rusqlite::{named_params, params, params_from_iter, Connection, OptionalExtension};

pub fn insert(
    name: &str,
    location: &str,
    lat: Option<f64>,
    lon: Option<f64>,
    conn: &Connection,
) -> Result<Machine> {
    let code = db::unused_code(schema::TABLE_NAME, Columns::Code.as_str(), conn)?;
    let sql = format!(
        r#"
            INSERT INTO {table} ({name}, {code}, {location}, {lat}, {lon})
            VALUES (:name, :code, :location, :lat, :lon)
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        name = Columns::Name.as_str(),
        code = Columns::Code.as_str(),
        location = Columns::Location.as_str(),
        lat = Columns::Lat.as_str(),
        lon = Columns::Lon.as_str(),
        projection = Machine::projection(),
    );
    let params = named_params! {
        ":name": name.trim(),
        ":code": code,
        ":location": location,
        ":lat": lat,
        ":lon": lon,
    };
    conn.query_row(&sql, params, Machine::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Machine>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {deleted_at} IS NULL
            ORDER BY {name}
        "#,
        projection = Machine::projection(),
        table = schema::TABLE_NAME,
        deleted_at = Columns::DeletedAt.as_str(),
        name = Columns::Name.as_str(),
    );
    conn.prepare(&sql)?
        .query_map((), Machine::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_active(conn: &Connection) -> Result<Vec<Machine>> {
    Ok(select_all(conn)?
        .into_iter()
        .filter(|it| it.active)
        .collect())
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Machine> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Machine::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Machine::mapper())
        .map_err(Into::into)
}

pub fn select_by_ids(ids: &[i64], conn: &Connection) -> Result<Vec<Machine>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} IN ({placeholders}) AND {deleted_at} IS NULL
            ORDER BY {id}
        "#,
        projection = Machine::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
        deleted_at = Columns::DeletedAt.as_str(),
        placeholders = db::in_placeholders(ids.len()),
    );
    conn.prepare(&sql)?
        .query_map(params_from_iter(ids.iter()), Machine::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Case-insensitive, the name column is declared with `COLLATE NOCASE`.
pub fn select_by_name(name: &str, conn: &Connection) -> Result<Option<Machine>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {name} = ?1
        "#,
        projection = Machine::projection(),
        table = schema::TABLE_NAME,
        name = Columns::Name.as_str(),
    );
    conn.query_row(&sql, params![name.trim()], Machine::mapper())
        .optional()
        .map_err(Into::into)
}
