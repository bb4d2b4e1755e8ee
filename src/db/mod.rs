pub mod car_log;
pub mod machine;
pub mod machine_alias;
pub mod migration;
pub mod operator;
pub mod operator_rating;
pub mod visit_log;

use crate::{conf::Conf, Result};
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;
use time::macros::date;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, UtcOffset};

pub fn open_conn(conf: &Conf) -> Result<Connection> {
    let conn = Connection::open(conf.db_path()?)?;
    init_conn(&conn)?;
    Ok(conn)
}

pub fn pool(conf: &Conf) -> Result<Pool> {
    // WAL mode is persisted in the database file, open_conn sets it on startup
    Config::new(conf.db_path()?)
        .builder(Runtime::Tokio1)?
        .max_size(8)
        .build()
        .map_err(Into::into)
}

/// Six uppercase hex chars, used as a human friendly machine or operator code.
pub fn short_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

// Codes are random, a few attempts are enough to dodge a collision
const CODE_ATTEMPTS: usize = 10;

/// A short code not yet present in `table.column`, or `None` if every attempt collided.
pub fn unused_code(table: &str, column: &str, conn: &Connection) -> Result<Option<String>> {
    let sql = format!("SELECT count(*) FROM {table} WHERE {column} = ?1");
    for _ in 0..CODE_ATTEMPTS {
        let code = short_code();
        let taken: i64 = conn.query_row(&sql, [&code], |row| row.get(0))?;
        if taken == 0 {
            return Ok(Some(code));
        }
    }
    Ok(None)
}

/// Whole-second UTC RFC 3339, the only timestamp format written to the database.
/// Equality lookups and SQLite's `date()` both depend on it.
pub fn format_timestamp(timestamp: OffsetDateTime) -> Result<String> {
    Ok(timestamp
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)?
        .format(&Rfc3339)?)
}

/// `YYYY-MM-DD` for every date bound to a query. SQLite compares dates as text, so years
/// are kept to 4 digits.
pub fn format_date(date: Date) -> String {
    date.clamp(date!(0001 - 01 - 01), date!(9999 - 12 - 31))
        .to_string()
}

fn init_conn(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

// Placeholders for an `IN (...)` clause, rusqlite can't bind slices directly
pub fn in_placeholders(len: usize) -> String {
    vec!["?"; len].join(", ")
}
