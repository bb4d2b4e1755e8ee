use rusqlite::{types::Type, Row};
use std::sync::OnceLock;
use strum::{AsRefStr, Display, EnumString};
use time::OffsetDateTime;

pub const TABLE_NAME: &str = "machine_alias";

pub enum Columns {
    Id,
    Alias,
    MachineId,
    Source,
    Confidence,
    CreatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::Alias => "alias",
            Columns::MachineId => "machine_id",
            Columns::Source => "source",
            Columns::Confidence => "confidence",
            Columns::CreatedAt => "created_at",
        }
    }
}

/// How a raw spelling got linked to its machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AliasSource {
    Manual,
    Fuzzy,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineAlias {
    pub id: i64,
    pub alias: String,
    pub machine_id: i64,
    pub source: AliasSource,
    pub confidence: f64,
    pub created_at: OffsetDateTime,
}

impl MachineAlias {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::Alias,
                Columns::MachineId,
                Columns::Source,
                Columns::Confidence,
                Columns::CreatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<MachineAlias> {
        |row| {
            let source: String = row.get(Columns::Source.as_str())?;
            let source = source.parse::<AliasSource>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
            })?;
            Ok(MachineAlias {
                id: row.get(Columns::Id.as_str())?,
                alias: row.get(Columns::Alias.as_str())?,
                machine_id: row.get(Columns::MachineId.as_str())?,
                source,
                confidence: row.get(Columns::Confidence.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
            })
        }
    }
}
