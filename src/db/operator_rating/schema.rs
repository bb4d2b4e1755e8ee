use rusqlite::Row;
use std::sync::OnceLock;
use time::{Date, OffsetDateTime};

pub const TABLE_NAME: &str = "operator_daily_rating";

pub const MAX_RATING: i64 = 10;

pub enum Columns {
    Id,
    OperatorId,
    Date,
    Rating,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::OperatorId => "operator_id",
            Columns::Date => "date",
            Columns::Rating => "rating",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRating {
    pub id: i64,
    pub operator_id: i64,
    pub date: Date,
    pub rating: i64,
    pub updated_at: OffsetDateTime,
}

impl OperatorRating {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::OperatorId,
                Columns::Date,
                Columns::Rating,
                Columns::UpdatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<OperatorRating> {
        |row| {
            Ok(OperatorRating {
                id: row.get(Columns::Id.as_str())?,
                operator_id: row.get(Columns::OperatorId.as_str())?,
                date: row.get(Columns::Date.as_str())?,
                rating: row.get(Columns::Rating.as_str())?,
                updated_at: row.get(Columns::UpdatedAt.as_str())?,
            })
        }
    }
}
