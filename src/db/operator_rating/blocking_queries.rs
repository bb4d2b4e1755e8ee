use super::schema::{self, Columns, OperatorRating, MAX_RATING};
use crate::{db, Error, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};
use time::Date;

pub fn upsert(operator_id: i64, date: Date, rating: i64, conn: &Connection) -> Result<OperatorRating> {
    if !(0..=MAX_RATING).contains(&rating) {
        return Err(Error::InvalidInput(format!(
            "Rating must be between 0 and {MAX_RATING}"
        )));
    }
    let sql = format!(
        r#"
            INSERT INTO {table} ({operator_id}, {date}, {rating})
            VALUES (:operator_id, :date, :rating)
            ON CONFLICT ({operator_id}, {date}) DO UPDATE SET
                {rating} = excluded.{rating},
                {updated_at} = strftime('%Y-%m-%dT%H:%M:%fZ')
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        operator_id = Columns::OperatorId.as_str(),
        date = Columns::Date.as_str(),
        rating = Columns::Rating.as_str(),
        updated_at = Columns::UpdatedAt.as_str(),
        projection = OperatorRating::projection(),
    );
    let params = named_params! {
        ":operator_id": operator_id,
        ":date": db::format_date(date),
        ":rating": rating,
    };
    conn.query_row(&sql, params, OperatorRating::mapper())
        .map_err(Into::into)
}

pub fn select_by_operator_id_and_date(
    operator_id: i64,
    date: Date,
    conn: &Connection,
) -> Result<Option<OperatorRating>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {operator_id} = ?1 AND {date} = ?2
        "#,
        projection = OperatorRating::projection(),
        table = schema::TABLE_NAME,
        operator_id = Columns::OperatorId.as_str(),
        date = Columns::Date.as_str(),
    );
    conn.query_row(&sql, params![operator_id, db::format_date(date)], OperatorRating::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn select_by_date(date: Date, conn: &Connection) -> Result<Vec<OperatorRating>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {date} = ?1
            ORDER BY {operator_id}
        "#,
        projection = OperatorRating::projection(),
        table = schema::TABLE_NAME,
        date = Columns::Date.as_str(),
        operator_id = Columns::OperatorId.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(params![db::format_date(date)], OperatorRating::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod test {
    use crate::{db, db::test::conn, Error, Result};
    use time::macros::date;

    #[test]
    fn upsert() -> Result<()> {
        let conn = conn();
        let operator = db::operator::blocking_queries::insert("Omar", false, &conn)?;
        let day = date!(2024 - 01 - 15);
        let first = super::upsert(operator.id, day, 7, &conn)?;
        assert_eq!(7, first.rating);
        let second = super::upsert(operator.id, day, 9, &conn)?;
        assert_eq!(first.id, second.id);
        assert_eq!(9, second.rating);
        assert_eq!(
            Some(second),
            super::select_by_operator_id_and_date(operator.id, day, &conn)?
        );
        Ok(())
    }

    #[test]
    fn upsert_out_of_range() -> Result<()> {
        let conn = conn();
        let operator = db::operator::blocking_queries::insert("Omar", false, &conn)?;
        let res = super::upsert(operator.id, date!(2024 - 01 - 15), 11, &conn);
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        let res = super::upsert(operator.id, date!(2024 - 01 - 15), -1, &conn);
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        Ok(())
    }

    #[test]
    fn select_by_date() -> Result<()> {
        let conn = conn();
        let a = db::operator::blocking_queries::insert("A", false, &conn)?;
        let b = db::operator::blocking_queries::insert("B", false, &conn)?;
        let rating_a = super::upsert(a.id, date!(2024 - 01 - 15), 5, &conn)?;
        super::upsert(b.id, date!(2024 - 01 - 16), 6, &conn)?;
        assert_eq!(vec![rating_a], super::select_by_date(date!(2024 - 01 - 15), &conn)?);
        Ok(())
    }
}
