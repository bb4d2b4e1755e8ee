use crate::db::{
    self,
    operator::schema::Operator,
    operator_rating::schema::OperatorRating,
    visit_log::schema::VisitLog,
};
use crate::service::report::{self, DateRange};
use crate::{Error, Result};
use deadpool_sqlite::Pool;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use time::Date;
use tracing::info;

const RECENT_VISITS_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorStats {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub driver: bool,
    pub visit_count: i64,
    pub machine_count: i64,
    pub today_rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorMonth {
    pub month: String,
    pub available_months: Vec<String>,
    pub operators: Vec<OperatorStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDetail {
    pub month: String,
    pub stats: OperatorStats,
    pub recent_visits: Vec<VisitLog>,
}

fn stats(operator: Operator, visits: i64, machines: i64, rating: Option<i64>) -> OperatorStats {
    OperatorStats {
        id: operator.id,
        name: operator.name,
        code: operator.code,
        driver: operator.driver,
        visit_count: visits,
        machine_count: machines,
        today_rating: rating,
    }
}

/// Every operator, in name order, with visit counts for the selected month and today's rating.
pub fn month_stats(month: Option<&str>, today: Date, conn: &Connection) -> Result<OperatorMonth> {
    let month = report::selected_month(month, today, conn)?;
    let range = DateRange::month(&month)?;
    let counts: HashMap<i64, (i64, i64)> =
        db::visit_log::blocking_queries::select_operator_counts(range.start(), range.end(), conn)?
            .into_iter()
            .map(|it| (it.operator_id, (it.visits, it.machines)))
            .collect();
    let ratings: HashMap<i64, i64> = db::operator_rating::blocking_queries::select_by_date(today, conn)?
        .into_iter()
        .map(|it| (it.operator_id, it.rating))
        .collect();
    let operators = db::operator::blocking_queries::select_all(conn)?
        .into_iter()
        .map(|operator| {
            let (visits, machines) = counts.get(&operator.id).copied().unwrap_or_default();
            let rating = ratings.get(&operator.id).copied();
            stats(operator, visits, machines, rating)
        })
        .collect();
    Ok(OperatorMonth {
        available_months: report::available_months(conn)?,
        month,
        operators,
    })
}

pub fn detail(operator_id: i64, month: Option<&str>, today: Date, conn: &Connection) -> Result<OperatorDetail> {
    let operator = select_operator(operator_id, conn)?;
    let month = report::selected_month(month, today, conn)?;
    let range = DateRange::month(&month)?;
    let visits = db::visit_log::blocking_queries::select_by_operator_id(
        operator.id,
        range.start(),
        range.end(),
        None,
        conn,
    )?;
    let mut machines: Vec<i64> = visits.iter().map(|it| it.machine_id).collect();
    machines.sort_unstable();
    machines.dedup();
    let rating = db::operator_rating::blocking_queries::select_by_operator_id_and_date(operator.id, today, conn)?
        .map(|it| it.rating);
    let stats = stats(operator, visits.len() as i64, machines.len() as i64, rating);
    Ok(OperatorDetail {
        month,
        stats,
        recent_visits: visits.into_iter().take(RECENT_VISITS_LIMIT as usize).collect(),
    })
}

/// Sets the operator's rating for `date`, replacing any earlier rating of the same day.
pub fn rate(operator_id: i64, date: Date, rating: i64, conn: &Connection) -> Result<OperatorRating> {
    let operator = select_operator(operator_id, conn)?;
    let rating = db::operator_rating::blocking_queries::upsert(operator.id, date, rating, conn)?;
    info!(operator_id, %date, rating = rating.rating, "Saved operator rating");
    Ok(rating)
}

fn select_operator(id: i64, conn: &Connection) -> Result<Operator> {
    match db::operator::blocking_queries::select_by_id(id, conn) {
        Err(Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => {
            Err(Error::NotFound(format!("operator {id} does not exist")))
        }
        res => res,
    }
}

pub async fn month_stats_async(month: Option<String>, today: Date, pool: &Pool) -> Result<OperatorMonth> {
    pool.get()
        .await?
        .interact(move |conn| month_stats(month.as_deref(), today, conn))
        .await?
}

pub async fn detail_async(
    operator_id: i64,
    month: Option<String>,
    today: Date,
    pool: &Pool,
) -> Result<OperatorDetail> {
    pool.get()
        .await?
        .interact(move |conn| detail(operator_id, month.as_deref(), today, conn))
        .await?
}

pub async fn rate_async(operator_id: i64, date: Date, rating: i64, pool: &Pool) -> Result<OperatorRating> {
    pool.get()
        .await?
        .interact(move |conn| rate(operator_id, date, rating, conn))
        .await?
}
