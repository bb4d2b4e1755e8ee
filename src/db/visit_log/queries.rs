use super::{blocking_queries, schema::VisitLog};
use crate::Result;
use deadpool_sqlite::Pool;
use time::Date;

pub async fn select_by_machine_id(
    machine_id: i64,
    range: Option<(Date, Date)>,
    limit: Option<i64>,
    pool: &Pool,
) -> Result<Vec<VisitLog>> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_by_machine_id(machine_id, range, limit, conn))
        .await?
}

pub async fn select_months(pool: &Pool) -> Result<Vec<String>> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_months(conn))
        .await?
}
