use super::{blocking_queries, schema::Machine};
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn select_all(pool: &Pool) -> Result<Vec<Machine>> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_all(conn))
        .await?
}

pub async fn select_by_id(id: i64, pool: &Pool) -> Result<Machine> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_by_id(id, conn))
        .await?
}
