use super::{blocking_queries, schema::MachineAlias};
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn select_by_machine_id(machine_id: i64, pool: &Pool) -> Result<Vec<MachineAlias>> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_by_machine_id(machine_id, conn))
        .await?
}
