use crate::db::visit_log::blocking_queries;
use crate::Result;
use rusqlite::Connection;
use tracing::{info, warn};

const TOP_GROUPS: i64 = 10;

pub fn run(conn: Connection) -> Result<()> {
    let groups = blocking_queries::count_duplicate_groups(&conn)?;
    if groups == 0 {
        info!("No duplicate visit logs");
        return Ok(());
    }
    warn!(groups, "Found duplicate visit logs");
    for group in blocking_queries::select_duplicates(TOP_GROUPS, &conn)? {
        println!(
            "{} @ {}: {} copies",
            group.machine_name, group.timestamp, group.copies
        );
    }
    Ok(())
}
