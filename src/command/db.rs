use crate::conf::Conf;
use crate::error::Error;
use crate::Result;
use rusqlite::Connection;
use std::fs::remove_file;
use tracing::info;

pub fn run(args: &[String], conf: &Conf, conn: Connection) -> Result<()> {
    let first_arg = match args.first() {
        Some(some) => some,
        None => Err(Error::CLI("No DB actions passed".into()))?,
    };

    match first_arg.as_str() {
        // Migrations are applied on every start
        "migrate" => {}
        "drop" => drop(conf, conn)?,
        _ => Err(Error::CLI(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn drop(conf: &Conf, conn: Connection) -> Result<()> {
    conn.close().map_err(|(_, e)| e)?;
    let path = conf.db_path()?;
    remove_file(&path)?;
    // WAL side files are recreated on the next open
    for suffix in ["-wal", "-shm"] {
        let side = path.with_file_name(format!("{}{suffix}", crate::conf::DB_FILE_NAME));
        if side.exists() {
            remove_file(side)?;
        }
    }
    info!(path = %path.display(), "Database file was removed");
    Ok(())
}
