use crate::error::Error;
use crate::service::ingest::{self, LogType, Row};
use crate::Result;
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;
use std::str::FromStr;
use tracing::info;

struct Args {
    path: String,
    log_type: LogType,
    dry_run: bool,
}

pub fn run(args: &[String], mut conn: Connection) -> Result<()> {
    let args = parse_args(args)?;
    let file = File::open(&args.path)?;
    let rows: Vec<Row> = serde_json::from_reader(BufReader::new(file))?;
    info!(
        path = %args.path,
        rows = rows.len(),
        log_type = %args.log_type,
        dry_run = args.dry_run,
        "Importing",
    );

    let tx = conn.transaction()?;
    let outcome = ingest::ingest(&rows, args.log_type, args.dry_run, &tx)?;
    if args.dry_run {
        tx.rollback()?;
    } else {
        tx.commit()?;
    }

    info!(
        created = outcome.created,
        skipped = outcome.skipped,
        new_machines = outcome.new_machines.len(),
        dry_run = args.dry_run,
        "Import finished",
    );
    for name in &outcome.new_machines {
        info!(name, "New machine");
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut path = None;
    let mut log_type = LogType::Onsite;
    let mut dry_run = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--type" => {
                let value = iter
                    .next()
                    .ok_or(Error::CLI("--type needs a value: onsite or car".into()))?;
                log_type = LogType::from_str(value)
                    .map_err(|_| Error::CLI(format!("Unknown log type: {value}")))?;
            }
            other if other.starts_with("--") => {
                Err(Error::CLI(format!("Unknown option: {other}")))?
            }
            other => path = Some(other.to_string()),
        }
    }
    let path = path.ok_or(Error::CLI("No input file passed".into()))?;
    Ok(Args {
        path,
        log_type,
        dry_run,
    })
}
