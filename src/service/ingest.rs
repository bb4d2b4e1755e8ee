use crate::db::{self, visit_log::schema::NewVisitLog};
use crate::service::resolve::{self, MatchKind};
use crate::{Error, Result};
use rusqlite::Connection;
use serde_json::{Map, Value};
use time::{
    macros::{datetime, format_description},
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    Date, Duration, OffsetDateTime, PrimitiveDateTime,
};
use tracing::{info, warn};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LogType {
    Onsite,
    Car,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub created: usize,
    pub skipped: usize,
    pub new_machines: Vec<String>,
}

/// Header spellings to look for, exact first, then case-insensitive, then any header containing a keyword.
struct ColumnSpec {
    candidates: &'static [&'static str],
    keywords: &'static [&'static str],
}

const TIMESTAMP: ColumnSpec = ColumnSpec {
    candidates: &["Timestamp", "timestamp", "التوقيت", "التاريخ"],
    keywords: &["date", "time", "تاريخ", "وقت"],
};

const DATE: ColumnSpec = ColumnSpec {
    candidates: &["Date", "التاريخ", "date"],
    keywords: &[],
};

const OPERATOR: ColumnSpec = ColumnSpec {
    candidates: &[
        "\" الأسم \" ثلاثي",
        "Operator Name",
        "الأسم ثلاثي",
        "Name",
        "Operator",
    ],
    keywords: &["operator", "driver", "اسم"],
};

const MACHINE: ColumnSpec = ColumnSpec {
    candidates: &["ما هو أسم الماكينه؟", "Machine Name", "Machine", "machine"],
    keywords: &["machine", "ماكينه"],
};

const TRANSACTIONS: ColumnSpec = ColumnSpec {
    candidates: &[
        "عدد المعامت خلال اليوم",
        "Transactions",
        "No of Transactions",
        "transactions",
        "عدد المعاملات",
    ],
    keywords: &["transaction", "sales", "بيع", "معاملات"],
};

const VOIDS: ColumnSpec = ColumnSpec {
    candidates: &["في اليوم VOIDS عدد ال", "Voids", "voids", "Void", "الفويد"],
    keywords: &["void", "refund", "فويد", "استرجاع"],
};

const VISIT_LOCATION: ColumnSpec = ColumnSpec {
    candidates: &["موقع الماكينة", "Visit Location", "Location", "location"],
    keywords: &["location", "موقع"],
};

const MACHINE_ISSUE: ColumnSpec = ColumnSpec {
    candidates: &["هل يوجد أي مشاكل بالماكينة", "Machine Issue", "machine_issue"],
    keywords: &["مشاكل بالماكينة", "machine issue"],
};

const PRODUCT_ISSUE: ColumnSpec = ColumnSpec {
    candidates: &["هل توجد مشكله أثناء نزول المنتجات ؟", "Product Issue", "product_issue"],
    keywords: &["مشكله أثناء نزول", "product issue"],
};

const COMMENTS: ColumnSpec = ColumnSpec {
    candidates: &["تعليقات", "Comments", "comments", "Notes", "ملاحظات"],
    keywords: &["comment", "note", "ملاحظات"],
};

const DRIVER: ColumnSpec = ColumnSpec {
    candidates: &[
        "\" الأسم \" ثلاثي",
        "Driver Name",
        "driver",
        "السائق",
        "Name",
        "Operator Name",
    ],
    keywords: &["operator", "driver", "اسم"],
};

const ROUTE_LIST: ColumnSpec = ColumnSpec {
    candidates: &[
        "ما هو أسم الأماكن اللتي ستمر عليها اليوم؟",
        "Route List",
        "Routes",
        "route_list",
        "المسار",
    ],
    keywords: &["route", "location", "مسار", "أماكن"],
};

const ISSUES: ColumnSpec = ColumnSpec {
    candidates: &[
        "أي مشاكل حدثت من بدايه الرحله حتي النهايه وضحها هنا بالتفاصيل",
        "Issues",
        "issues",
        "Problems",
        "المشاكل",
    ],
    keywords: &["issue", "problem", "مشاكل", "ملاحظات"],
};

/// Every header seen across `rows`, trimmed, in order of first appearance.
pub fn headers(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = vec![];
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|it| it == key.trim()) {
                headers.push(key.trim().to_string());
            }
        }
    }
    headers
}

fn find_column(headers: &[String], spec: &ColumnSpec) -> Option<String> {
    spec.candidates
        .iter()
        .find(|candidate| headers.iter().any(|it| it == *candidate))
        .map(|it| it.to_string())
        .or_else(|| {
            spec.candidates.iter().find_map(|candidate| {
                headers
                    .iter()
                    .find(|it| it.to_lowercase() == candidate.to_lowercase())
                    .cloned()
            })
        })
        .or_else(|| {
            headers
                .iter()
                .find(|header| {
                    let header = header.to_lowercase();
                    spec.keywords
                        .iter()
                        .any(|keyword| header.contains(&keyword.to_lowercase()))
                })
                .cloned()
        })
}

// Rows are keyed by the raw header, which may carry stray whitespace
fn cell<'a>(row: &'a Row, column: Option<&str>) -> Option<&'a Value> {
    let column = column?;
    row.iter()
        .find(|(key, _)| key.trim() == column)
        .map(|(_, value)| value)
}

fn text(row: &Row, column: Option<&str>) -> Option<String> {
    let text = match cell(row, column)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(text)
    }
}

/// Sheet numbers arrive as numbers, numeric strings or placeholders. Anything unreadable
/// or outside the 32-bit range a sheet counter can hold is 0.
pub fn clean_numeric(value: Option<&Value>) -> i64 {
    let number = match value {
        Some(Value::Number(number)) => match number.as_i64() {
            Some(int) => int as f64,
            None => number.as_f64().unwrap_or(0.0),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if ["/", "-", "", "nan", "None", "N/A", "n/a"].contains(&s) {
                return 0;
            }
            s.parse::<f64>().unwrap_or(0.0)
        }
        _ => return 0,
    };
    let number = number.trunc();
    if (i32::MIN as f64..=i32::MAX as f64).contains(&number) {
        number as i64
    } else {
        0
    }
}

const NAIVE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!(
        "[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"
    ),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]"),
];

const DATE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
];

// Spreadsheet day 0
const SERIAL_EPOCH: OffsetDateTime = datetime!(1899-12-30 0:00 UTC);

/// Reads a sheet timestamp. Naive values are taken as UTC, numbers as spreadsheet serial days.
pub fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::Number(number) => {
            let days = number.as_f64()?;
            if !(1.0..=2_958_465.0).contains(&days) {
                return None;
            }
            Some(SERIAL_EPOCH + Duration::seconds((days * 86_400.0).round() as i64))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(timestamp) = OffsetDateTime::parse(s, &Rfc3339) {
                return Some(timestamp);
            }
            for format in NAIVE_FORMATS {
                if let Ok(timestamp) = PrimitiveDateTime::parse(s, format) {
                    return Some(timestamp.assume_utc());
                }
            }
            for format in DATE_FORMATS {
                if let Ok(date) = Date::parse(s, format) {
                    return Some(date.midnight().assume_utc());
                }
            }
            None
        }
        _ => None,
    }
}

fn row_timestamp(row: &Row, columns: &[Option<String>]) -> Option<OffsetDateTime> {
    columns
        .iter()
        .filter_map(|column| cell(row, column.as_deref()))
        .find_map(parse_timestamp)
}

/// Imports sheet rows. Nothing is written when `dry_run` is set, the outcome still counts what would be.
pub fn ingest(rows: &[Row], log_type: LogType, dry_run: bool, conn: &Connection) -> Result<Outcome> {
    let headers = headers(rows);
    info!(rows = rows.len(), ?headers, %log_type, dry_run, "Ingesting rows");
    match log_type {
        LogType::Onsite => ingest_onsite(rows, &headers, dry_run, conn),
        LogType::Car => ingest_car(rows, &headers, dry_run, conn),
    }
}

struct OnsiteColumns {
    timestamp: Option<String>,
    date: Option<String>,
    operator: Option<String>,
    machine: Option<String>,
    transactions: Option<String>,
    voids: Option<String>,
    visit_location: Option<String>,
    machine_issue: Option<String>,
    product_issue: Option<String>,
    comments: Option<String>,
}

fn ingest_onsite(rows: &[Row], headers: &[String], dry_run: bool, conn: &Connection) -> Result<Outcome> {
    let machine = find_column(headers, &MACHINE);
    // The machine header is claimed, so a "Machine Name" column is never read as the operator
    let unclaimed: Vec<String> = headers
        .iter()
        .filter(|it| Some(*it) != machine.as_ref())
        .cloned()
        .collect();
    let columns = OnsiteColumns {
        timestamp: find_column(headers, &TIMESTAMP),
        date: find_column(headers, &DATE),
        operator: find_column(&unclaimed, &OPERATOR),
        machine,
        transactions: find_column(headers, &TRANSACTIONS),
        voids: find_column(headers, &VOIDS),
        visit_location: find_column(headers, &VISIT_LOCATION),
        machine_issue: find_column(headers, &MACHINE_ISSUE),
        product_issue: find_column(headers, &PRODUCT_ISSUE),
        comments: find_column(headers, &COMMENTS),
    };
    if columns.machine.is_none() {
        return Err(Error::InvalidInput(format!(
            "no machine column among headers: {}",
            headers.join(", ")
        )));
    }
    let mut outcome = Outcome::default();
    for (index, row) in rows.iter().enumerate() {
        // Sheet row number, the header is row 1
        let line = index + 2;
        match ingest_onsite_row(row, &columns, dry_run, &mut outcome, conn) {
            Ok(true) => outcome.created += 1,
            Ok(false) => outcome.skipped += 1,
            Err(e) if e.is_data_access() => return Err(e),
            Err(e) => {
                warn!(line, error = %e, "Skipping row");
                outcome.skipped += 1;
            }
        }
    }
    info!(
        created = outcome.created,
        skipped = outcome.skipped,
        new_machines = outcome.new_machines.len(),
        dry_run,
        "Finished on-site logs",
    );
    Ok(outcome)
}

fn ingest_onsite_row(
    row: &Row,
    columns: &OnsiteColumns,
    dry_run: bool,
    outcome: &mut Outcome,
    conn: &Connection,
) -> Result<bool> {
    let Some(timestamp) = row_timestamp(row, &[columns.timestamp.clone(), columns.date.clone()])
    else {
        return Err(Error::InvalidInput("no valid timestamp".into()));
    };
    let Some(raw_machine_name) = text(row, columns.machine.as_deref()) else {
        return Err(Error::InvalidInput("no machine name".into()));
    };
    let operator_id = match text(row, columns.operator.as_deref()) {
        Some(name) if dry_run => db::operator::blocking_queries::select_by_name(&name, conn)?
            .map(|it| it.id),
        Some(name) => Some(db::operator::blocking_queries::select_or_insert(&name, false, conn)?.0.id),
        None => None,
    };
    let machine_id = match resolve::resolve_machine(&raw_machine_name, !dry_run, conn)? {
        Some(resolution) => {
            if let MatchKind::Fuzzy { score } = resolution.kind {
                info!(raw_machine_name, machine = resolution.machine.name, score, "Resolved by similarity");
            }
            Some(resolution.machine.id)
        }
        None => {
            if !outcome.new_machines.contains(&raw_machine_name) {
                outcome.new_machines.push(raw_machine_name.clone());
            }
            if dry_run {
                None
            } else {
                let machine =
                    db::machine::blocking_queries::insert(&raw_machine_name, "", None, None, conn)?;
                info!(id = machine.id, name = machine.name, "Created machine");
                Some(machine.id)
            }
        }
    };
    let Some(machine_id) = machine_id else {
        // Dry run for a machine that doesn't exist yet, it can't have duplicates
        return Ok(true);
    };
    if db::visit_log::blocking_queries::exists(machine_id, timestamp, conn)? {
        warn!(machine_id, %timestamp, "Duplicate log skipped");
        return Ok(false);
    }
    let log = NewVisitLog {
        machine_id,
        operator_id,
        timestamp: Some(timestamp),
        transactions: clean_numeric(cell(row, columns.transactions.as_deref())),
        voids: clean_numeric(cell(row, columns.voids.as_deref())),
        visit_location: text(row, columns.visit_location.as_deref()).unwrap_or_default(),
        machine_issue: text(row, columns.machine_issue.as_deref()).unwrap_or_default(),
        product_issue: text(row, columns.product_issue.as_deref()).unwrap_or_default(),
        comments: text(row, columns.comments.as_deref()).unwrap_or_default(),
        raw_machine_name,
    };
    if !dry_run {
        let log = db::visit_log::blocking_queries::insert(&log, conn)?;
        info!(id = log.id, machine_id, transactions = log.transactions, voids = log.voids, "Imported visit");
    }
    Ok(true)
}

struct CarColumns {
    timestamp: Option<String>,
    driver: Option<String>,
    route_list: Option<String>,
    issues: Option<String>,
}

fn ingest_car(rows: &[Row], headers: &[String], dry_run: bool, conn: &Connection) -> Result<Outcome> {
    let columns = CarColumns {
        timestamp: find_column(headers, &TIMESTAMP),
        driver: find_column(headers, &DRIVER),
        route_list: find_column(headers, &ROUTE_LIST),
        issues: find_column(headers, &ISSUES),
    };
    let mut outcome = Outcome::default();
    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        match ingest_car_row(row, &columns, dry_run, conn) {
            Ok(true) => outcome.created += 1,
            Ok(false) => outcome.skipped += 1,
            Err(e) if e.is_data_access() => return Err(e),
            Err(e) => {
                warn!(line, error = %e, "Skipping row");
                outcome.skipped += 1;
            }
        }
    }
    info!(
        created = outcome.created,
        skipped = outcome.skipped,
        dry_run,
        "Finished car logs",
    );
    Ok(outcome)
}

/// Splits a free text route into stop names.
pub fn route_stops(route_list: &str) -> Vec<&str> {
    route_list
        .split([',', '،', ';', '\n'])
        .map(str::trim)
        .filter(|it| !it.is_empty())
        .collect()
}

fn ingest_car_row(row: &Row, columns: &CarColumns, dry_run: bool, conn: &Connection) -> Result<bool> {
    let Some(timestamp) = row_timestamp(row, &[columns.timestamp.clone()]) else {
        return Err(Error::InvalidInput("no valid timestamp".into()));
    };
    let driver_id = match text(row, columns.driver.as_deref()) {
        Some(name) if dry_run => db::operator::blocking_queries::select_by_name(&name, conn)?
            .map(|it| it.id),
        Some(name) => Some(db::operator::blocking_queries::select_or_insert(&name, true, conn)?.0.id),
        None => None,
    };
    if db::car_log::blocking_queries::exists(driver_id, timestamp, conn)? {
        return Ok(false);
    }
    if dry_run {
        return Ok(true);
    }
    let issues = text(row, columns.issues.as_deref()).unwrap_or_default();
    let trip_date = timestamp.to_offset(time::UtcOffset::UTC).date();
    let log = db::car_log::blocking_queries::insert(driver_id, timestamp, Some(trip_date), &issues, conn)?;
    let route_list = text(row, columns.route_list.as_deref()).unwrap_or_default();
    let mut position = 0;
    for stop in route_stops(&route_list) {
        match resolve::resolve_machine(stop, true, conn)? {
            Some(resolution) => {
                db::car_log::blocking_queries::insert_stop(log.id, resolution.machine.id, position, conn)?;
                position += 1;
            }
            None => warn!(car_log_id = log.id, stop, "Unknown route stop"),
        }
    }
    info!(id = log.id, ?driver_id, stops = position, "Imported car log");
    Ok(true)
}
