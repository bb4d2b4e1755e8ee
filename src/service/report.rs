use crate::db::{self, machine::schema::Machine, visit_log::schema::VisitLog};
use crate::{Error, Result};
use deadpool_sqlite::Pool;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::{Date, Month, UtcOffset};
use tracing::debug;

/// Which machines a summary covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineSelector {
    All,
    Machines(Vec<i64>),
}

impl MachineSelector {
    /// Parses `all` or a comma separated list of machine ids, names or aliases.
    pub fn resolve(raw: &str, conn: &Connection) -> Result<MachineSelector> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(MachineSelector::All);
        }
        let mut ids = vec![];
        for token in raw.split(',').map(str::trim).filter(|it| !it.is_empty()) {
            let id = match token.parse::<i64>() {
                Ok(id) => id,
                Err(_) => match db::machine::blocking_queries::select_by_name(token, conn)? {
                    Some(machine) => machine.id,
                    None => db::machine_alias::blocking_queries::select_by_alias(token, conn)?
                        .map(|it| it.machine_id)
                        .ok_or_else(|| Error::InvalidRange(format!("unknown machine: {token}")))?,
                },
            };
            ids.push(id);
        }
        Ok(MachineSelector::Machines(ids))
    }
}

/// Inclusive range of UTC calendar dates, `start <= end` holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<DateRange> {
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(DateRange { start, end })
    }

    /// Whole calendar month given as `YYYY-MM`.
    pub fn month(month: &str) -> Result<DateRange> {
        let invalid = || Error::InvalidInput(format!("invalid month: {month}, expected YYYY-MM"));
        let (year, month) = month.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let start = Date::from_calendar_date(year, month, 1)?;
        let end = Date::from_calendar_date(year, month, month.length(year))?;
        DateRange::new(start, end)
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    Machine,
    Day,
    MachineDay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub start: Date,
    pub end: Date,
    pub group_by: GroupBy,
    pub count: i64,
    pub total: i64,
    pub voids: i64,
    pub void_percentage: f64,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    pub count: i64,
    pub total: i64,
    pub voids: i64,
    pub void_percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    count: i64,
    total: i64,
    voids: i64,
}

impl Totals {
    fn add(&mut self, record: &VisitLog) -> Result<()> {
        let overflow = || Error::Generic(format!("totals overflow at visit log {}", record.id));
        self.count = self.count.checked_add(1).ok_or_else(overflow)?;
        self.total = self
            .total
            .checked_add(record.transactions)
            .ok_or_else(overflow)?;
        self.voids = self.voids.checked_add(record.voids).ok_or_else(overflow)?;
        Ok(())
    }

    fn void_percentage(&self) -> f64 {
        db::visit_log::schema::void_percentage(self.voids, self.total)
    }
}

/// Read-only access to the records a summary is built from.
pub trait RecordSource {
    /// Existing machines among `ids`, ordered by id.
    fn machines_by_ids(&self, ids: &[i64]) -> Result<Vec<Machine>>;

    fn all_machines(&self) -> Result<Vec<Machine>>;

    /// Records dated within `range`, ordered by machine then timestamp. `None` means every machine.
    fn records(&self, machine_ids: Option<&[i64]>, range: &DateRange) -> Result<Vec<VisitLog>>;
}

impl RecordSource for Connection {
    fn machines_by_ids(&self, ids: &[i64]) -> Result<Vec<Machine>> {
        db::machine::blocking_queries::select_by_ids(ids, self)
    }

    fn all_machines(&self) -> Result<Vec<Machine>> {
        db::machine::blocking_queries::select_all(self)
    }

    fn records(&self, machine_ids: Option<&[i64]>, range: &DateRange) -> Result<Vec<VisitLog>> {
        db::visit_log::blocking_queries::select_between(machine_ids, range.start, range.end, self)
    }
}

pub fn summarize(
    selector: &MachineSelector,
    start: Date,
    end: Date,
    group_by: GroupBy,
    source: &impl RecordSource,
) -> Result<Summary> {
    let range = &DateRange::new(start, end)?;
    let (machines, records) = match selector {
        MachineSelector::All => {
            let records = source.records(None, range)?;
            (source.all_machines()?, records)
        }
        MachineSelector::Machines(ids) => {
            let mut ids = ids.clone();
            ids.sort_unstable();
            ids.dedup();
            if ids.is_empty() {
                return Err(Error::InvalidRange("machine selector is empty".into()));
            }
            let machines = source.machines_by_ids(&ids)?;
            if machines.len() != ids.len() {
                let unknown: Vec<String> = ids
                    .iter()
                    .filter(|id| !machines.iter().any(|m| m.id == **id))
                    .map(|id| id.to_string())
                    .collect();
                return Err(Error::InvalidRange(format!(
                    "unknown machine ids: {}",
                    unknown.join(", ")
                )));
            }
            let records = source.records(Some(&ids), range)?;
            (machines, records)
        }
    };
    debug!(
        start = %range.start,
        end = %range.end,
        records = records.len(),
        "Aggregating summary",
    );
    aggregate(range, group_by, &machines, &records)
}

fn aggregate(
    range: &DateRange,
    group_by: GroupBy,
    machines: &[Machine],
    records: &[VisitLog],
) -> Result<Summary> {
    let names: HashMap<i64, &str> = machines.iter().map(|it| (it.id, it.name.as_str())).collect();
    let mut totals = Totals::default();
    let mut groups: BTreeMap<(Option<i64>, Option<Date>), Totals> = BTreeMap::new();
    for record in records {
        let date = record.timestamp.to_offset(UtcOffset::UTC).date();
        // Sources are trusted to filter, but a stray row must never leak into totals
        if date < range.start || date > range.end {
            continue;
        }
        totals.add(record)?;
        let key = match group_by {
            GroupBy::None => continue,
            GroupBy::Machine => (Some(record.machine_id), None),
            GroupBy::Day => (None, Some(date)),
            GroupBy::MachineDay => (Some(record.machine_id), Some(date)),
        };
        groups.entry(key).or_default().add(record)?;
    }
    let entries = groups
        .into_iter()
        .map(|((machine_id, date), group)| SummaryEntry {
            machine_id,
            machine_name: machine_id
                .and_then(|id| names.get(&id))
                .map(|name| name.to_string()),
            date,
            count: group.count,
            total: group.total,
            voids: group.voids,
            void_percentage: group.void_percentage(),
        })
        .collect();
    Ok(Summary {
        start: range.start,
        end: range.end,
        group_by,
        count: totals.count,
        total: totals.total,
        voids: totals.voids,
        void_percentage: totals.void_percentage(),
        entries,
    })
}

/// [summarize] with the selector given as `all` or machine ids, names and aliases.
pub async fn summarize_named_async(
    machines: String,
    start: Date,
    end: Date,
    group_by: GroupBy,
    pool: &Pool,
) -> Result<Summary> {
    // Fail fast, an invalid range must not even borrow a connection
    DateRange::new(start, end)?;
    pool.get()
        .await?
        .interact(move |conn| {
            let selector = MachineSelector::resolve(&machines, conn)?;
            summarize(&selector, start, end, group_by, &*conn)
        })
        .await?
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: String,
    pub machines_visited: usize,
    pub summary: Summary,
}

pub fn available_months(conn: &Connection) -> Result<Vec<String>> {
    db::visit_log::blocking_queries::select_months(conn)
}

/// `month` if given, else the newest month with data, else the month of `today`.
pub fn selected_month(month: Option<&str>, today: Date, conn: &Connection) -> Result<String> {
    Ok(match month.map(str::trim).filter(|it| !it.is_empty()) {
        Some(month) => month.to_string(),
        None => match available_months(conn)?.into_iter().next() {
            Some(newest) => newest,
            None => format!("{:04}-{:02}", today.year(), today.month() as u8),
        },
    })
}

/// Per machine summary for the selected month.
pub fn monthly(month: Option<&str>, today: Date, conn: &Connection) -> Result<MonthlyReport> {
    let month = selected_month(month, today, conn)?;
    let range = DateRange::month(&month)?;
    let summary = summarize(
        &MachineSelector::All,
        range.start(),
        range.end(),
        GroupBy::Machine,
        conn,
    )?;
    Ok(MonthlyReport {
        month,
        machines_visited: summary.entries.len(),
        summary,
    })
}

pub async fn monthly_async(month: Option<String>, today: Date, pool: &Pool) -> Result<MonthlyReport> {
    pool.get()
        .await?
        .interact(move |conn| monthly(month.as_deref(), today, conn))
        .await?
}

#[cfg(test)]
mod test {
    use super::{DateRange, GroupBy, MachineSelector, RecordSource};
    use crate::db::{self, machine::schema::Machine, test::conn, visit_log::schema::{NewVisitLog, VisitLog}};
    use crate::{Error, Result};
    use rusqlite::Connection;
    use std::cell::Cell;
    use time::macros::{date, datetime};
    use time::OffsetDateTime;

    fn machine(name: &str, conn: &Connection) -> Result<i64> {
        Ok(db::machine::blocking_queries::insert(name, "", None, None, conn)?.id)
    }

    fn visit(machine_id: i64, timestamp: OffsetDateTime, transactions: i64, conn: &Connection) -> Result<VisitLog> {
        db::visit_log::blocking_queries::insert(
            &NewVisitLog {
                machine_id,
                timestamp: Some(timestamp),
                transactions,
                ..Default::default()
            },
            conn,
        )
    }

    // Counts every call so tests can assert that no data was touched
    #[derive(Default)]
    struct CountingSource {
        calls: Cell<usize>,
    }

    impl RecordSource for CountingSource {
        fn machines_by_ids(&self, _ids: &[i64]) -> Result<Vec<Machine>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![])
        }

        fn all_machines(&self) -> Result<Vec<Machine>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![])
        }

        fn records(&self, _machine_ids: Option<&[i64]>, _range: &DateRange) -> Result<Vec<VisitLog>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![])
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn machines_by_ids(&self, _ids: &[i64]) -> Result<Vec<Machine>> {
            Err(rusqlite::Error::InvalidQuery.into())
        }

        fn all_machines(&self) -> Result<Vec<Machine>> {
            Err(rusqlite::Error::InvalidQuery.into())
        }

        fn records(&self, _machine_ids: Option<&[i64]>, _range: &DateRange) -> Result<Vec<VisitLog>> {
            Err(rusqlite::Error::InvalidQuery.into())
        }
    }

    #[test]
    fn single_machine_two_days() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        visit(m1, datetime!(2024-01-02 10:00 UTC), 3, &conn)?;
        let selector = MachineSelector::Machines(vec![m1]);
        let summary = super::summarize(
            &selector,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 02),
            GroupBy::None,
            &conn,
        )?;
        assert_eq!(2, summary.count);
        assert_eq!(8, summary.total);
        let summary = super::summarize(
            &selector,
            date!(2024 - 01 - 03),
            date!(2024 - 01 - 04),
            GroupBy::None,
            &conn,
        )?;
        assert_eq!(0, summary.count);
        assert_eq!(0, summary.total);
        assert!(summary.entries.is_empty());
        Ok(())
    }

    #[test]
    fn all_machines_grouped_by_machine() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m2, datetime!(2024-01-01 08:00 UTC), 10, &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        visit(m1, datetime!(2024-01-02 10:00 UTC), 3, &conn)?;
        let summary = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 31),
            GroupBy::Machine,
            &conn,
        )?;
        assert_eq!(18, summary.total);
        assert_eq!(2, summary.entries.len());
        assert_eq!(Some(m1), summary.entries[0].machine_id);
        assert_eq!(Some("M1".to_string()), summary.entries[0].machine_name);
        assert_eq!(8, summary.entries[0].total);
        assert_eq!(Some(m2), summary.entries[1].machine_id);
        assert_eq!(10, summary.entries[1].total);
        Ok(())
    }

    #[test]
    fn grouped_by_machine_day_is_ordered() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m2, datetime!(2024-01-01 08:00 UTC), 1, &conn)?;
        visit(m1, datetime!(2024-01-02 10:00 UTC), 2, &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), 3, &conn)?;
        visit(m1, datetime!(2024-01-01 12:00 UTC), 4, &conn)?;
        let summary = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 02),
            GroupBy::MachineDay,
            &conn,
        )?;
        let keys: Vec<_> = summary
            .entries
            .iter()
            .map(|it| (it.machine_id, it.date, it.count, it.total))
            .collect();
        assert_eq!(
            vec![
                (Some(m1), Some(date!(2024 - 01 - 01)), 2, 7),
                (Some(m1), Some(date!(2024 - 01 - 02)), 1, 2),
                (Some(m2), Some(date!(2024 - 01 - 01)), 1, 1),
            ],
            keys,
        );
        Ok(())
    }

    #[test]
    fn grouped_by_day() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m1, datetime!(2024-01-02 10:00 UTC), 2, &conn)?;
        visit(m2, datetime!(2024-01-02 11:00 UTC), 3, &conn)?;
        visit(m2, datetime!(2024-01-01 11:00 UTC), 1, &conn)?;
        let summary = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 02),
            GroupBy::Day,
            &conn,
        )?;
        assert_eq!(2, summary.entries.len());
        assert_eq!(Some(date!(2024 - 01 - 01)), summary.entries[0].date);
        assert_eq!(None, summary.entries[0].machine_id);
        assert_eq!(1, summary.entries[0].total);
        assert_eq!(5, summary.entries[1].total);
        Ok(())
    }

    #[test]
    fn void_percentage() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        db::visit_log::blocking_queries::insert(
            &NewVisitLog {
                machine_id: m1,
                timestamp: Some(datetime!(2024-01-01 10:00 UTC)),
                transactions: 30,
                voids: 3,
                ..Default::default()
            },
            &conn,
        )?;
        visit(m1, datetime!(2024-01-02 10:00 UTC), 10, &conn)?;
        let summary = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 02),
            GroupBy::None,
            &conn,
        )?;
        assert_eq!(3, summary.voids);
        assert_eq!(7.5, summary.void_percentage);
        Ok(())
    }

    #[test]
    fn inverted_range_touches_no_data() {
        let source = CountingSource::default();
        let res = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 02),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &source,
        );
        assert!(matches!(res, Err(Error::InvalidRange(_))));
        assert_eq!(0, source.calls.get());
    }

    #[test]
    fn empty_selector_touches_no_data() {
        let source = CountingSource::default();
        let res = super::summarize(
            &MachineSelector::Machines(vec![]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &source,
        );
        assert!(matches!(res, Err(Error::InvalidRange(_))));
        assert_eq!(0, source.calls.get());
    }

    #[test]
    fn unknown_machine_is_invalid_range() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let res = super::summarize(
            &MachineSelector::Machines(vec![m1, m1 + 100]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &conn,
        );
        assert!(matches!(res, Err(Error::InvalidRange(_))));
        Ok(())
    }

    #[test]
    fn data_access_error_is_propagated() {
        let res = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &FailingSource,
        );
        assert!(res.is_err_and(|e| e.is_data_access()));
    }

    #[test]
    fn identical_output_on_repeat() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        visit(m2, datetime!(2024-01-03 10:00 UTC), 7, &conn)?;
        let run = || {
            super::summarize(
                &MachineSelector::All,
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 31),
                GroupBy::MachineDay,
                &conn,
            )
        };
        assert_eq!(serde_json::to_string(&run()?)?, serde_json::to_string(&run()?)?);
        Ok(())
    }

    #[test]
    fn adjacent_ranges_add_up() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m1, datetime!(2024-01-01 00:00 UTC), 5, &conn)?;
        visit(m2, datetime!(2024-01-10 23:59:59 UTC), 4, &conn)?;
        visit(m1, datetime!(2024-01-11 00:00 UTC), 3, &conn)?;
        visit(m2, datetime!(2024-01-31 12:00 UTC), 2, &conn)?;
        let summarize = |start, end| {
            super::summarize(&MachineSelector::All, start, end, GroupBy::None, &conn)
        };
        let full = summarize(date!(2024 - 01 - 01), date!(2024 - 01 - 31))?;
        let first = summarize(date!(2024 - 01 - 01), date!(2024 - 01 - 10))?;
        let second = summarize(date!(2024 - 01 - 11), date!(2024 - 01 - 31))?;
        assert_eq!(full.count, first.count + second.count);
        assert_eq!(full.total, first.total + second.total);
        assert_eq!(full.voids, first.voids + second.voids);
        assert_eq!(4, full.count);
        assert_eq!(14, full.total);
        Ok(())
    }

    #[test]
    fn selector_resolve() -> Result<()> {
        let conn = conn();
        let m1 = machine("Mall Entrance", &conn)?;
        let m2 = machine("Gym", &conn)?;
        db::machine_alias::blocking_queries::insert(
            "gym 2nd floor",
            m2,
            db::machine_alias::schema::AliasSource::Manual,
            1.0,
            &conn,
        )?;
        assert_eq!(MachineSelector::All, MachineSelector::resolve("all", &conn)?);
        assert_eq!(MachineSelector::All, MachineSelector::resolve(" ", &conn)?);
        assert_eq!(
            MachineSelector::Machines(vec![m1, m2, 7]),
            MachineSelector::resolve("mall entrance, Gym 2nd Floor,7", &conn)?
        );
        assert!(matches!(
            MachineSelector::resolve("nowhere", &conn),
            Err(Error::InvalidRange(_))
        ));
        Ok(())
    }

    #[test]
    fn month_range() -> Result<()> {
        let range = DateRange::month("2024-02")?;
        assert_eq!(date!(2024 - 02 - 01), range.start());
        assert_eq!(date!(2024 - 02 - 29), range.end());
        assert!(matches!(DateRange::month("2024-13"), Err(Error::InvalidInput(_))));
        assert!(matches!(DateRange::month("feb"), Err(Error::InvalidInput(_))));
        Ok(())
    }

    #[test]
    fn monthly() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        let m2 = machine("M2", &conn)?;
        visit(m1, datetime!(2024-01-05 10:00 UTC), 5, &conn)?;
        visit(m1, datetime!(2024-02-05 10:00 UTC), 3, &conn)?;
        visit(m2, datetime!(2024-02-06 10:00 UTC), 4, &conn)?;
        let report = super::monthly(None, date!(2024 - 06 - 01), &conn)?;
        assert_eq!("2024-02", report.month);
        assert_eq!(2, report.machines_visited);
        assert_eq!(7, report.summary.total);
        let report = super::monthly(Some("2024-01"), date!(2024 - 06 - 01), &conn)?;
        assert_eq!(1, report.machines_visited);
        assert_eq!(5, report.summary.total);
        Ok(())
    }

    #[test]
    fn monthly_without_data_uses_today() -> Result<()> {
        let conn = conn();
        let report = super::monthly(None, date!(2024 - 06 - 15), &conn)?;
        assert_eq!("2024-06", report.month);
        assert_eq!(0, report.summary.count);
        Ok(())
    }

    #[actix_web::test]
    async fn summarize_named_async() -> Result<()> {
        let (pool, conn) = db::test::pool();
        let m1 = machine("M1", &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        let summary = super::summarize_named_async(
            "m1".into(),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 01),
            GroupBy::Machine,
            &pool,
        )
        .await?;
        assert_eq!(5, summary.total);
        let res = super::summarize_named_async(
            "m1".into(),
            date!(2024 - 01 - 02),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &pool,
        )
        .await;
        assert!(matches!(res, Err(Error::InvalidRange(_))));
        Ok(())
    }

    #[test]
    fn totals_overflow_is_an_error() -> Result<()> {
        let conn = conn();
        let m1 = machine("M1", &conn)?;
        visit(m1, datetime!(2024-01-01 10:00 UTC), i64::MAX, &conn)?;
        visit(m1, datetime!(2024-01-01 11:00 UTC), i64::MAX, &conn)?;
        let res = super::summarize(
            &MachineSelector::All,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 01),
            GroupBy::None,
            &conn,
        );
        assert!(matches!(res, Err(Error::Generic(_))));
        Ok(())
    }
}
