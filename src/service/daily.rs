use crate::db::{self, car_log::schema::TripStop, visit_log::schema::VisitLog};
use crate::Result;
use deadpool_sqlite::Pool;
use geo::{Distance, Haversine, Point};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: Date,
    pub total_machines: usize,
    pub visited_count: usize,
    pub car_visited_count: usize,
    pub issues_count: usize,
    pub machines: Vec<DailyMachine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMachine {
    pub machine_id: i64,
    pub machine_name: String,
    pub visit: Option<DailyVisit>,
    pub car_stops: Vec<DailyCarStop>,
    pub car_issues: String,
    pub has_issue: bool,
    pub distance_meters: Option<f64>,
    pub distance_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVisit {
    pub id: i64,
    pub operator_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub transactions: i64,
    pub voids: i64,
    pub void_percentage: f64,
    pub visit_location: String,
    pub machine_issue: String,
    pub product_issue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCarStop {
    pub car_log_id: i64,
    pub position: i64,
    pub driver_name: Option<String>,
}

impl From<&VisitLog> for DailyVisit {
    fn from(log: &VisitLog) -> Self {
        DailyVisit {
            id: log.id,
            operator_id: log.operator_id,
            timestamp: log.timestamp,
            transactions: log.transactions,
            voids: log.voids,
            void_percentage: log.void_percentage,
            visit_location: log.visit_location.clone(),
            machine_issue: log.machine_issue.clone(),
            product_issue: log.product_issue.clone(),
        }
    }
}

/// Every active machine with what happened to it on `date`: operator visit, driver stops, reported issues.
pub fn daily_summary(date: Date, conn: &Connection) -> Result<DailySummary> {
    let machines = db::machine::blocking_queries::select_active(conn)?;
    // Ordered by time, so the latest visit of the day wins
    let visits: HashMap<i64, VisitLog> =
        db::visit_log::blocking_queries::select_between(None, date, date, conn)?
            .into_iter()
            .map(|it| (it.machine_id, it))
            .collect();
    let mut stops: HashMap<i64, Vec<TripStop>> = HashMap::new();
    for stop in db::car_log::blocking_queries::select_stops_by_trip_date(date, conn)? {
        stops.entry(stop.machine_id).or_default().push(stop);
    }
    let mut summary = DailySummary {
        date,
        total_machines: machines.len(),
        visited_count: 0,
        car_visited_count: 0,
        issues_count: 0,
        machines: vec![],
    };
    for machine in machines {
        let visit = visits.get(&machine.id);
        let machine_stops = stops.remove(&machine.id).unwrap_or_default();
        let has_issue = visit.is_some_and(VisitLog::has_issue);
        let distance_meters = visit
            .and_then(|it| parse_coords(&it.visit_location))
            .zip(machine.coords())
            .map(|(visit, machine)| distance_meters(machine, visit));
        if visit.is_some() {
            summary.visited_count += 1;
        }
        if !machine_stops.is_empty() {
            summary.car_visited_count += 1;
        }
        if has_issue {
            summary.issues_count += 1;
        }
        summary.machines.push(DailyMachine {
            machine_id: machine.id,
            machine_name: machine.name,
            visit: visit.map(DailyVisit::from),
            car_issues: car_issues(&machine_stops),
            car_stops: machine_stops
                .into_iter()
                .map(|it| DailyCarStop {
                    car_log_id: it.car_log_id,
                    position: it.position,
                    driver_name: it.driver_name,
                })
                .collect(),
            has_issue,
            distance_meters,
            distance_display: distance_meters.map(format_distance).unwrap_or_default(),
        });
    }
    Ok(summary)
}

pub async fn daily_summary_async(date: Date, pool: &Pool) -> Result<DailySummary> {
    pool.get()
        .await?
        .interact(move |conn| daily_summary(date, conn))
        .await?
}

// Distinct non-empty trip issues, in route order
fn car_issues(stops: &[TripStop]) -> String {
    let mut issues: Vec<&str> = vec![];
    for stop in stops {
        let text = stop.issues.trim();
        if !text.is_empty() && !issues.contains(&text) {
            issues.push(text);
        }
    }
    issues.join("; ")
}

/// Parses a `"lat, lon"` pair as typed into the visit sheet.
pub fn parse_coords(location: &str) -> Option<(f64, f64)> {
    let (lat, lon) = location.trim().split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some((lat, lon))
}

pub fn distance_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    Haversine::distance(Point::new(from.1, from.0), Point::new(to.1, to.0))
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0}m")
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
