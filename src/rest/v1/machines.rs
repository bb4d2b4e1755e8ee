use crate::db;
use crate::db::machine::schema::Machine;
use crate::db::machine_alias::schema::MachineAlias;
use crate::db::visit_log::schema::VisitLog;
use crate::rest::error::RestResult;
use crate::service::report::DateRange;
use actix_web::get;
use actix_web::web::{Data, Json, Path, Query};
use deadpool_sqlite::Pool;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// Without a month filter only the latest visits are returned
const LATEST_VISITS_LIMIT: i64 = 50;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub location: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Machine> for Item {
    fn from(val: Machine) -> Self {
        Item {
            id: val.id,
            name: val.name,
            code: val.code,
            location: val.location,
            lat: val.lat,
            lon: val.lon,
            active: val.active,
            created_at: val.created_at,
            updated_at: val.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct AliasItem {
    pub alias: String,
    pub source: String,
    pub confidence: f64,
}

impl From<MachineAlias> for AliasItem {
    fn from(val: MachineAlias) -> Self {
        AliasItem {
            alias: val.alias,
            source: val.source.to_string(),
            confidence: val.confidence,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct DetailItem {
    #[serde(flatten)]
    pub machine: Item,
    pub aliases: Vec<AliasItem>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct VisitItem {
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
    pub comments: String,
    pub raw_machine_name: String,
}

impl From<VisitLog> for VisitItem {
    fn from(val: VisitLog) -> Self {
        VisitItem {
            id: val.id,
            operator_id: val.operator_id,
            timestamp: val.timestamp,
            transactions: val.transactions,
            voids: val.voids,
            void_percentage: val.void_percentage,
            visit_location: val.visit_location,
            machine_issue: val.machine_issue,
            product_issue: val.product_issue,
            comments: val.comments,
            raw_machine_name: val.raw_machine_name,
        }
    }
}

#[derive(Deserialize)]
pub struct VisitsArgs {
    month: Option<String>,
}

#[get("")]
pub async fn get(pool: Data<Pool>) -> RestResult<Vec<Item>> {
    let machines = db::machine::queries::select_all(&pool).await?;
    Ok(Json(machines.into_iter().map(Into::into).collect()))
}

#[get("{id}")]
pub async fn get_by_id(id: Path<i64>, pool: Data<Pool>) -> RestResult<DetailItem> {
    let machine = db::machine::queries::select_by_id(id.into_inner(), &pool).await?;
    let aliases = db::machine_alias::queries::select_by_machine_id(machine.id, &pool).await?;
    Ok(Json(DetailItem {
        machine: machine.into(),
        aliases: aliases.into_iter().map(Into::into).collect(),
    }))
}

#[get("{id}/visits")]
pub async fn get_visits(
    id: Path<i64>,
    args: Query<VisitsArgs>,
    pool: Data<Pool>,
) -> RestResult<Vec<VisitItem>> {
    let machine = db::machine::queries::select_by_id(id.into_inner(), &pool).await?;
    let (range, limit) = match args.month.as_deref() {
        Some(month) => {
            let range = DateRange::month(month)?;
            (Some((range.start(), range.end())), None)
        }
        None => (None, Some(LATEST_VISITS_LIMIT)),
    };
    let visits = db::visit_log::queries::select_by_machine_id(machine.id, range, limit, &pool).await?;
    Ok(Json(visits.into_iter().map(Into::into).collect()))
}
