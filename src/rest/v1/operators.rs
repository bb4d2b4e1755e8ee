use crate::rest::error::RestResult;
use crate::rest::v1::machines::VisitItem;
use crate::service::operator::{self, OperatorStats};
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, put};
use deadpool_sqlite::Pool;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

#[derive(Deserialize)]
pub struct MonthArgs {
    month: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ListItem {
    pub month: String,
    pub available_months: Vec<String>,
    pub operators: Vec<OperatorStatsItem>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct OperatorStatsItem {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub driver: bool,
    pub visit_count: i64,
    pub machine_count: i64,
    pub today_rating: Option<i64>,
}

impl From<OperatorStats> for OperatorStatsItem {
    fn from(val: OperatorStats) -> Self {
        OperatorStatsItem {
            id: val.id,
            name: val.name,
            code: val.code,
            driver: val.driver,
            visit_count: val.visit_count,
            machine_count: val.machine_count,
            today_rating: val.today_rating,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct DetailItem {
    pub month: String,
    #[serde(flatten)]
    pub stats: OperatorStatsItem,
    pub visits: Vec<VisitItem>,
}

#[derive(Deserialize)]
pub struct RatingArgs {
    rating: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct RatingItem {
    pub operator_id: i64,
    pub date: Date,
    pub rating: i64,
}

#[get("")]
pub async fn get(args: Query<MonthArgs>, pool: Data<Pool>) -> RestResult<ListItem> {
    let today = OffsetDateTime::now_utc().date();
    let res = operator::month_stats_async(args.into_inner().month, today, &pool).await?;
    Ok(Json(ListItem {
        month: res.month,
        available_months: res.available_months,
        operators: res.operators.into_iter().map(Into::into).collect(),
    }))
}

#[get("{id}")]
pub async fn get_by_id(
    id: Path<i64>,
    args: Query<MonthArgs>,
    pool: Data<Pool>,
) -> RestResult<DetailItem> {
    let today = OffsetDateTime::now_utc().date();
    let res =
        operator::detail_async(id.into_inner(), args.into_inner().month, today, &pool).await?;
    Ok(Json(DetailItem {
        month: res.month,
        stats: res.stats.into(),
        visits: res.recent_visits.into_iter().map(Into::into).collect(),
    }))
}

#[put("{id}/rating")]
pub async fn put_rating(
    id: Path<i64>,
    args: Json<RatingArgs>,
    pool: Data<Pool>,
) -> RestResult<RatingItem> {
    let today = OffsetDateTime::now_utc().date();
    let rating = operator::rate_async(id.into_inner(), today, args.rating, &pool).await?;
    Ok(Json(RatingItem {
        operator_id: rating.operator_id,
        date: rating.date,
        rating: rating.rating,
    }))
}
