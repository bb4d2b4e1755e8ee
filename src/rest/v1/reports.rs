use crate::db;
use crate::rest::error::RestResult;
use crate::service::daily::{self, DailySummary};
use crate::service::report::{self, GroupBy, MonthlyReport, Summary};
use actix_web::get;
use actix_web::web::{Data, Json, Query};
use deadpool_sqlite::Pool;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

#[derive(Deserialize)]
pub struct SummaryArgs {
    machines: Option<String>,
    start: Date,
    end: Date,
    group_by: Option<GroupBy>,
}

#[derive(Deserialize)]
pub struct MonthlyArgs {
    month: Option<String>,
}

#[derive(Deserialize)]
pub struct DailyArgs {
    date: Option<Date>,
}

#[get("summary")]
pub async fn get_summary(args: Query<SummaryArgs>, pool: Data<Pool>) -> RestResult<Summary> {
    let args = args.into_inner();
    let summary = report::summarize_named_async(
        args.machines.unwrap_or_default(),
        args.start,
        args.end,
        args.group_by.unwrap_or_default(),
        &pool,
    )
    .await?;
    Ok(Json(summary))
}

#[get("months")]
pub async fn get_months(pool: Data<Pool>) -> RestResult<Vec<String>> {
    Ok(Json(db::visit_log::queries::select_months(&pool).await?))
}

#[get("monthly")]
pub async fn get_monthly(args: Query<MonthlyArgs>, pool: Data<Pool>) -> RestResult<MonthlyReport> {
    let today = OffsetDateTime::now_utc().date();
    let report = report::monthly_async(args.into_inner().month, today, &pool).await?;
    Ok(Json(report))
}

#[get("daily")]
pub async fn get_daily(args: Query<DailyArgs>, pool: Data<Pool>) -> RestResult<DailySummary> {
    let date = args.date.unwrap_or(OffsetDateTime::now_utc().date());
    Ok(Json(daily::daily_summary_async(date, &pool).await?))
}

#[cfg(test)]
mod test {
    use crate::db::{self, visit_log::schema::NewVisitLog};
    use crate::rest::error;
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data, QueryConfig};
    use actix_web::{test, App};
    use rusqlite::Connection;
    use serde_json::{json, Value};
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn visit(machine_id: i64, timestamp: OffsetDateTime, transactions: i64, conn: &Connection) -> Result<()> {
        db::visit_log::blocking_queries::insert(
            &NewVisitLog {
                machine_id,
                timestamp: Some(timestamp),
                transactions,
                ..Default::default()
            },
            conn,
        )?;
        Ok(())
    }

    #[test]
    async fn get_summary() -> Result<()> {
        let (pool, conn) = db::test::pool();
        let m1 = db::machine::blocking_queries::insert("M1", "", None, None, &conn)?;
        let m2 = db::machine::blocking_queries::insert("M2", "", None, None, &conn)?;
        visit(m1.id, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        visit(m1.id, datetime!(2024-01-02 10:00 UTC), 3, &conn)?;
        visit(m2.id, datetime!(2024-01-02 11:00 UTC), 10, &conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool))
                .app_data(QueryConfig::default().error_handler(error::query_error_handler))
                .service(scope("v1").service(scope("reports").service(super::get_summary))),
        )
        .await;
        let req = TestRequest::get()
            .uri("/v1/reports/summary?machines=all&start=2024-01-01&end=2024-01-31&group_by=machine")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(3, res["count"]);
        assert_eq!(18, res["total"]);
        assert_eq!(
            json!([
                { "machine_id": m1.id, "machine_name": "M1", "count": 2, "total": 8, "voids": 0, "void_percentage": 0.0 },
                { "machine_id": m2.id, "machine_name": "M2", "count": 1, "total": 10, "voids": 0, "void_percentage": 0.0 },
            ]),
            res["entries"],
        );
        let req = TestRequest::get()
            .uri("/v1/reports/summary?machines=m1&start=2024-01-01&end=2024-01-02&group_by=day")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(8, res["total"]);
        assert_eq!("2024-01-01", res["entries"][0]["date"]);
        assert_eq!("2024-01-01", res["start"]);
        Ok(())
    }

    #[test]
    async fn get_summary_invalid_range() -> Result<()> {
        let (pool, _conn) = db::test::pool();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool))
                .app_data(QueryConfig::default().error_handler(error::query_error_handler))
                .service(scope("v1").service(scope("reports").service(super::get_summary))),
        )
        .await;
        let req = TestRequest::get()
            .uri("/v1/reports/summary?start=2024-01-02&end=2024-01-01")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let body: Value = test::read_body_json(res).await;
        assert_eq!("invalid_range", body["code"]);
        let req = TestRequest::get()
            .uri("/v1/reports/summary?machines=nowhere&start=2024-01-01&end=2024-01-01")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let req = TestRequest::get().uri("/v1/reports/summary?start=yesterday&end=2024-01-01").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let body: Value = test::read_body_json(res).await;
        assert_eq!("invalid_input", body["code"]);
        Ok(())
    }

    #[test]
    async fn get_months_and_monthly() -> Result<()> {
        let (pool, conn) = db::test::pool();
        let m1 = db::machine::blocking_queries::insert("M1", "", None, None, &conn)?;
        visit(m1.id, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        visit(m1.id, datetime!(2024-03-01 10:00 UTC), 7, &conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool))
                .app_data(QueryConfig::default().error_handler(error::query_error_handler))
                .service(
                    scope("v1").service(
                        scope("reports")
                            .service(super::get_months)
                            .service(super::get_monthly),
                    ),
                ),
        )
        .await;
        let req = TestRequest::get().uri("/v1/reports/months").to_request();
        let res: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(vec!["2024-03", "2024-01"], res);
        let req = TestRequest::get().uri("/v1/reports/monthly").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("2024-03", res["month"]);
        assert_eq!(7, res["summary"]["total"]);
        let req = TestRequest::get().uri("/v1/reports/monthly?month=2024-01").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res["machines_visited"]);
        assert_eq!(5, res["summary"]["entries"][0]["total"]);
        Ok(())
    }

    #[test]
    async fn get_daily() -> Result<()> {
        let (pool, conn) = db::test::pool();
        let m1 = db::machine::blocking_queries::insert("M1", "", None, None, &conn)?;
        visit(m1.id, datetime!(2024-01-01 10:00 UTC), 5, &conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool))
                .app_data(QueryConfig::default().error_handler(error::query_error_handler))
                .service(scope("v1").service(scope("reports").service(super::get_daily))),
        )
        .await;
        let req = TestRequest::get().uri("/v1/reports/daily?date=2024-01-01").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res["total_machines"]);
        assert_eq!(1, res["visited_count"]);
        assert_eq!(5, res["machines"][0]["visit"]["transactions"]);
        Ok(())
    }
}
