use crate::conf::Conf;
use crate::rest::{error, v1};
use crate::{db, Result};
use actix_web::dev::Service;
use actix_web::web::{scope, JsonConfig, QueryConfig};
use actix_web::{
    middleware::{Compress, NormalizePath},
    web::Data,
    App, HttpServer,
};
use futures_util::future::FutureExt;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

const SLOW_REQUEST_SEC: f64 = 5.0;

pub async fn run(conf: &Conf) -> Result<()> {
    // All the worker threads are sharing a single connection pool
    let pool = Arc::new(db::pool(conf)?);
    info!(bind = %conf.bind, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_query_string = req.query_string().to_string();
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_time = OffsetDateTime::now_utc();
                let req_ip = req
                    .connection_info()
                    .peer_addr()
                    .unwrap_or_default()
                    .to_string();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        let res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64();
                        if res_time_sec > SLOW_REQUEST_SEC {
                            info!(
                                req_query_string,
                                req_method,
                                req_path,
                                req_ip,
                                res_status,
                                res_time_sec,
                                "Slow request",
                            );
                        }
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::from(pool.clone()))
            .app_data(QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(JsonConfig::default().error_handler(error::json_error_handler))
            .service(
                scope("v1")
                    .service(
                        scope("machines")
                            .service(v1::machines::get)
                            .service(v1::machines::get_by_id)
                            .service(v1::machines::get_visits),
                    )
                    .service(
                        scope("reports")
                            .service(v1::reports::get_summary)
                            .service(v1::reports::get_months)
                            .service(v1::reports::get_monthly)
                            .service(v1::reports::get_daily),
                    )
                    .service(
                        scope("operators")
                            .service(v1::operators::get)
                            .service(v1::operators::get_by_id)
                            .service(v1::operators::put_rating),
                    ),
            )
    })
    .bind(conf.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
