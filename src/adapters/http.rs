//! ESP-IDF HTTP server adapter.
//!
//! Registers one GET handler per [`Route`] and forwards every request to
//! [`TelemetryQuery::dispatch`].  The export is written chunk by chunk so
//! the whole log is never rendered into one buffer.

use std::sync::Arc;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::io::Write;
use log::info;

use crate::api::{self, Reply, Route, TelemetryQuery};

/// Renders the I2C scan report on demand.
pub type ScanFn = Arc<dyn Fn() -> String + Send + Sync>;

const HTTP_STACK_SIZE: usize = 10 * 1024;

pub fn start(query: TelemetryQuery, scan: ScanFn) -> anyhow::Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&Configuration {
        stack_size: HTTP_STACK_SIZE,
        ..Default::default()
    })?;

    for route in Route::ALL {
        let query = query.clone();
        let scan = scan.clone();
        server.fn_handler(route.path(), Method::Get, move |req| -> anyhow::Result<()> {
            let uri = req.uri().to_owned();
            match query.dispatch(&uri, || scan()) {
                Reply::Json(body) => {
                    let mut resp = req.into_response(
                        200,
                        None,
                        &[
                            ("Content-Type", "application/json"),
                            ("Cache-Control", "no-store"),
                        ],
                    )?;
                    resp.write_all(body.as_bytes())?;
                }
                Reply::Text(body) => {
                    let mut resp =
                        req.into_response(200, None, &[("Content-Type", "text/plain")])?;
                    resp.write_all(body.as_bytes())?;
                }
                Reply::Export(chunks) => {
                    let mut resp = req.into_response(
                        200,
                        None,
                        &[
                            ("Content-Type", api::EXPORT_CONTENT_TYPE),
                            ("Content-Disposition", api::EXPORT_DISPOSITION),
                        ],
                    )?;
                    for chunk in chunks {
                        resp.write_all(chunk.as_bytes())?;
                    }
                }
                Reply::NotFound => {
                    req.into_status_response(404)?.write_all(b"Not found")?;
                }
            }
            Ok(())
        })?;
    }

    info!("HTTP: server started ({} routes)", Route::ALL.len());
    Ok(server)
}
