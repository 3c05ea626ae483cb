use crate::config::config::Config;
use crate::model::response::Response;
use crate::repository::database::Database;
use crate::repository::Store;
use crate::util::real_ip_key_extractor::RealIpKeyExtractor;
use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder};
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder, Result};
use log::info;
use std::io;
use std::sync::Arc;

mod config;
mod controller;
mod model;
mod repository;
mod service;
mod util;

#[get("/health")]
async fn health_check() -> impl Responder {
    let response = Response {
        status: "Success".to_string(),
        message: "Everything is working as expected".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found() -> Result<HttpResponse> {
    let response = Response {
        status: "Failed".to_string(),
        message: "Resource not found".to_string(),
    };
    Ok(HttpResponse::NotFound().json(response))
}

pub struct AppState {
    store: Arc<dyn Store>,
}

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

/// One token every `1000 / RATE_LIMIT_PER_SECOND` ms, up to `RATE_LIMIT_BURST`
/// queued per client.
fn rate_limiter(config: &Config) -> io::Result<GovernorConfig<RealIpKeyExtractor, NoOpMiddleware>> {
    GovernorConfigBuilder::default()
        .per_millisecond(config.replenish_interval_ms())
        .burst_size(config.rate_limit_burst)
        .key_extractor(RealIpKeyExtractor::new(config.trusted_proxy_ip))
        .finish()
        .ok_or_else(|| startup_error("rate limit period and burst size must be non-zero"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::init().map_err(startup_error)?;
    log4rs::init_file(&config.log_config, Default::default()).map_err(startup_error)?;

    let db = Database::new(&config).map_err(startup_error)?;
    let app_data = web::Data::new(AppState {
        store: Arc::new(db),
    });

    let governor_conf = rate_limiter(&config)?;

    info!("league admin listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(controller::handler::config)
            .service(health_check)
            .default_service(web::route().to(not_found))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(Governor::new(&governor_conf))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
