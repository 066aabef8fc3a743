use std::io;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info, warn};

use attrition_scoring::config::{Config, LoadPolicy};
use attrition_scoring::{routes, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let state = web::Data::new(AppState::from_config(&config));
    match config.load_policy {
        LoadPolicy::Cached => match state.store.warm() {
            Ok(()) => info!("model artifact cached from {}", config.model_path.display()),
            Err(e) => warn!("model artifact not loaded at startup: {}", e),
        },
        LoadPolicy::PerRequest => info!(
            "model artifact {} is loaded on every request",
            config.model_path.display()
        ),
    }

    let bind_address = config.bind_address();
    let json_limit = config.json_limit;
    info!("scoring service listening on http://{}", bind_address);
    info!("workers: {}", config.workers);
    info!("   GET  /api/             - service identification");
    info!("   POST /api/Model/       - score one feature record");
    info!("   GET  /api/health       - liveness");
    info!("   GET  /api/model-info   - artifact and schema");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure(json_limit))
            .default_service(web::route().to(routes::not_found))
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await
}
