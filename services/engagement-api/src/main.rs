use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use elosya_ledger::Ledger;
use engagement_api::{
    config::Config,
    handlers::{self, FeedLimit},
};
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    config
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    info!(
        "Starting Engagement API on {}:{}",
        config.server.host, config.server.port
    );

    let ledger = Arc::new(
        Ledger::open(config.ledger.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
    );
    let feed_limit = FeedLimit(config.server.max_feed_limit);

    let server_ledger = ledger.clone();
    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::Data::new(server_ledger.clone()))
            .app_data(web::Data::new(feed_limit))
            .app_data(handlers::json_config())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    ledger
        .shutdown()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    info!("Engagement API stopped");

    Ok(())
}
