mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod scraper;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::records::ScrapeSettings;
use crate::config::AppConfig;
use crate::scraper::{ChromiumLauncher, PortalScraper};
use crate::services::{MongoRecordStore, RecordService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    log::info!("🚀 Starting Student Record Service...");
    log::info!("🌍 Portal login page: {}", config.login_url);
    log::info!("🖥️  Browser launch profile: {:?}", config.browser.profile);

    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to MongoDB: {}", e)))?;
    log::info!("✅ MongoDB connected successfully");

    let launcher = Arc::new(ChromiumLauncher::new(&config.browser));
    let scraper = Arc::new(PortalScraper::new(launcher, config.login_url.clone()));
    let store = Arc::new(MongoRecordStore::new(db));

    let service = web::Data::new(RecordService::new(store, scraper, config.cache_ttl));
    let settings = web::Data::new(ScrapeSettings {
        default_username: config.default_username.clone(),
    });

    jobs::cache_janitor::start_cache_janitor(service.clone(), config.cache_ttl);

    let host = config.host.clone();
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = if allowed_origins.is_empty() {
            Cors::default().allow_any_origin()
        } else {
            allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        }
        .allowed_methods(vec!["GET", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(service.clone())
            .app_data(settings.clone())
            .wrap(cors)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .route("/scrape", web::get().to(api::records::scrape))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
