//! WebAR Backend
//!
//! Backend API for a web-based AR product viewer. Manages product records
//! (name, category, 3D model, thumbnail) in PostgreSQL, stores uploaded
//! binaries on the local filesystem and serves them back as static files.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpServer, middleware};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

mod api;
mod config;
mod db;
mod storage;

use crate::config::Settings;
use crate::db::{DbPool, ProductRepository};
use crate::storage::UploadStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub products: ProductRepository,
    pub uploads: UploadStore,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("webar_backend=info".parse().unwrap())
                .add_directive("actix_web=info".parse().unwrap())
        )
        .json()
        .init();

    // Load configuration
    let settings = Settings::load().expect("Failed to load configuration");
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting WebAR backend v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    // Create the upload directory before accepting any request
    let uploads = UploadStore::new(&settings.uploads.path)
        .expect("Failed to create upload directory");
    info!(path = %settings.uploads.path.display(), "Upload directory ready");

    // Pool creation only fails on a bad connection string; an unreachable
    // database is logged and the process keeps serving (those requests 500).
    let pool = DbPool::new(&settings.database.url, settings.database.max_connections)
        .expect("Failed to create database pool");
    let products = ProductRepository::new(pool.clone());

    match pool.test_connection().await {
        Ok(()) => {
            info!("Database connection test successful");
            if let Err(e) = products.ensure_schema().await {
                warn!(error = %e, "Failed to ensure products schema");
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                "Database unreachable at startup; requests will fail until it is"
            );
        }
    }

    let upload_root = uploads.root().to_path_buf();
    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings,
        products,
        uploads,
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            // 50 MB ceiling on non-multipart request bodies
            .app_data(web::PayloadConfig::new(50 * 1024 * 1024))
            // The AR viewer is served from a different origin
            .wrap(Cors::permissive())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "webar-backend"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            // Uploaded binaries served back as static files
            .service(Files::new("/uploads", upload_root.clone()))
            // Routes
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
