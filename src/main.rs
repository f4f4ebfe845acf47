//! Student document server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use student_docs_lib::api::{self, ApiDoc, UploadLimit};
use student_docs_lib::config::Config;
use student_docs_lib::db::DbPool;
use student_docs_lib::middleware::{REQUEST_ID_HEADER, RequestLogger};
use student_docs_lib::services::{self, DocumentService, DocumentTypeCatalog, catalog, storage};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and S3 credentials must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Student Documents Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Database and migrations
    let pool = DbPool::connect(&config)
        .await
        .map_err(std::io::Error::other)?;
    pool.run_migrations().await.map_err(std::io::Error::other)?;

    // Document type catalog
    let definitions =
        catalog::load_definitions(config.catalog_path.as_deref()).map_err(std::io::Error::other)?;
    catalog::seed(&pool, &definitions)
        .await
        .map_err(std::io::Error::other)?;
    let catalog = Arc::new(
        DocumentTypeCatalog::load(&pool)
            .await
            .map_err(std::io::Error::other)?,
    );
    info!(
        "Document type catalog loaded: {} types",
        catalog.count().map_err(std::io::Error::other)?
    );

    // Blob storage
    let storage = storage::connect(&config)
        .await
        .map_err(std::io::Error::other)?;

    let service = web::Data::new(DocumentService::new(
        pool.clone(),
        storage,
        catalog,
        config.storage_timeout(),
    ));

    // Start the expiry sweep background task
    services::start_expiry_sweep_task(
        Arc::new(pool.clone()),
        services::ExpirySweepConfig {
            interval_secs: config.expiry_sweep_interval_secs,
        },
    );

    // Prepare shared state
    let bind_address = config.bind_address();
    let upload_limit = UploadLimit(config.max_upload_size);
    let is_development = config.is_development();
    let openapi = ApiDoc::openapi();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let actor_header = header::HeaderName::from_static("x-actor-id");

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
        }
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            actor_header.clone(),
        ])
        .expose_headers(vec![header::HeaderName::from_static(
            REQUEST_ID_HEADER,
        )])
        .max_age(3600);

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(service.clone())
            .app_data(web::Data::new(upload_limit))
            .app_data(web::PayloadConfig::new(upload_limit.0))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(web::scope("/api/v1").configure(api::configure_routes))
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
