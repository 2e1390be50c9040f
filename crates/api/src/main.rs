//! Manhwa Catalogue Gateway — HTTP entry point (§6).
//!
//! Wires the Store (C1), Cache (C2), SearchEngine (C5), UpstreamClient (C4),
//! Syncer (C7), and CatalogueService (C6) together, then serves the
//! `/api/v1/manhwa` surface plus the ambient `/health`, `/ready`, and
//! `/metrics` endpoints.

mod config;
mod error;
mod metrics;
mod middleware;
mod routes;

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::middleware::{MetricsMiddleware, SecurityHeaders};
use actix_web::{web, App, HttpResponse, HttpServer};
use manhwa_cache::ManhwaCache;
use manhwa_catalogue::{CatalogueService, Syncer};
use manhwa_search::SearchEngine;
use manhwa_store::{PgStore, Store};
use manhwa_upstream::{UpstreamClient, UpstreamConfig};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    let settings = Settings::load().expect("configuration must load from environment / .env");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await
        .expect("database pool must connect");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let search_engine = Arc::new(SearchEngine::new(store.clone()));
    let cache = Arc::new(ManhwaCache::new(
        settings.cache_max_keys,
        settings.cache_ttl_default(),
        settings.cache_ttl_search(),
    ));
    let upstream_config = UpstreamConfig::new(
        settings.upstream_api_url.clone(),
        settings.upstream_username.clone(),
        settings.upstream_secret.clone(),
    );
    let upstream = Arc::new(UpstreamClient::new(upstream_config));
    let syncer = Syncer::new(settings.sync_batch_size);
    syncer.start_cron(store.clone(), settings.sync_cron_interval());

    let catalogue = CatalogueService::new(store, cache, search_engine, upstream, syncer);
    let metrics = Arc::new(Metrics::new());
    let catalogue_data = web::Data::new(catalogue);
    let metrics_data = web::Data::new(metrics.clone());

    info!(port = settings.bind_port, "starting manhwa catalogue gateway");

    let bind_port = settings.bind_port;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(catalogue_data.clone())
            .app_data(metrics_data.clone())
            .wrap(SecurityHeaders)
            .wrap(MetricsMiddleware::new(metrics.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .route("/ready", web::get().to(readiness_check))
            .route("/metrics", web::get().to(metrics_handler))
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", bind_port))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, initiating graceful shutdown");
        server_handle.stop(true).await;
    });

    server.await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "manhwa-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check() -> HttpResponse {
    let db_ok = std::env::var("DATABASE_URL").is_ok();
    let status_code = if db_ok {
        actix_web::http::StatusCode::OK
    } else {
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE
    };
    HttpResponse::build(status_code).json(serde_json::json!({
        "ready": db_ok,
        "checks": { "database": db_ok },
    }))
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.render())
}
