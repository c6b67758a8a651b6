use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use blog_service::config::StorageBackend;
use blog_service::db::{self, MemoryStore};
use blog_service::{handlers, metrics, middleware, AppState, Config};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: Option<PgPool>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    storage: ComponentStatus,
    message: String,
    latency_ms: u64,
    timestamp: String,
}

impl HealthState {
    async fn check_storage(&self) -> Result<(), sqlx::Error> {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

async fn health_summary() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.check_storage().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let response = match result {
        Ok(()) => ReadinessResponse {
            ready: true,
            storage: ComponentStatus::Healthy,
            message: "storage reachable".to_string(),
            latency_ms,
            timestamp: Utc::now().to_rfc3339(),
        },
        Err(e) => ReadinessResponse {
            ready: false,
            storage: ComponentStatus::Unhealthy,
            message: format!("PostgreSQL connection failed: {}", e),
            latency_ms,
            timestamp: Utc::now().to_rfc3339(),
        },
    };

    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Blog Service
///
/// Multi-tenant blog backend. Tenants are addressed by host:
/// `<username>.<CANONICAL_HOST>` or a configured custom domain.
///
/// # Routes
///
/// - `/posts/{slug}` - post detail with approved comments
/// - `/posts/{slug}/comments/*` - comment submission and moderation
/// - `/accounts/*` - signup, API key reset, settings
/// - `/notifications/subscribe` - email subscriptions
/// - `/api/v1/health*`, `/metrics` - operations
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Support container healthchecks via CLI subcommand: `healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return healthcheck().await;
    }

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        canonical_host = %config.tenancy.canonical_host,
        storage = ?config.database.backend,
        "configuration loaded"
    );

    let (state, db_pool) = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = db::connect(&config.database).await.map_err(|e| {
                tracing::error!("Database initialization failed: {:#}", e);
                io::Error::new(io::ErrorKind::Other, format!("{:#}", e))
            })?;
            tracing::info!("Connected to PostgreSQL, migrations applied");
            (
                AppState::with_postgres(pool.clone(), config.tenancy.canonical_host.clone()),
                Some(pool),
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (
                AppState::in_memory(
                    Arc::new(MemoryStore::new()),
                    config.tenancy.canonical_host.clone(),
                ),
                None,
            )
        }
    };

    let app_state = web::Data::new(state);
    let health_state = web::Data::new(HealthState { db_pool });
    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(middleware::ApiKeyAuth)
            .wrap(middleware::MetricsMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .workers(config.app.workers)
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    server_handle.stop(true).await;

    match server_task.await {
        Ok(result) => result?,
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
    }

    tracing::info!("Blog-service shutting down");
    Ok(())
}

async fn healthcheck() -> io::Result<()> {
    let port = std::env::var("BLOG_SERVICE_PORT").unwrap_or_else(|_| "8080".to_string());
    probe_health(&format!("http://127.0.0.1:{}/api/v1/health", port)).await
}

async fn probe_health(url: &str) -> io::Result<()> {
    match reqwest::Client::new().get(url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_healthcheck_probe() {
        let server = HttpServer::new(|| {
            App::new().route("/api/v1/health", web::get().to(health_summary))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        assert!(probe_health(&format!("http://{}/api/v1/health", addr))
            .await
            .is_ok());
        assert!(probe_health(&format!("http://{}/missing", addr))
            .await
            .is_err());

        handle.stop(true).await;
    }
}
