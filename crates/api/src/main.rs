use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bundlewise_commerce::{AdminApi, CommerceConfig};
use bundlewise_engine::store::PgStore;
use bundlewise_engine::{AnalyticsService, AssignmentService, DiscountSynchronizer, RuleEngine};
use bundlewise_events::{EventBus, EventPersistence};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bundlewise_api::background::reconcile;
use bundlewise_api::config::ServerConfig;
use bundlewise_api::router::build_app_router;
use bundlewise_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "bundlewise_api=debug,bundlewise_engine=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let commerce_config = CommerceConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = bundlewise_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    bundlewise_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    bundlewise_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Services ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let commerce = Arc::new(AdminApi::new(commerce_config).expect("Failed to build commerce client"));

    let synchronizer = Arc::new(DiscountSynchronizer::new(
        commerce.clone(),
        commerce.clone(),
        store.clone(),
    ));
    let rules = Arc::new(RuleEngine::new(
        store.clone(),
        commerce.clone(),
        Arc::clone(&synchronizer),
    ));
    let assignments = Arc::new(AssignmentService::new(store.clone(), store.clone()));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let persistence_handle = tokio::spawn(EventPersistence::run(pool.clone(), event_bus.subscribe()));
    let analytics = Arc::new(AnalyticsService::new(Arc::clone(&event_bus), store.clone()));
    tracing::info!("Event persistence started");

    // --- Reconciliation ---
    let reconcile_cancel = CancellationToken::new();
    let reconcile_handle = (config.reconcile_interval_secs > 0).then(|| {
        tokio::spawn(reconcile::run(
            Arc::clone(&synchronizer),
            Arc::clone(&rules),
            config.reconcile_shops.clone(),
            Duration::from_secs(config.reconcile_interval_secs),
            reconcile_cancel.clone(),
        ))
    });

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState {
        pool: Some(pool),
        config: Arc::new(config),
        synchronizer,
        rules,
        assignments,
        analytics,
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    reconcile_cancel.cancel();
    if let Some(handle) = reconcile_handle {
        let _ = tokio::time::timeout(shutdown_timeout, handle).await;
    }

    // Dropping the last sender closes the channel and ends persistence
    // once buffered events are written.
    drop(event_bus);
    let _ = tokio::time::timeout(shutdown_timeout, persistence_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
