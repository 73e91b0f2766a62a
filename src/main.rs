use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use landline_backend::{
    config::Config,
    db,
    middleware::rate_limit::{create_global_governor, log_request},
    routes,
    services::inventory::{self, GenerationWindow, RefreshSettings},
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landline_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    if config.seed_reference_data {
        db::seed::seed_reference_data(&db)
            .await
            .expect("Failed to seed reference data");
    }

    let window = GenerationWindow::new(Utc::now().date_naive(), config.inventory_window_days);
    inventory::generate_inventory(&db, window, config.seats_per_unit)
        .await
        .expect("Failed to generate inventory");

    let refresher = inventory::spawn_refresher(
        db.clone(),
        RefreshSettings {
            window_days: config.inventory_window_days,
            total_seats: config.seats_per_unit,
            every: Duration::from_secs(config.inventory_refresh_hours.max(1) * 3600),
        },
    );

    let state = AppState::new(db.clone(), config.clone());

    let app = routes::create_router(state)
        .layer(axum::middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor());

    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    refresher.abort();
    if let Err(e) = db.close().await {
        tracing::error!(error = %e, "Failed to close database pool");
    }
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
