use anyhow::Result;
use tracing::info;

use tms_api::{app, config, jobs, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting TMS API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.to_pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::CleanupLocationsJob::new(
        pool.clone(),
        config.limits.location_retention_days,
    ));
    scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    let app = app::create_app(config.clone(), pool);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    scheduler.shutdown();
    scheduler
        .wait_for_shutdown(std::time::Duration::from_secs(10))
        .await;

    Ok(())
}
