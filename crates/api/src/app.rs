use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::repositories::NoteRepository;
use domain::services::{
    DispatchService, HosService, LoadStatusService, TrackingGateway, TrackingService,
};
use persistence::repositories::{
    PgDispatchRepository, PgDriverAvailabilityRepository, PgGeofenceAlertRepository,
    PgHosRepository, PgLoadRepository, PgLocationRepository, PgNoteRepository,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{alerts, dispatches, health, hos, loads, locations, notes, stream};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<TrackingGateway>,
    pub load_status: Arc<LoadStatusService>,
    pub dispatch: Arc<DispatchService>,
    pub tracking: Arc<TrackingService>,
    pub hos: Arc<HosService>,
    pub notes: Arc<dyn NoteRepository>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let config = Arc::new(config);

        let loads = Arc::new(PgLoadRepository::new(pool.clone()));
        let dispatches = Arc::new(PgDispatchRepository::new(pool.clone()));
        let availability = Arc::new(PgDriverAvailabilityRepository::new(pool.clone()));
        let location_repo = Arc::new(PgLocationRepository::new(pool.clone()));
        let alert_repo = Arc::new(PgGeofenceAlertRepository::new(pool.clone()));
        let hos_repo = Arc::new(PgHosRepository::new(pool.clone()));
        let notes = Arc::new(PgNoteRepository::new(pool.clone()));

        let gateway = Arc::new(TrackingGateway::new());

        let load_status = Arc::new(LoadStatusService::new(
            loads.clone(),
            dispatches.clone(),
            gateway.clone(),
        ));
        let dispatch = Arc::new(DispatchService::new(
            dispatches.clone(),
            loads.clone(),
            availability.clone(),
            load_status.clone(),
            config.dispatch.clone(),
        ));
        let tracking = Arc::new(TrackingService::new(
            location_repo,
            availability.clone(),
            alert_repo,
            dispatches,
            loads,
            gateway.clone(),
            config.tracking.clone(),
        ));
        let hos = Arc::new(HosService::new(
            hos_repo,
            availability,
            gateway.clone(),
            config.hos.clone(),
        ));

        Self {
            pool,
            config,
            gateway,
            load_status,
            dispatch,
            tracking,
            hos,
            notes,
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let request_timeout = config.server.request_timeout_secs;
    let state = AppState::new(config, pool);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Loads: status state machine
        .route("/api/v1/loads/:load_id", get(loads::get_load))
        .route("/api/v1/loads/:load_id/status", post(loads::change_status))
        .route(
            "/api/v1/loads/:load_id/valid-transitions",
            get(loads::valid_transitions),
        )
        .route("/api/v1/loads/:load_id/history", get(loads::history))
        // Dispatches: assignment engine
        .route("/api/v1/dispatches", post(dispatches::assign))
        .route("/api/v1/dispatches/auto-match", post(dispatches::auto_match))
        .route("/api/v1/dispatches/:dispatch_id", get(dispatches::get_dispatch))
        .route("/api/v1/dispatches/:dispatch_id/accept", post(dispatches::accept))
        .route("/api/v1/dispatches/:dispatch_id/reject", post(dispatches::reject))
        .route("/api/v1/dispatches/:dispatch_id/begin", post(dispatches::begin))
        .route(
            "/api/v1/dispatches/:dispatch_id/complete",
            post(dispatches::complete),
        )
        .route("/api/v1/dispatches/:dispatch_id/cancel", post(dispatches::cancel))
        // Tracking: ingestion and queries
        .route("/api/v1/locations", post(locations::ingest))
        .route(
            "/api/v1/locations/active-trackers",
            get(locations::active_trackers),
        )
        .route(
            "/api/v1/drivers/:driver_id/locations/latest",
            get(locations::latest),
        )
        .route("/api/v1/drivers/:driver_id/locations", get(locations::history))
        // Geofence alerts
        .route("/api/v1/alerts/pending", get(alerts::pending))
        .route("/api/v1/alerts/:alert_id/acknowledge", post(alerts::acknowledge))
        // Hours of Service
        .route("/api/v1/hos/logs", post(hos::record_duty_status))
        .route("/api/v1/hos/logs/:log_id", patch(hos::edit_log))
        .route("/api/v1/drivers/:driver_id/hos/summary", get(hos::summary))
        .route("/api/v1/drivers/:driver_id/hos/logs", get(hos::recent_logs))
        .route(
            "/api/v1/drivers/:driver_id/hos/violations",
            get(hos::violations).post(hos::evaluate),
        )
        .route(
            "/api/v1/hos/violations/:violation_id/resolve",
            post(hos::resolve_violation),
        )
        // Notes
        .route(
            "/api/v1/loads/:owner_id/notes",
            post(notes::add_load_note).get(notes::load_notes),
        )
        .route(
            "/api/v1/drivers/:owner_id/notes",
            post(notes::add_driver_note).get(notes::driver_notes),
        )
        .route(
            "/api/v1/dispatches/:owner_id/notes",
            post(notes::add_dispatch_note).get(notes::dispatch_notes),
        )
        // Live streams (SSE)
        .route("/api/v1/stream/global", get(stream::global))
        .route("/api/v1/stream/trackers", get(stream::trackers))
        .route("/api/v1/stream/drivers/:driver_id", get(stream::driver));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
