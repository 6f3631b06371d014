use crate::cli::ServeArgs;
use crate::infra::{match_service, semantic_scorer, AppState, Fixtures};
use crate::routes::with_match_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ride_match::config::AppConfig;
use ride_match::error::AppError;
use ride_match::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let fixtures = Fixtures::load(args.fixtures.as_deref())?;
    info!(
        rides = fixtures.rides.len(),
        users = fixtures.users.len(),
        "in-memory stores seeded"
    );

    let semantic = semantic_scorer(&config)?;
    match &config.embedding {
        Some(embedding) => info!(
            provider = ?embedding.provider,
            timeout_ms = embedding.timeout.as_millis() as u64,
            "semantic scoring enabled"
        ),
        None => info!("semantic scoring disabled; no embedding endpoint configured"),
    }

    let app = with_match_routes(match_service(fixtures, semantic))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ride match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
