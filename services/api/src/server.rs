use crate::cli::ServeArgs;
use crate::infra::{investor_store, AppState};
use crate::routes::with_investor_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use investor_match::config::AppConfig;
use investor_match::error::AppError;
use investor_match::telemetry;
use investor_match::workflows::investors::{InvestorAnalyzer, InvestorApi};
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

    let store = Arc::new(investor_store(args.seed_csv.as_deref())?);
    let api = Arc::new(InvestorApi::new(
        store,
        Arc::new(InvestorAnalyzer::default()),
        config.analysis.clone(),
        config.security.clone(),
    ));

    let app = with_investor_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        batch_size = config.analysis.batch_size,
        auth = config.security.cron_secret.is_some(),
        "investor match service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
