use investor_match::error::AppError;
use investor_match::workflows::investors::{InMemoryInvestorStore, InvestorCsvImporter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Builds the process-local store, optionally hydrated from an investor CSV export.
pub(crate) fn investor_store(seed_csv: Option<&Path>) -> Result<InMemoryInvestorStore, AppError> {
    let Some(path) = seed_csv else {
        return Ok(InMemoryInvestorStore::default());
    };

    let report = InvestorCsvImporter::from_path(path)?;
    info!(
        path = %path.display(),
        imported = report.investors.len(),
        skipped = report.skipped,
        "seeded investor store"
    );
    Ok(InMemoryInvestorStore::with_investors(report.investors))
}
