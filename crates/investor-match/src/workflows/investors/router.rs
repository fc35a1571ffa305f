use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::batch::{
    AnalysisBatchDriver, AnalysisError, AnalysisOutcome, PageRequest, ProgressiveRequest,
};
use super::domain::NewInvestor;
use super::repository::{AnalysisQuery, InvestorStore};
use super::scoring::InvestorAnalyzer;
use super::service::{DirectoryError, InvestorDirectoryService};
use crate::config::{AnalysisConfig, SecurityConfig};

const DEFAULT_INFO_BATCH_SIZE: usize = 10;
const DEFAULT_INFO_NUM_BATCHES: usize = 5;

/// Shared state behind the investor routes.
pub struct InvestorApi<S> {
    driver: AnalysisBatchDriver<S>,
    directory: InvestorDirectoryService<S>,
    security: SecurityConfig,
}

impl<S> InvestorApi<S>
where
    S: InvestorStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        analyzer: Arc<InvestorAnalyzer>,
        analysis: AnalysisConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            driver: AnalysisBatchDriver::new(store.clone(), analyzer, analysis),
            directory: InvestorDirectoryService::new(store),
            security,
        }
    }

    pub fn driver(&self) -> &AnalysisBatchDriver<S> {
        &self.driver
    }

    pub fn directory(&self) -> &InvestorDirectoryService<S> {
        &self.directory
    }

    /// Requires `Bearer <secret>` when a cron secret is configured.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let Some(secret) = self.security.cron_secret.as_deref() else {
            return Ok(());
        };
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if presented == Some(secret) {
            Ok(())
        } else {
            warn!("unauthorized analysis trigger rejected");
            Err(error_response(
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ))
        }
    }
}

/// Router exposing the analysis triggers, their info endpoints, the listing and intake.
pub fn investor_router<S>(api: Arc<InvestorApi<S>>) -> Router
where
    S: InvestorStore + 'static,
{
    Router::new()
        .route(
            "/api/cron/analyze-investors",
            get(sweep_handler::<S>).post(sweep_handler::<S>),
        )
        .route(
            "/api/cron/analyze-investors-batch",
            get(batch_info_handler::<S>).post(page_handler::<S>),
        )
        .route(
            "/api/cron/analyze-investors-progressive",
            get(progressive_info_handler::<S>).post(progressive_handler::<S>),
        )
        .route("/api/investor-analysis", get(listing_handler::<S>))
        .route("/api/investors", post(add_investor_handler::<S>))
        .route("/api/investors/import", post(import_handler::<S>))
        .with_state(api)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InfoParams {
    batch_size: Option<usize>,
    num_batches: Option<usize>,
}

pub(crate) async fn sweep_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: InvestorStore + 'static,
{
    if let Err(rejection) = api.authorize(&headers) {
        return rejection;
    }

    match api.driver.run_full_sweep().await {
        Ok(AnalysisOutcome::Completed(report)) => success_response(
            "Investor analysis completed successfully".to_string(),
            &report.summary,
        ),
        Ok(AnalysisOutcome::NothingToDo { message }) => nothing_to_do(message),
        Err(err) => analysis_error_response(err),
    }
}

pub(crate) async fn page_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: InvestorStore + 'static,
{
    if let Err(rejection) = api.authorize(&headers) {
        return rejection;
    }
    let request: PageRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let batch_number = request.batch_number + 1;
    match api.driver.run_page(request) {
        Ok(AnalysisOutcome::Completed(summary)) => success_response(
            format!("Micro-batch {batch_number} analysis completed successfully"),
            &summary,
        ),
        Ok(AnalysisOutcome::NothingToDo { message }) => nothing_to_do(message),
        Err(err) => analysis_error_response(err),
    }
}

pub(crate) async fn progressive_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: InvestorStore + 'static,
{
    if let Err(rejection) = api.authorize(&headers) {
        return rejection;
    }
    let request: ProgressiveRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    match api.driver.run_progressive(request).await {
        Ok(AnalysisOutcome::Completed(summary)) => success_response(
            format!(
                "Progressive analysis completed successfully. Processed {} investors across {} micro-batches.",
                summary.total_processed, summary.batches_processed
            ),
            &summary,
        ),
        Ok(AnalysisOutcome::NothingToDo { message }) => nothing_to_do(message),
        Err(err) => analysis_error_response(err),
    }
}

pub(crate) async fn batch_info_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    Query(params): Query<InfoParams>,
) -> Response
where
    S: InvestorStore + 'static,
{
    let batch_size = params.batch_size.unwrap_or(DEFAULT_INFO_BATCH_SIZE);
    match api.driver.batch_info(batch_size) {
        Ok(info) => (StatusCode::OK, Json(json!({ "success": true, "data": info }))).into_response(),
        Err(err) => analysis_error_response(err),
    }
}

pub(crate) async fn progressive_info_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    Query(params): Query<InfoParams>,
) -> Response
where
    S: InvestorStore + 'static,
{
    let batch_size = params.batch_size.unwrap_or(DEFAULT_INFO_BATCH_SIZE);
    let num_batches = params.num_batches.unwrap_or(DEFAULT_INFO_NUM_BATCHES);
    match api.driver.progressive_info(batch_size, num_batches) {
        Ok(info) => (StatusCode::OK, Json(json!({ "success": true, "data": info }))).into_response(),
        Err(err) => analysis_error_response(err),
    }
}

pub(crate) async fn listing_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    Query(query): Query<AnalysisQuery>,
) -> Response
where
    S: InvestorStore + 'static,
{
    match api.directory.list_analyses(&query) {
        Ok(listing) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": listing.data,
                "pagination": listing.pagination,
            })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to fetch investor analysis");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch analysis data", "details": err.to_string() }),
            )
        }
    }
}

pub(crate) async fn add_investor_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    Json(investor): Json<NewInvestor>,
) -> Response
where
    S: InvestorStore + 'static,
{
    match api.directory.add_investor(investor) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": record,
                "message": "Investor added successfully",
            })),
        )
            .into_response(),
        Err(DirectoryError::Intake(_)) => error_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Investor name and contact person are required" }),
        ),
        Err(err) => {
            error!(error = %err, "failed to insert investor");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to insert investor", "details": err.to_string() }),
            )
        }
    }
}

pub(crate) async fn import_handler<S>(
    State(api): State<Arc<InvestorApi<S>>>,
    body: Bytes,
) -> Response
where
    S: InvestorStore + 'static,
{
    match api.directory.import_csv(&body[..]) {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("{} investors imported", summary.imported),
                "imported": summary.imported,
                "skipped": summary.skipped,
            })),
        )
            .into_response(),
        Err(DirectoryError::Import(err)) => {
            error_response(StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        Err(err) => {
            error!(error = %err, "failed to import investors");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to import investors", "details": err.to_string() }),
            )
        }
    }
}

/// Empty bodies fall back to the request defaults.
fn parse_body<T>(body: &[u8]) -> Result<T, Response>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        error_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid request body", "details": err.to_string() }),
        )
    })
}

fn success_response<T: serde::Serialize>(message: String, summary: &T) -> Response {
    let payload = json!({
        "success": true,
        "message": message,
        "summary": summary,
        "timestamp": Utc::now().to_rfc3339(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

fn nothing_to_do(message: String) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}

fn analysis_error_response(err: AnalysisError) -> Response {
    match err {
        AnalysisError::OutOfRange { .. } | AnalysisError::InvalidRequest(_) => {
            error_response(StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        AnalysisError::Count(ref source) => {
            error!(error = %source, "failed to get investor count");
            internal_error("Failed to get investor count", source)
        }
        AnalysisError::Clear(ref source) => {
            error!(error = %source, "failed to clear existing analysis");
            internal_error("Failed to clear existing analysis", source)
        }
        AnalysisError::PageFetch { batch, ref source } => {
            error!(batch, error = %source, "failed to fetch micro-batch");
            internal_error("Failed to fetch micro-batch", source)
        }
    }
}

fn internal_error(message: &str, details: &dyn std::fmt::Display) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": message, "details": details.to_string() }),
    )
}

fn error_response(status: StatusCode, payload: Value) -> Response {
    (status, Json(payload)).into_response()
}
