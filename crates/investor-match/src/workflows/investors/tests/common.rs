use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::config::{AnalysisConfig, SecurityConfig};
use crate::workflows::investors::domain::{
    BatchProgressState, CompanyProfile, InvestmentScore, InvestorId, InvestorRecord,
    MatchAnalysis, MatchAnalysisRecord, NewInvestor,
};
use crate::workflows::investors::memory::InMemoryInvestorStore;
use crate::workflows::investors::profile::KeywordCatalog;
use crate::workflows::investors::repository::{
    AnalysisQuery, AnalysisRepository, AnalysisSlice, InvestorRepository, ProgressRepository,
    RepositoryError,
};
use crate::workflows::investors::router::{investor_router, InvestorApi};
use crate::workflows::investors::scoring::{AnalyzerSettings, InvestorAnalyzer};
use crate::workflows::investors::AnalysisBatchDriver;

pub(super) const JOB: &str = "test_analysis";
pub(super) const SECRET: &str = "s3cret";
pub(super) const REFERENCE_YEAR: i32 = 2025;

pub(super) fn analyzer() -> InvestorAnalyzer {
    InvestorAnalyzer::with_settings(
        &CompanyProfile::standard(),
        &KeywordCatalog::standard(),
        AnalyzerSettings {
            reference_year: REFERENCE_YEAR,
            clamp_final_score: false,
        },
    )
}

pub(super) fn analysis_config(batch_size: usize) -> AnalysisConfig {
    AnalysisConfig {
        batch_size,
        batch_delay: Duration::ZERO,
        insert_chunk: 100,
        job_name: JOB.to_string(),
    }
}

pub(super) fn driver<S>(store: Arc<S>, config: AnalysisConfig) -> AnalysisBatchDriver<S>
where
    S: crate::workflows::investors::InvestorStore + 'static,
{
    AnalysisBatchDriver::new(store, Arc::new(analyzer()), config)
}

/// Investor whose only signal is an investment score of `3 * rank`, so scores stay below 80
/// and never decrease as `rank` grows.
pub(super) fn ranked_investor(rank: u32) -> NewInvestor {
    NewInvestor {
        investor_name: Some(format!("Investor {rank}")),
        contact_person: Some(format!("Partner {rank}")),
        investment_score: Some(InvestmentScore::Numeric(f64::from(rank) * 3.0)),
        ..NewInvestor::default()
    }
}

pub(super) fn strong_investor(name: &str) -> NewInvestor {
    let thesis = "AI venture capital fund backing enterprise SaaS startups in machine learning, \
                  automation and data analytics.";
    NewInvestor {
        investor_name: Some(name.to_string()),
        contact_person: Some("Jane Doe".to_string()),
        description: Some(thesis.to_string()),
        overview: Some(thesis.to_string()),
        practice_areas: Some(thesis.to_string()),
        business_models: Some(thesis.to_string()),
        investor_type: Some("Venture Capital AI technology".to_string()),
        investment_score: Some(InvestmentScore::Text("90/100".to_string())),
        website: Some("https://fund.example".to_string()),
        company_linkedin: Some("https://linkedin.com/company/fund".to_string()),
        founded_year: Some(2020),
        country: Some("United States".to_string()),
        ..NewInvestor::default()
    }
}

pub(super) fn weak_investor(name: &str) -> NewInvestor {
    NewInvestor {
        investor_name: Some(name.to_string()),
        description: Some("Local bakery owner".to_string()),
        investor_type: Some("Family office".to_string()),
        ..NewInvestor::default()
    }
}

pub(super) fn record(id: u64, investor: NewInvestor) -> InvestorRecord {
    investor.into_record(InvestorId(id))
}

pub(super) fn seeded_store(count: u32) -> InMemoryInvestorStore {
    InMemoryInvestorStore::with_investors((1..=count).map(ranked_investor))
}

pub(super) fn stale_analysis(investor: u64) -> MatchAnalysis {
    MatchAnalysis {
        investor_id: InvestorId(investor),
        score: 1,
        reason: "stale".to_string(),
        top_rated: false,
    }
}

pub(super) fn api(
    store: InMemoryInvestorStore,
    secret: Option<&str>,
) -> Arc<InvestorApi<InMemoryInvestorStore>> {
    Arc::new(InvestorApi::new(
        Arc::new(store),
        Arc::new(analyzer()),
        analysis_config(10),
        SecurityConfig {
            cron_secret: secret.map(str::to_string),
        },
    ))
}

pub(super) fn router(store: InMemoryInvestorStore, secret: Option<&str>) -> axum::Router {
    investor_router(api(store, secret))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store wrapper that injects failures and records the calls the driver makes.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryInvestorStore,
    pub(super) fail_count: bool,
    pub(super) fail_clear: bool,
    pub(super) fail_progress_load: bool,
    /// Page offsets whose fetch fails.
    pub(super) failing_offsets: HashSet<usize>,
    /// 1-based `insert_many` call numbers that fail.
    pub(super) failing_inserts: HashSet<usize>,
    pub(super) insert_calls: AtomicUsize,
    pub(super) log: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub(super) fn wrapping(inner: InMemoryInvestorStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.log.lock().expect("log mutex poisoned").clone()
    }

    pub(super) fn progress_writes(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix("upsert:"))
            .filter_map(|value| value.parse().ok())
            .collect()
    }

    fn record(&self, call: String) {
        self.log.lock().expect("log mutex poisoned").push(call);
    }

    fn offline() -> RepositoryError {
        RepositoryError::Unavailable("database offline".to_string())
    }
}

impl InvestorRepository for FlakyStore {
    fn count(&self) -> Result<usize, RepositoryError> {
        if self.fail_count {
            return Err(Self::offline());
        }
        self.inner.count()
    }

    fn page(&self, offset: usize, limit: usize) -> Result<Vec<InvestorRecord>, RepositoryError> {
        self.record(format!("page:{offset}"));
        if self.failing_offsets.contains(&offset) {
            return Err(Self::offline());
        }
        self.inner.page(offset, limit)
    }

    fn insert(&self, investor: NewInvestor) -> Result<InvestorRecord, RepositoryError> {
        self.inner.insert(investor)
    }

    fn fetch(&self, id: InvestorId) -> Result<Option<InvestorRecord>, RepositoryError> {
        self.inner.fetch(id)
    }
}

impl AnalysisRepository for FlakyStore {
    fn insert_many(
        &self,
        analyses: &[MatchAnalysis],
    ) -> Result<Vec<MatchAnalysisRecord>, RepositoryError> {
        let call = self.insert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(format!("insert:{}", analyses.len()));
        if self.failing_inserts.contains(&call) {
            return Err(Self::offline());
        }
        self.inner.insert_many(analyses)
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        self.record("clear".to_string());
        if self.fail_clear {
            return Err(Self::offline());
        }
        self.inner.clear()
    }

    fn query(&self, query: &AnalysisQuery) -> Result<AnalysisSlice, RepositoryError> {
        self.inner.query(query)
    }
}

impl ProgressRepository for FlakyStore {
    fn load(&self, job: &str) -> Result<Option<BatchProgressState>, RepositoryError> {
        if self.fail_progress_load {
            return Err(Self::offline());
        }
        self.inner.load(job)
    }

    fn upsert(&self, state: &BatchProgressState) -> Result<(), RepositoryError> {
        self.record(format!("upsert:{}", state.last_batch_processed));
        self.inner.upsert(state)
    }
}
