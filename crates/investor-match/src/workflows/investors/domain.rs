use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned identifier for an investor row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InvestorId(pub u64);

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Investment score as it arrives from imports: a bare number, `"85/100"`, or `"85%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvestmentScore {
    Numeric(f64),
    Text(String),
}

impl InvestmentScore {
    /// Zero and blank strings count as absent, matching how the scorer treats them.
    pub fn is_present(&self) -> bool {
        match self {
            InvestmentScore::Numeric(value) => *value != 0.0 && !value.is_nan(),
            InvestmentScore::Text(value) => !value.is_empty(),
        }
    }
}

impl fmt::Display for InvestmentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentScore::Numeric(value) => write!(f, "{value}"),
            InvestmentScore::Text(value) => f.write_str(value),
        }
    }
}

/// Investor fields as supplied by intake, before storage assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInvestor {
    #[serde(default)]
    pub investor_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub practice_areas: Option<String>,
    #[serde(default)]
    pub business_models: Option<String>,
    #[serde(default)]
    pub investor_type: Option<String>,
    #[serde(default)]
    pub investment_score: Option<InvestmentScore>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub company_linkedin: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Columns the importer did not recognise, preserved verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl NewInvestor {
    pub fn into_record(self, id: InvestorId) -> InvestorRecord {
        InvestorRecord {
            id,
            investor_name: self.investor_name,
            contact_person: self.contact_person,
            email: self.email,
            description: self.description,
            overview: self.overview,
            practice_areas: self.practice_areas,
            business_models: self.business_models,
            investor_type: self.investor_type,
            investment_score: self.investment_score,
            website: self.website,
            company_linkedin: self.company_linkedin,
            founded_year: self.founded_year,
            country: self.country,
            city: self.city,
            extra: self.extra,
        }
    }
}

/// One investor contact or firm eligible for scoring. Read-only to the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorRecord {
    pub id: InvestorId,
    pub investor_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub practice_areas: Option<String>,
    pub business_models: Option<String>,
    pub investor_type: Option<String>,
    pub investment_score: Option<InvestmentScore>,
    pub website: Option<String>,
    pub company_linkedin: Option<String>,
    pub founded_year: Option<i32>,
    pub country: Option<String>,
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl InvestorRecord {
    /// Bare record with only an id, handy as a starting point for fixtures.
    pub fn empty(id: InvestorId) -> Self {
        NewInvestor::default().into_record(id)
    }
}

/// Scoring output for one investor, before storage assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub investor_id: InvestorId,
    pub score: u32,
    pub reason: String,
    pub top_rated: bool,
}

/// Persisted match analysis row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAnalysisRecord {
    pub id: u64,
    pub investor_id: InvestorId,
    pub score: u32,
    pub reason: String,
    pub top_rated: bool,
    pub created_at: DateTime<Utc>,
}

/// Resumable cursor for a named sweep: the index of the next page to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgressState {
    #[serde(rename = "id")]
    pub job: String,
    pub last_batch_processed: usize,
    pub updated_at: DateTime<Utc>,
}

impl BatchProgressState {
    /// Cursor positioned at the start of a run. Indistinguishable from "just completed".
    pub fn fresh(job: impl Into<String>) -> Self {
        Self::at(job, 0)
    }

    pub fn at(job: impl Into<String>, last_batch_processed: usize) -> Self {
        Self {
            job: job.into(),
            last_batch_processed,
            updated_at: Utc::now(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.last_batch_processed == 0
    }
}

/// Static description of the operator's own company, used as a keyword source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub description: String,
    pub industry: String,
    pub stage: String,
    pub funding_needed: String,
    pub key_technologies: Vec<String>,
    pub target_markets: Vec<String>,
    pub business_model: String,
    pub competitive_advantages: Vec<String>,
}

impl CompanyProfile {
    /// Technologies, markets and advantages, in that order.
    pub fn match_terms(&self) -> impl Iterator<Item = &str> {
        self.key_technologies
            .iter()
            .chain(&self.target_markets)
            .chain(&self.competitive_advantages)
            .map(String::as_str)
    }
}
