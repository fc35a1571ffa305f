mod signals;
mod text;

pub use signals::normalize_investment_score;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{CompanyProfile, InvestorId, InvestorRecord, MatchAnalysis};
use super::profile::KeywordCatalog;
use signals::{additional_signals_score, investor_type_score};
use text::TextRelevanceScorer;

const INVESTMENT_SCORE_WEIGHT: f64 = 0.20;
const DESCRIPTION_WEIGHT: f64 = 0.30;
const OVERVIEW_WEIGHT: f64 = 0.25;
const PRACTICE_AREAS_WEIGHT: f64 = 0.15;
const INVESTOR_TYPE_WEIGHT: f64 = 0.10;
const BUSINESS_MODELS_WEIGHT: f64 = 0.10;

/// Raw weighted score at or above which a record is top-rated on its own merit.
pub const TOP_RATED_THRESHOLD: f64 = 80.0;
const TOP_DECILE: usize = 10;
const MAX_REASONS: usize = 3;
pub const NO_REASON: &str = "Limited information available for analysis";

/// Tuning knobs that are not part of the keyword dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Year used to age `founded_year`.
    pub reference_year: i32,
    /// Clamp the final score to 100 after the unweighted bonus. Off by default, so scores can
    /// reach 135 (110 from weights summing to 1.1 plus a 25 point bonus).
    pub clamp_final_score: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            reference_year: Utc::now().year(),
            clamp_final_score: false,
        }
    }
}

/// Per-record scoring result prior to batch ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub investor_id: InvestorId,
    pub score: u32,
    pub raw_score: f64,
    pub reasons: Vec<String>,
    /// Provisional flag: raw score crossed the absolute threshold.
    pub top_rated: bool,
}

impl AnalysisResult {
    /// First three reason fragments joined, or a placeholder when none exist.
    pub fn reason(&self) -> String {
        let fragments: Vec<&str> = self
            .reasons
            .iter()
            .map(String::as_str)
            .filter(|reason| !reason.is_empty())
            .take(MAX_REASONS)
            .collect();
        if fragments.is_empty() {
            NO_REASON.to_string()
        } else {
            fragments.join(". ")
        }
    }

    fn into_analysis(self) -> MatchAnalysis {
        MatchAnalysis {
            investor_id: self.investor_id,
            reason: self.reason(),
            score: self.score,
            top_rated: self.top_rated,
        }
    }
}

/// Stateless keyword-weighted scorer built once from the company profile.
#[derive(Debug, Clone)]
pub struct InvestorAnalyzer {
    text: TextRelevanceScorer,
    settings: AnalyzerSettings,
}

impl InvestorAnalyzer {
    pub fn new(profile: &CompanyProfile, catalog: &KeywordCatalog) -> Self {
        Self::with_settings(profile, catalog, AnalyzerSettings::default())
    }

    pub fn with_settings(
        profile: &CompanyProfile,
        catalog: &KeywordCatalog,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            text: TextRelevanceScorer::new(catalog, profile),
            settings,
        }
    }

    pub fn settings(&self) -> AnalyzerSettings {
        self.settings
    }

    pub fn analyze(&self, investor: &InvestorRecord) -> AnalysisResult {
        let mut total = 0.0;
        let mut reasons = Vec::new();

        if let Some(score) = investor
            .investment_score
            .as_ref()
            .filter(|score| score.is_present())
        {
            total += normalize_investment_score(score) * INVESTMENT_SCORE_WEIGHT;
            reasons.push(format!("Base investment score: {score}"));
        }

        total += self.text_score(investor.description.as_deref()) * DESCRIPTION_WEIGHT;
        total += self.text_score(investor.overview.as_deref()) * OVERVIEW_WEIGHT;
        total += self.text_score(investor.practice_areas.as_deref()) * PRACTICE_AREAS_WEIGHT;
        total += f64::from(investor_type_score(investor.investor_type.as_deref()))
            * INVESTOR_TYPE_WEIGHT;
        total += self.text_score(investor.business_models.as_deref()) * BUSINESS_MODELS_WEIGHT;
        total += f64::from(additional_signals_score(
            investor,
            self.settings.reference_year,
        ));

        let mut score = total.round() as u32;
        if self.settings.clamp_final_score {
            score = score.min(100);
        }

        AnalysisResult {
            investor_id: investor.id,
            score,
            raw_score: total,
            reasons,
            top_rated: total >= TOP_RATED_THRESHOLD,
        }
    }

    /// Scores and ranks one batch. Output is ordered by score descending, ties by investor id.
    ///
    /// The top decile (rounded up) is forced top-rated; everything else keeps its provisional
    /// threshold flag, so a record can be top-rated either way.
    pub fn analyze_batch(&self, investors: &[InvestorRecord]) -> Vec<MatchAnalysis> {
        let mut analyses: Vec<MatchAnalysis> = investors
            .iter()
            .map(|investor| self.analyze(investor).into_analysis())
            .collect();

        analyses.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.investor_id.cmp(&b.investor_id))
        });

        let top_count = analyses.len().div_ceil(TOP_DECILE);
        for analysis in analyses.iter_mut().take(top_count) {
            analysis.top_rated = true;
        }

        debug!(
            investors = analyses.len(),
            top_count,
            top_rated = analyses.iter().filter(|a| a.top_rated).count(),
            "batch ranked"
        );
        analyses
    }

    fn text_score(&self, text: Option<&str>) -> f64 {
        f64::from(self.text.score(text))
    }
}

impl Default for InvestorAnalyzer {
    fn default() -> Self {
        Self::new(&CompanyProfile::standard(), &KeywordCatalog::standard())
    }
}
