use serde::{Deserialize, Serialize};

use super::super::domain::{BatchProgressState, MatchAnalysis};

const HIGH_SCORE: u32 = 80;
const MEDIUM_SCORE: u32 = 50;

/// Score bands: high is 80 and above, medium 50 to 79, low below 50.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Running totals over every analysis produced by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScoreTally {
    pub(crate) analyzed: usize,
    pub(crate) top_rated: usize,
    score_sum: u64,
    pub(crate) distribution: ScoreDistribution,
}

impl ScoreTally {
    pub(crate) fn from_analyses(analyses: &[MatchAnalysis]) -> Self {
        let mut tally = Self::default();
        tally.record(analyses);
        tally
    }

    pub(crate) fn record(&mut self, analyses: &[MatchAnalysis]) {
        for analysis in analyses {
            self.analyzed += 1;
            self.score_sum += u64::from(analysis.score);
            if analysis.top_rated {
                self.top_rated += 1;
            }
            match analysis.score {
                score if score >= HIGH_SCORE => self.distribution.high += 1,
                score if score >= MEDIUM_SCORE => self.distribution.medium += 1,
                _ => self.distribution.low += 1,
            }
        }
    }

    /// Rounded mean score, 0 when nothing was analyzed.
    pub(crate) fn average_score(&self) -> u32 {
        if self.analyzed == 0 {
            return 0;
        }
        (self.score_sum as f64 / self.analyzed as f64).round() as u32
    }
}

/// Paging bookkeeping reported by a full sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepBatchInfo {
    pub total_batches: usize,
    pub batch_size: usize,
    pub processed_count: usize,
    /// Page index the sweep started from; non-zero when resuming.
    pub resumed_from: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub total_investors: usize,
    pub total_analyzed: usize,
    pub total_inserted: usize,
    pub total_errors: usize,
    pub top_rated_count: usize,
    pub average_score: u32,
    pub score_distribution: ScoreDistribution,
    pub batch_info: SweepBatchInfo,
}

/// Result of a full sweep together with the cursor it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub summary: SweepSummary,
    pub progress: BatchProgressState,
}

/// 1-based, inclusive record positions covered by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRange {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// 1-based page number.
    pub batch_number: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    pub total_investors: usize,
    pub total_analyzed: usize,
    pub total_inserted: usize,
    pub total_errors: usize,
    pub top_rated_count: usize,
    pub average_score: u32,
    pub score_distribution: ScoreDistribution,
    pub range: RecordRange,
}

/// Per-page line in a progressive run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// 1-based page number.
    pub batch_number: usize,
    pub success: bool,
    pub processed: usize,
    pub top_rated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    pub(crate) fn failed(batch_number: usize, error: impl Into<String>) -> Self {
        Self {
            batch_number,
            success: false,
            processed: 0,
            top_rated: 0,
            inserted: None,
            errors: None,
            average_score: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressiveSummary {
    pub total_investors: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    /// 1-based first page.
    pub start_batch: usize,
    /// 1-based last page, inclusive.
    pub end_batch: usize,
    pub batches_processed: usize,
    pub total_analyzed: usize,
    pub total_processed: usize,
    pub total_top_rated: usize,
    pub total_inserted: usize,
    pub total_errors: usize,
    pub average_score: u32,
    pub score_distribution: ScoreDistribution,
    pub batch_results: Vec<BatchResult>,
    pub range: RecordRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRange {
    /// 0-based page index, as accepted by the single-page trigger.
    pub batch_number: usize,
    pub from: usize,
    pub to: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub total_investors: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    pub batches: Vec<BatchRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressiveInfo {
    pub total_investors: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    pub num_batches: usize,
    /// Last start page that still leaves `num_batches` pages to process.
    pub max_start_batch: usize,
    pub recommended_batches: usize,
}
