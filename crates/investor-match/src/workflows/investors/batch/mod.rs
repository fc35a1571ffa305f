//! Micro-batch driver that scores the investor collection page by page.
//!
//! A full sweep persists its page cursor after every page so that an invocation killed by an
//! execution-time limit can be re-run and pick up where it stopped. Ranking is applied per page,
//! so "top 10%" means the top tenth of each page rather than of the whole collection.

mod summary;

pub use summary::{
    BatchInfo, BatchRange, BatchResult, PageSummary, ProgressiveInfo, ProgressiveSummary,
    RecordRange, ScoreDistribution, SweepBatchInfo, SweepReport, SweepSummary,
};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{BatchProgressState, InvestorRecord, MatchAnalysis};
use super::repository::{InvestorStore, RepositoryError};
use super::scoring::InvestorAnalyzer;
use crate::config::AnalysisConfig;
use summary::ScoreTally;

pub const NO_INVESTORS_MESSAGE: &str = "No investors found to analyze";
const MAX_RECOMMENDED_BATCHES: usize = 10;

/// Either a finished run or a run that found nothing to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome<T> {
    NothingToDo { message: String },
    Completed(T),
}

impl<T> AnalysisOutcome<T> {
    fn nothing(message: impl Into<String>) -> Self {
        Self::NothingToDo {
            message: message.into(),
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::NothingToDo { .. } => None,
        }
    }
}

/// Top-of-job failures. Per-page failures are logged and counted instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to get investor count: {0}")]
    Count(#[source] RepositoryError),
    #[error("failed to clear existing analysis: {0}")]
    Clear(#[source] RepositoryError),
    #[error("failed to fetch micro-batch {batch}: {source}")]
    PageFetch {
        batch: usize,
        source: RepositoryError,
    },
    #[error("batch {requested} is out of range (total batches: {total})")]
    OutOfRange { requested: usize, total: usize },
    #[error("invalid analysis request: {0}")]
    InvalidRequest(&'static str),
}

/// Stages of a full sweep, reported through tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    FetchingCount,
    ResumingOrClearing,
    ProcessingBatch(usize),
    CompletedReset,
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPhase::Idle => f.write_str("idle"),
            SweepPhase::FetchingCount => f.write_str("fetching-count"),
            SweepPhase::ResumingOrClearing => f.write_str("resuming-or-clearing"),
            SweepPhase::ProcessingBatch(index) => write!(f, "processing-batch({index})"),
            SweepPhase::CompletedReset => f.write_str("completed-reset"),
        }
    }
}

/// Manual trigger for exactly one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// 0-based page index.
    pub batch_number: usize,
    pub batch_size: usize,
    pub clear_existing: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            batch_number: 0,
            batch_size: 10,
            clear_existing: false,
        }
    }
}

/// Trigger for a bounded run of consecutive pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressiveRequest {
    /// 0-based first page.
    pub start_batch: usize,
    pub num_batches: usize,
    pub batch_size: usize,
    pub clear_existing: bool,
    /// Milliseconds to wait between pages.
    pub delay_between_batches: u64,
}

impl Default for ProgressiveRequest {
    fn default() -> Self {
        Self {
            start_batch: 0,
            num_batches: 5,
            batch_size: 10,
            clear_existing: false,
            delay_between_batches: 500,
        }
    }
}

struct PersistOutcome {
    inserted: usize,
    errors: usize,
}

/// Drives the analyzer over paged storage. Pages are processed strictly in order, one at a time.
pub struct AnalysisBatchDriver<S> {
    store: Arc<S>,
    analyzer: Arc<InvestorAnalyzer>,
    config: AnalysisConfig,
}

impl<S> AnalysisBatchDriver<S>
where
    S: InvestorStore + 'static,
{
    pub fn new(store: Arc<S>, analyzer: Arc<InvestorAnalyzer>, config: AnalysisConfig) -> Self {
        Self {
            store,
            analyzer,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Scores every investor, resuming from the persisted cursor when one exists.
    ///
    /// A fresh cursor clears all stored analyses first; a resumed sweep never clears. The cursor
    /// is advanced after each page and reset to 0 once the last page is done.
    pub async fn run_full_sweep(&self) -> Result<AnalysisOutcome<SweepReport>, AnalysisError> {
        self.transition(SweepPhase::FetchingCount);
        let total_investors = self.store.count().map_err(AnalysisError::Count)?;
        if total_investors == 0 {
            warn!("no investors found in store");
            self.transition(SweepPhase::Idle);
            return Ok(AnalysisOutcome::nothing(NO_INVESTORS_MESSAGE));
        }

        self.transition(SweepPhase::ResumingOrClearing);
        let progress = self.load_progress();
        let report = self.sweep(total_investors, progress).await?;
        self.transition(SweepPhase::Idle);
        Ok(AnalysisOutcome::Completed(report))
    }

    async fn sweep(
        &self,
        total_investors: usize,
        progress: BatchProgressState,
    ) -> Result<SweepReport, AnalysisError> {
        let batch_size = self.config.batch_size.max(1);
        let total_batches = total_investors.div_ceil(batch_size);
        let start = progress.last_batch_processed;

        if progress.is_fresh() {
            let removed = self.store.clear().map_err(AnalysisError::Clear)?;
            info!(removed, "cleared existing analysis");
        } else if start >= total_batches {
            warn!(
                resume_from = start,
                total_batches,
                "saved cursor is past the last page; nothing to resume, resetting cursor"
            );
        } else {
            info!(resume_from = start, total_batches, "resuming sweep");
        }

        let mut tally = ScoreTally::default();
        let mut total_inserted = 0;
        let mut total_errors = 0;
        let mut processed_count = 0;

        for batch in start..total_batches {
            self.transition(SweepPhase::ProcessingBatch(batch));
            let investors = match self.fetch_page(batch, batch_size) {
                Ok(investors) if investors.is_empty() => {
                    warn!(batch = batch + 1, total_batches, "no investors in micro-batch");
                    continue;
                }
                Ok(investors) => investors,
                Err(err) => {
                    warn!(
                        batch = batch + 1,
                        total_batches,
                        error = %err,
                        "failed to fetch micro-batch; skipping"
                    );
                    continue;
                }
            };

            let analyses = self.analyzer.analyze_batch(&investors);
            let persisted = self.persist(&analyses, batch);
            total_inserted += persisted.inserted;
            total_errors += persisted.errors;
            processed_count += investors.len();
            tally.record(&analyses);

            info!(
                batch = batch + 1,
                total_batches,
                processed = investors.len(),
                total_processed = processed_count,
                total_investors,
                "micro-batch complete"
            );

            self.save_progress(BatchProgressState::at(&self.config.job_name, batch + 1));

            if batch + 1 < total_batches {
                pause(self.config.batch_delay).await;
            }
        }

        self.transition(SweepPhase::CompletedReset);
        let progress = BatchProgressState::fresh(&self.config.job_name);
        self.save_progress(progress.clone());

        let summary = SweepSummary {
            total_investors,
            total_analyzed: tally.analyzed,
            total_inserted,
            total_errors,
            top_rated_count: tally.top_rated,
            average_score: tally.average_score(),
            score_distribution: tally.distribution,
            batch_info: SweepBatchInfo {
                total_batches,
                batch_size,
                processed_count,
                resumed_from: start,
            },
        };
        info!(
            analyzed = summary.total_analyzed,
            inserted = summary.total_inserted,
            errors = summary.total_errors,
            top_rated = summary.top_rated_count,
            average = summary.average_score,
            "investor analysis sweep complete"
        );

        Ok(SweepReport { summary, progress })
    }

    /// Scores one caller-chosen page. Does not read or write the sweep cursor.
    pub fn run_page(
        &self,
        request: PageRequest,
    ) -> Result<AnalysisOutcome<PageSummary>, AnalysisError> {
        let PageRequest {
            batch_number,
            batch_size,
            clear_existing,
        } = request;
        if batch_size == 0 {
            return Err(AnalysisError::InvalidRequest("batchSize must be at least 1"));
        }

        let total_investors = self.store.count().map_err(AnalysisError::Count)?;
        if total_investors == 0 {
            return Ok(AnalysisOutcome::nothing(NO_INVESTORS_MESSAGE));
        }

        let total_batches = total_investors.div_ceil(batch_size);
        if batch_number >= total_batches {
            return Err(AnalysisError::OutOfRange {
                requested: batch_number,
                total: total_batches,
            });
        }

        if clear_existing {
            let removed = self.store.clear().map_err(AnalysisError::Clear)?;
            info!(removed, "cleared existing analysis");
        }

        let investors = self
            .fetch_page(batch_number, batch_size)
            .map_err(|source| AnalysisError::PageFetch {
                batch: batch_number + 1,
                source,
            })?;
        if investors.is_empty() {
            return Ok(AnalysisOutcome::nothing(format!(
                "No investors found in micro-batch {}",
                batch_number + 1
            )));
        }

        let analyses = self.analyzer.analyze_batch(&investors);
        let persisted = self.persist(&analyses, batch_number);
        let tally = ScoreTally::from_analyses(&analyses);

        info!(
            batch = batch_number + 1,
            total_batches,
            analyzed = tally.analyzed,
            inserted = persisted.inserted,
            "manual micro-batch complete"
        );

        Ok(AnalysisOutcome::Completed(PageSummary {
            batch_number: batch_number + 1,
            total_batches,
            batch_size,
            total_investors,
            total_analyzed: tally.analyzed,
            total_inserted: persisted.inserted,
            total_errors: persisted.errors,
            top_rated_count: tally.top_rated,
            average_score: tally.average_score(),
            score_distribution: tally.distribution,
            range: record_range(batch_number, batch_number, batch_size, total_investors),
        }))
    }

    /// Scores `num_batches` consecutive pages starting at `start_batch`, clipped to the last page.
    pub async fn run_progressive(
        &self,
        request: ProgressiveRequest,
    ) -> Result<AnalysisOutcome<ProgressiveSummary>, AnalysisError> {
        let ProgressiveRequest {
            start_batch,
            num_batches,
            batch_size,
            clear_existing,
            delay_between_batches,
        } = request;
        if batch_size == 0 {
            return Err(AnalysisError::InvalidRequest("batchSize must be at least 1"));
        }
        if num_batches == 0 {
            return Err(AnalysisError::InvalidRequest("numBatches must be at least 1"));
        }

        let total_investors = self.store.count().map_err(AnalysisError::Count)?;
        if total_investors == 0 {
            return Ok(AnalysisOutcome::nothing(NO_INVESTORS_MESSAGE));
        }

        let total_batches = total_investors.div_ceil(batch_size);
        if start_batch >= total_batches {
            return Err(AnalysisError::OutOfRange {
                requested: start_batch,
                total: total_batches,
            });
        }
        let end_batch = start_batch
            .saturating_add(num_batches - 1)
            .min(total_batches - 1);

        if clear_existing {
            let removed = self.store.clear().map_err(AnalysisError::Clear)?;
            info!(removed, "cleared existing analysis");
        }

        let delay = Duration::from_millis(delay_between_batches);
        let mut tally = ScoreTally::default();
        let mut total_inserted = 0;
        let mut total_errors = 0;
        let mut total_processed = 0;
        let mut batch_results = Vec::with_capacity(end_batch - start_batch + 1);

        for batch in start_batch..=end_batch {
            let investors = match self.fetch_page(batch, batch_size) {
                Ok(investors) if investors.is_empty() => {
                    warn!(batch = batch + 1, "no investors in micro-batch");
                    batch_results.push(BatchResult::failed(batch + 1, "No investors found"));
                    continue;
                }
                Ok(investors) => investors,
                Err(err) => {
                    warn!(batch = batch + 1, error = %err, "failed to fetch micro-batch");
                    total_errors += 1;
                    batch_results.push(BatchResult::failed(batch + 1, err.to_string()));
                    continue;
                }
            };

            let analyses = self.analyzer.analyze_batch(&investors);
            let persisted = self.persist(&analyses, batch);
            let page_tally = ScoreTally::from_analyses(&analyses);

            total_processed += investors.len();
            total_inserted += persisted.inserted;
            total_errors += persisted.errors;
            tally.record(&analyses);

            batch_results.push(BatchResult {
                batch_number: batch + 1,
                success: true,
                processed: investors.len(),
                top_rated: page_tally.top_rated,
                inserted: Some(persisted.inserted),
                errors: Some(persisted.errors),
                average_score: Some(page_tally.average_score()),
                error: None,
            });
            info!(
                batch = batch + 1,
                processed = investors.len(),
                top_rated = page_tally.top_rated,
                "progressive micro-batch complete"
            );

            if batch < end_batch {
                debug!(delay_ms = delay_between_batches, "waiting before next micro-batch");
                pause(delay).await;
            }
        }

        Ok(AnalysisOutcome::Completed(ProgressiveSummary {
            total_investors,
            total_batches,
            batch_size,
            start_batch: start_batch + 1,
            end_batch: end_batch + 1,
            batches_processed: end_batch - start_batch + 1,
            total_analyzed: tally.analyzed,
            total_processed,
            total_top_rated: tally.top_rated,
            total_inserted,
            total_errors,
            average_score: tally.average_score(),
            score_distribution: tally.distribution,
            batch_results,
            range: record_range(start_batch, end_batch, batch_size, total_investors),
        }))
    }

    /// Page layout for a given page size.
    pub fn batch_info(&self, batch_size: usize) -> Result<BatchInfo, AnalysisError> {
        if batch_size == 0 {
            return Err(AnalysisError::InvalidRequest("batch_size must be at least 1"));
        }
        let total_investors = self.store.count().map_err(AnalysisError::Count)?;
        let total_batches = total_investors.div_ceil(batch_size);
        let batches = (0..total_batches)
            .map(|index| {
                let from = index * batch_size;
                BatchRange {
                    batch_number: index,
                    from: from + 1,
                    to: (index + 1).saturating_mul(batch_size).min(total_investors),
                    size: batch_size.min(total_investors - from),
                }
            })
            .collect();

        Ok(BatchInfo {
            total_investors,
            total_batches,
            batch_size,
            batches,
        })
    }

    /// Totals plus the highest safe start page for a progressive run of `num_batches` pages.
    pub fn progressive_info(
        &self,
        batch_size: usize,
        num_batches: usize,
    ) -> Result<ProgressiveInfo, AnalysisError> {
        if batch_size == 0 {
            return Err(AnalysisError::InvalidRequest("batch_size must be at least 1"));
        }
        let total_investors = self.store.count().map_err(AnalysisError::Count)?;
        let total_batches = total_investors.div_ceil(batch_size);

        Ok(ProgressiveInfo {
            total_investors,
            total_batches,
            batch_size,
            num_batches,
            max_start_batch: total_batches.saturating_sub(num_batches),
            recommended_batches: total_batches.min(MAX_RECOMMENDED_BATCHES),
        })
    }

    fn fetch_page(
        &self,
        batch: usize,
        batch_size: usize,
    ) -> Result<Vec<InvestorRecord>, RepositoryError> {
        self.store.page(batch * batch_size, batch_size)
    }

    /// Inserts in chunks; a failed chunk counts every row in it as an error and the rest proceed.
    fn persist(&self, analyses: &[MatchAnalysis], batch: usize) -> PersistOutcome {
        let mut outcome = PersistOutcome {
            inserted: 0,
            errors: 0,
        };
        for chunk in analyses.chunks(self.config.insert_chunk.max(1)) {
            match self.store.insert_many(chunk) {
                Ok(rows) => outcome.inserted += rows.len(),
                Err(err) => {
                    warn!(
                        batch = batch + 1,
                        rows = chunk.len(),
                        error = %err,
                        "failed to insert analysis rows"
                    );
                    outcome.errors += chunk.len();
                }
            }
        }
        outcome
    }

    /// Missing or unreadable progress starts a fresh run.
    fn load_progress(&self) -> BatchProgressState {
        match self.store.load(&self.config.job_name) {
            Ok(Some(state)) => state,
            Ok(None) => BatchProgressState::fresh(&self.config.job_name),
            Err(err) => {
                warn!(job = %self.config.job_name, error = %err, "failed to read sweep progress; starting fresh");
                BatchProgressState::fresh(&self.config.job_name)
            }
        }
    }

    fn save_progress(&self, state: BatchProgressState) {
        if let Err(err) = self.store.upsert(&state) {
            warn!(
                job = %state.job,
                last_batch_processed = state.last_batch_processed,
                error = %err,
                "failed to persist sweep progress"
            );
        }
    }

    fn transition(&self, phase: SweepPhase) {
        debug!(job = %self.config.job_name, %phase, "sweep phase");
    }
}

fn record_range(
    first_batch: usize,
    last_batch: usize,
    batch_size: usize,
    total_investors: usize,
) -> RecordRange {
    RecordRange {
        from: first_batch * batch_size + 1,
        to: (last_batch + 1).saturating_mul(batch_size).min(total_investors),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
