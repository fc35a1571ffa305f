use serde::{Deserialize, Serialize};

use super::domain::{
    BatchProgressState, InvestorId, InvestorRecord, MatchAnalysis, MatchAnalysisRecord,
    NewInvestor,
};

/// Read and intake access to the `investors` collection.
pub trait InvestorRepository: Send + Sync {
    fn count(&self) -> Result<usize, RepositoryError>;
    /// Rows ordered by id ascending, starting at `offset`.
    fn page(&self, offset: usize, limit: usize) -> Result<Vec<InvestorRecord>, RepositoryError>;
    fn insert(&self, investor: NewInvestor) -> Result<InvestorRecord, RepositoryError>;
    fn fetch(&self, id: InvestorId) -> Result<Option<InvestorRecord>, RepositoryError>;
}

/// Bulk access to the `investor_match_analysis` collection.
pub trait AnalysisRepository: Send + Sync {
    fn insert_many(
        &self,
        analyses: &[MatchAnalysis],
    ) -> Result<Vec<MatchAnalysisRecord>, RepositoryError>;
    /// Deletes every stored analysis, returning how many were removed.
    fn clear(&self) -> Result<usize, RepositoryError>;
    fn query(&self, query: &AnalysisQuery) -> Result<AnalysisSlice, RepositoryError>;
}

/// Upsert/read of resumable sweep cursors keyed by job name.
///
/// Reads and writes are not atomic with respect to each other; callers must not run two sweeps
/// of the same job concurrently.
pub trait ProgressRepository: Send + Sync {
    fn load(&self, job: &str) -> Result<Option<BatchProgressState>, RepositoryError>;
    fn upsert(&self, state: &BatchProgressState) -> Result<(), RepositoryError>;
}

/// Everything the batch driver needs from storage.
pub trait InvestorStore: InvestorRepository + AnalysisRepository + ProgressRepository {}

impl<T> InvestorStore for T where T: InvestorRepository + AnalysisRepository + ProgressRepository {}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Score,
    CreatedAt,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
    #[serde(other)]
    Unknown,
}

/// Filter, sort and paging options for reading stored analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisQuery {
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub top_rated: Option<bool>,
    pub min_score: u32,
    pub max_score: u32,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for AnalysisQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            top_rated: None,
            min_score: 0,
            max_score: 100,
            sort_by: SortKey::Score,
            sort_order: SortOrder::Desc,
        }
    }
}

/// One page of stored analyses and the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSlice {
    pub rows: Vec<MatchAnalysisRecord>,
    pub total_count: usize,
}

impl AnalysisQuery {
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.max(1)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn matches(&self, record: &MatchAnalysisRecord) -> bool {
        if self.top_rated == Some(true) && !record.top_rated {
            return false;
        }
        if self.min_score > 0 && record.score < self.min_score {
            return false;
        }
        if self.max_score < 100 && record.score > self.max_score {
            return false;
        }
        true
    }

    /// Applies filters, ordering and paging to an in-memory collection.
    ///
    /// `total_count` is the size of the unfiltered collection.
    pub fn select(&self, records: &[MatchAnalysisRecord]) -> AnalysisSlice {
        let mut rows: Vec<MatchAnalysisRecord> = records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();

        let (key, order) = match self.sort_by {
            SortKey::Unknown => (SortKey::Score, SortOrder::Desc),
            key => (key, self.sort_order),
        };
        rows.sort_by(|a, b| {
            let ordering = match key {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                _ => a.score.cmp(&b.score),
            }
            .then_with(|| a.id.cmp(&b.id));
            if order == SortOrder::Asc {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let rows = rows
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect();

        AnalysisSlice {
            rows,
            total_count: records.len(),
        }
    }
}
