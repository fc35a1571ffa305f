use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{InvestorRecord, MatchAnalysisRecord, NewInvestor};
use super::intake::{validate_new_investor, ImportError, IntakeError, InvestorCsvImporter};
use super::repository::{AnalysisQuery, InvestorStore, RepositoryError};

/// Investor intake and analysis reads over the shared store.
pub struct InvestorDirectoryService<S> {
    store: Arc<S>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Stored analysis joined with its investor row, when the investor still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisView {
    #[serde(flatten)]
    pub analysis: MatchAnalysisRecord,
    pub investor: Option<InvestorRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    fn new(page: usize, limit: usize, total_count: usize) -> Self {
        let total_pages = total_count.div_ceil(limit);
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisListing {
    pub data: Vec<AnalysisView>,
    pub pagination: Pagination,
}

impl<S> InvestorDirectoryService<S>
where
    S: InvestorStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn add_investor(&self, investor: NewInvestor) -> Result<InvestorRecord, DirectoryError> {
        validate_new_investor(&investor)?;
        let record = self.store.insert(investor)?;
        info!(investor_id = %record.id, "investor added");
        Ok(record)
    }

    /// Parses the upload fully before inserting anything.
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<ImportSummary, DirectoryError> {
        let report = InvestorCsvImporter::from_reader(reader)?;
        let mut imported = 0;
        for investor in report.investors {
            self.store.insert(investor)?;
            imported += 1;
        }
        info!(imported, skipped = report.skipped, "investor csv imported");
        Ok(ImportSummary {
            imported,
            skipped: report.skipped,
        })
    }

    pub fn list_analyses(&self, query: &AnalysisQuery) -> Result<AnalysisListing, DirectoryError> {
        let slice = self.store.query(query)?;
        let mut data = Vec::with_capacity(slice.rows.len());
        for analysis in slice.rows {
            let investor = self.store.fetch(analysis.investor_id)?;
            data.push(AnalysisView { analysis, investor });
        }

        Ok(AnalysisListing {
            data,
            pagination: Pagination::new(query.page(), query.limit(), slice.total_count),
        })
    }
}
