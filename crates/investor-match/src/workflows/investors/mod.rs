//! Investor scoring against the company profile, the resumable micro-batch driver that runs it
//! over the whole collection, and the intake and listing paths around them.

pub mod batch;
pub mod domain;
pub mod intake;
pub mod memory;
pub mod profile;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use batch::{
    AnalysisBatchDriver, AnalysisError, AnalysisOutcome, PageRequest, PageSummary,
    ProgressiveRequest, ProgressiveSummary, SweepPhase, SweepReport, SweepSummary,
};
pub use domain::{
    BatchProgressState, CompanyProfile, InvestmentScore, InvestorId, InvestorRecord,
    MatchAnalysis, MatchAnalysisRecord, NewInvestor,
};
pub use intake::{
    validate_new_investor, ImportError, ImportReport, IntakeError, InvestorCsvImporter,
};
pub use memory::InMemoryInvestorStore;
pub use profile::{FocusArea, KeywordCatalog};
pub use repository::{
    AnalysisQuery, AnalysisRepository, AnalysisSlice, InvestorRepository, InvestorStore,
    ProgressRepository, RepositoryError, SortKey, SortOrder,
};
pub use router::{investor_router, InvestorApi};
pub use scoring::{AnalysisResult, AnalyzerSettings, InvestorAnalyzer};
pub use service::{AnalysisListing, DirectoryError, ImportSummary, InvestorDirectoryService};
