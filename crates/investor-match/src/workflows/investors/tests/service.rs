use std::sync::Arc;

use super::common::*;

use crate::workflows::investors::domain::{InvestorId, NewInvestor};
use crate::workflows::investors::intake::IntakeError;
use crate::workflows::investors::memory::InMemoryInvestorStore;
use crate::workflows::investors::repository::{AnalysisQuery, AnalysisRepository, SortOrder};
use crate::workflows::investors::service::{DirectoryError, InvestorDirectoryService};

#[test]
fn add_investor_validates_before_storing() {
    let store = Arc::new(InMemoryInvestorStore::default());
    let service = InvestorDirectoryService::new(store.clone());

    let error = service
        .add_investor(NewInvestor {
            contact_person: Some("Jane Doe".to_string()),
            ..NewInvestor::default()
        })
        .expect_err("missing name");
    assert!(matches!(
        error,
        DirectoryError::Intake(IntakeError::MissingField("investor_name"))
    ));
    assert!(store.analyses().is_empty());

    let record = service
        .add_investor(strong_investor("Apex AI Ventures"))
        .expect("stored");
    assert_eq!(record.id, InvestorId(1));
}

#[test]
fn import_reports_rejected_files() {
    let service = InvestorDirectoryService::new(Arc::new(InMemoryInvestorStore::default()));
    let result = service.import_csv("email\njane@example.com\n".as_bytes());

    assert!(matches!(result, Err(DirectoryError::Import(_))));
}

#[test]
fn listing_joins_investors_and_honours_sort_order() {
    let store = Arc::new(seeded_store(3));
    store
        .insert_many(&[stale_analysis(1), stale_analysis(3)])
        .expect("seed analyses");
    let mut low = stale_analysis(2);
    low.score = 0;
    store.insert_many(&[low]).expect("seed analyses");

    let service = InvestorDirectoryService::new(store);
    let listing = service
        .list_analyses(&AnalysisQuery {
            sort_order: SortOrder::Asc,
            ..AnalysisQuery::default()
        })
        .expect("listing");

    let investors: Vec<u64> = listing
        .data
        .iter()
        .map(|view| view.analysis.investor_id.0)
        .collect();
    assert_eq!(investors, [2, 1, 3]);
    assert!(listing.data.iter().all(|view| view.investor.is_some()));
    assert_eq!(listing.pagination.total_count, 3);
    assert_eq!(listing.pagination.total_pages, 1);
}

#[test]
fn listing_tolerates_missing_investor_rows() {
    let store = Arc::new(InMemoryInvestorStore::default());
    store
        .insert_many(&[stale_analysis(42)])
        .expect("seed analyses");

    let listing = InvestorDirectoryService::new(store)
        .list_analyses(&AnalysisQuery::default())
        .expect("listing");

    assert_eq!(listing.data.len(), 1);
    assert!(listing.data[0].investor.is_none());
}
