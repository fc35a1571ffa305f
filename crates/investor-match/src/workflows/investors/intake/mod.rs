//! Investor intake: manual single-record creation and bulk CSV import.

mod importer;

pub use importer::{ImportError, ImportReport, InvestorCsvImporter};

use super::domain::NewInvestor;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Rejects submissions missing an investor name or contact person.
pub fn validate_new_investor(investor: &NewInvestor) -> Result<(), IntakeError> {
    if is_blank(investor.investor_name.as_deref()) {
        return Err(IntakeError::MissingField("investor_name"));
    }
    if is_blank(investor.contact_person.as_deref()) {
        return Err(IntakeError::MissingField("contact_person"));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}
