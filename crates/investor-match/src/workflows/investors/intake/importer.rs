use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use super::super::domain::{InvestmentScore, NewInvestor};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read investor csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse investor csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("investor csv has no `{0}` column")]
    MissingColumn(&'static str),
}

/// Investors parsed from one upload plus the number of rows left behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub investors: Vec<NewInvestor>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    InvestorName,
    ContactPerson,
    Email,
    Description,
    Overview,
    PracticeAreas,
    BusinessModels,
    InvestorType,
    InvestmentScore,
    Website,
    CompanyLinkedin,
    FoundedYear,
    Country,
    City,
    Extra,
}

impl Column {
    fn from_header(normalized: &str) -> Self {
        match normalized {
            "investor_name" | "name" | "investor" | "firm" | "firm_name" | "company"
            | "company_name" => Column::InvestorName,
            "contact_person" | "contact" | "contact_name" => Column::ContactPerson,
            "email" | "email_address" => Column::Email,
            "description" => Column::Description,
            "overview" => Column::Overview,
            "practice_areas" | "practice_area" => Column::PracticeAreas,
            "business_models" | "business_model" => Column::BusinessModels,
            "investor_type" | "type" => Column::InvestorType,
            "investment_score" | "score" => Column::InvestmentScore,
            "website" | "url" => Column::Website,
            "company_linkedin" | "linkedin" | "linkedin_url" => Column::CompanyLinkedin,
            "founded_year" | "founded" | "year_founded" => Column::FoundedYear,
            "country" => Column::Country,
            "city" => Column::City,
            _ => Column::Extra,
        }
    }
}

/// Reads investor rows from CSV with forgiving header matching.
///
/// Rows whose width differs from the header, and rows without an investor name, are skipped
/// and counted. Columns that match no known field are kept in `extra` under their original
/// header text.
pub struct InvestorCsvImporter;

impl InvestorCsvImporter {
    pub fn from_path(path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ImportReport, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<(Column, String)> = csv_reader
            .headers()?
            .iter()
            .map(|header| {
                let original = strip_invisible(header).trim().to_string();
                (Column::from_header(&normalize_header(&original)), original)
            })
            .collect();
        if !headers
            .iter()
            .any(|(column, _)| *column == Column::InvestorName)
        {
            return Err(ImportError::MissingColumn("investor_name"));
        }

        let mut report = ImportReport::default();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|position| position.line());
            if record.len() != headers.len() {
                warn!(
                    ?line,
                    expected = headers.len(),
                    found = record.len(),
                    "skipping malformed csv row"
                );
                report.skipped += 1;
                continue;
            }

            let mut investor = NewInvestor::default();
            for ((column, header), value) in headers.iter().zip(record.iter()) {
                assign(&mut investor, *column, header, value);
            }

            if investor.investor_name.is_none() {
                debug!(?line, "skipping csv row without investor name");
                report.skipped += 1;
                continue;
            }
            report.investors.push(investor);
        }

        debug!(
            imported = report.investors.len(),
            skipped = report.skipped,
            "investor csv parsed"
        );
        Ok(report)
    }
}

fn assign(investor: &mut NewInvestor, column: Column, header: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let text = Some(value.to_string());
    match column {
        Column::InvestorName => investor.investor_name = text,
        Column::ContactPerson => investor.contact_person = text,
        Column::Email => investor.email = text,
        Column::Description => investor.description = text,
        Column::Overview => investor.overview = text,
        Column::PracticeAreas => investor.practice_areas = text,
        Column::BusinessModels => investor.business_models = text,
        Column::InvestorType => investor.investor_type = text,
        Column::InvestmentScore => investor.investment_score = Some(parse_investment_score(value)),
        Column::Website => investor.website = text,
        Column::CompanyLinkedin => investor.company_linkedin = text,
        Column::FoundedYear => investor.founded_year = parse_founded_year(value),
        Column::Country => investor.country = text,
        Column::City => investor.city = text,
        Column::Extra => {
            investor
                .extra
                .insert(header.to_string(), value.to_string());
        }
    }
}

fn strip_invisible(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "")
}

fn normalize_header(value: &str) -> String {
    strip_invisible(value)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

/// Plain numbers are stored as numbers; anything else is kept as text for the normalizer.
fn parse_investment_score(value: &str) -> InvestmentScore {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => InvestmentScore::Numeric(number),
        _ => InvestmentScore::Text(value.to_string()),
    }
}

fn parse_founded_year(value: &str) -> Option<i32> {
    if let Ok(year) = value.parse::<i32>() {
        return Some(year);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|year| year.is_finite() && year.fract() == 0.0)
        .map(|year| year as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_normalize_and_resolve_aliases() {
        assert_eq!(normalize_header("\u{feff} Firm  Name "), "firm_name");
        assert_eq!(normalize_header("Practice-Areas"), "practice_areas");
        assert_eq!(
            Column::from_header(&normalize_header("Firm Name")),
            Column::InvestorName
        );
        assert_eq!(Column::from_header("fund_size"), Column::Extra);
    }

    #[test]
    fn lenient_numeric_fields() {
        assert_eq!(parse_founded_year("2015"), Some(2015));
        assert_eq!(parse_founded_year("2015.0"), Some(2015));
        assert_eq!(parse_founded_year("circa 2015"), None);
        assert_eq!(parse_investment_score("85"), InvestmentScore::Numeric(85.0));
        assert_eq!(
            parse_investment_score("85/100"),
            InvestmentScore::Text("85/100".to_string())
        );
    }

    #[test]
    fn imports_rows_and_keeps_unknown_columns() {
        let csv = "\u{feff}Name,Contact Person,Investor Type,Investment Score,Founded Year,Fund Size\n\
                   Acme Ventures,Jane Doe,VC,85/100,2015,$50M\n\
                   Beta Capital,John Roe,Angel,,,\n";
        let report = InvestorCsvImporter::from_reader(csv.as_bytes()).expect("csv imports");

        assert_eq!(report.skipped, 0);
        assert_eq!(report.investors.len(), 2);
        let acme = &report.investors[0];
        assert_eq!(acme.investor_name.as_deref(), Some("Acme Ventures"));
        assert_eq!(acme.contact_person.as_deref(), Some("Jane Doe"));
        assert_eq!(acme.founded_year, Some(2015));
        assert_eq!(
            acme.investment_score,
            Some(InvestmentScore::Text("85/100".to_string()))
        );
        assert_eq!(acme.extra.get("Fund Size").map(String::as_str), Some("$50M"));

        let beta = &report.investors[1];
        assert!(beta.investment_score.is_none());
        assert!(beta.extra.is_empty());
    }

    #[test]
    fn skips_malformed_and_nameless_rows() {
        let csv = "investor_name,city\n\
                   Acme,Austin\n\
                   Broken,Row,Extra\n\
                   ,Boston\n\
                   Gamma,Denver\n";
        let report = InvestorCsvImporter::from_reader(csv.as_bytes()).expect("csv imports");
        assert_eq!(report.skipped, 2);
        let names: Vec<_> = report
            .investors
            .iter()
            .filter_map(|investor| investor.investor_name.as_deref())
            .collect();
        assert_eq!(names, ["Acme", "Gamma"]);
    }

    #[test]
    fn rejects_files_without_a_name_column() {
        let csv = "email,city\njane@example.com,Austin\n";
        assert!(matches!(
            InvestorCsvImporter::from_reader(csv.as_bytes()),
            Err(ImportError::MissingColumn("investor_name"))
        ));
    }
}
