use chrono::Utc;
use clap::Args;
use investor_match::config::AnalysisConfig;
use investor_match::error::AppError;
use investor_match::workflows::investors::{
    AnalysisBatchDriver, AnalysisOutcome, AnalyzerSettings, CompanyProfile, InMemoryInvestorStore,
    InvestorAnalyzer, InvestorCsvImporter, InvestorId, KeywordCatalog, NewInvestor, SweepReport,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Investor CSV export to analyze
    pub(crate) csv: PathBuf,
    /// Investors per micro-batch (defaults to the service setting)
    #[arg(long)]
    pub(crate) batch_size: Option<usize>,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Investor CSV export to score
    pub(crate) csv: PathBuf,
    /// Only print the highest ranked N investors
    #[arg(long)]
    pub(crate) top: Option<usize>,
    /// Year used to age founded_year (defaults to the current year)
    #[arg(long)]
    pub(crate) reference_year: Option<i32>,
    /// Cap final scores at 100
    #[arg(long)]
    pub(crate) clamp: bool,
    /// Print the ranking as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ScoreRow {
    pub(crate) rank: usize,
    pub(crate) investor_id: InvestorId,
    pub(crate) investor_name: String,
    pub(crate) score: u32,
    pub(crate) top_rated: bool,
    pub(crate) reason: String,
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        csv,
        batch_size,
        json,
    } = args;

    let import = InvestorCsvImporter::from_path(&csv)?;
    let skipped = import.skipped;
    let store = Arc::new(InMemoryInvestorStore::with_investors(import.investors));

    let defaults = AnalysisConfig::default();
    let config = AnalysisConfig {
        batch_size: batch_size.unwrap_or(defaults.batch_size).max(1),
        batch_delay: Duration::ZERO,
        ..defaults
    };
    let driver = AnalysisBatchDriver::new(store, Arc::new(InvestorAnalyzer::default()), config);

    match driver.run_full_sweep().await? {
        AnalysisOutcome::NothingToDo { message } => println!("{message}"),
        AnalysisOutcome::Completed(report) if json => print_json(&report.summary)?,
        AnalysisOutcome::Completed(report) => render_sweep(&csv, skipped, &report),
    }
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        csv,
        top,
        reference_year,
        clamp,
        json,
    } = args;

    let mut settings = AnalyzerSettings {
        clamp_final_score: clamp,
        ..AnalyzerSettings::default()
    };
    if let Some(year) = reference_year {
        settings.reference_year = year;
    }
    let analyzer = InvestorAnalyzer::with_settings(
        &CompanyProfile::standard(),
        &KeywordCatalog::standard(),
        settings,
    );

    let import = InvestorCsvImporter::from_path(&csv)?;
    let mut rows = score_rows(&analyzer, import.investors);
    if let Some(limit) = top {
        rows.truncate(limit);
    }

    if json {
        print_json(&rows)?;
    } else {
        render_ranking(&rows);
    }
    Ok(())
}

/// Ranks all investors as a single batch, numbering them in file order.
pub(crate) fn score_rows(
    analyzer: &InvestorAnalyzer,
    investors: Vec<NewInvestor>,
) -> Vec<ScoreRow> {
    let records: Vec<_> = investors
        .into_iter()
        .zip(1..)
        .map(|(investor, id)| investor.into_record(InvestorId(id)))
        .collect();
    let names: HashMap<InvestorId, String> = records
        .iter()
        .map(|record| {
            (
                record.id,
                record.investor_name.clone().unwrap_or_default(),
            )
        })
        .collect();

    analyzer
        .analyze_batch(&records)
        .into_iter()
        .enumerate()
        .map(|(index, analysis)| ScoreRow {
            rank: index + 1,
            investor_id: analysis.investor_id,
            investor_name: names
                .get(&analysis.investor_id)
                .cloned()
                .unwrap_or_default(),
            score: analysis.score,
            top_rated: analysis.top_rated,
            reason: analysis.reason,
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn render_sweep(csv: &std::path::Path, skipped: usize, report: &SweepReport) {
    let summary = &report.summary;
    println!("Investor analysis for {}", csv.display());
    println!("  Generated:          {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    println!("  Investors:          {}", summary.total_investors);
    if skipped > 0 {
        println!("  Skipped CSV rows:   {skipped}");
    }
    println!(
        "  Micro-batches:      {} x {}",
        summary.batch_info.total_batches, summary.batch_info.batch_size
    );
    println!("  Analyzed:           {}", summary.total_analyzed);
    println!("  Inserted:           {}", summary.total_inserted);
    println!("  Errors:             {}", summary.total_errors);
    println!("  Top rated:          {}", summary.top_rated_count);
    println!("  Average score:      {}", summary.average_score);
    println!(
        "  Distribution:       high {} / medium {} / low {}",
        summary.score_distribution.high,
        summary.score_distribution.medium,
        summary.score_distribution.low
    );
}

fn render_ranking(rows: &[ScoreRow]) {
    if rows.is_empty() {
        println!("No investors found to score");
        return;
    }

    println!("{:>4}  {:>5}  {:<3}  {:<32}  Reason", "Rank", "Score", "Top", "Investor");
    for row in rows {
        println!(
            "{:>4}  {:>5}  {:<3}  {:<32}  {}",
            row.rank,
            row.score,
            if row.top_rated { "*" } else { "" },
            truncate(&row.investor_name, 32),
            row.reason
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
        shortened.push('~');
        shortened
    }
}
