use super::common::*;

use crate::workflows::investors::domain::{
    CompanyProfile, InvestmentScore, InvestorId, InvestorRecord,
};
use crate::workflows::investors::profile::KeywordCatalog;
use crate::workflows::investors::scoring::{AnalyzerSettings, InvestorAnalyzer, NO_REASON};

#[test]
fn strong_investor_scores_past_one_hundred_without_clamp() {
    let result = analyzer().analyze(&record(1, strong_investor("Apex AI Ventures")));

    assert_eq!(result.score, 130);
    assert!(result.top_rated);
    assert_eq!(result.reason(), "Base investment score: 90/100");
}

#[test]
fn clamp_setting_caps_final_score() {
    let analyzer = InvestorAnalyzer::with_settings(
        &CompanyProfile::standard(),
        &KeywordCatalog::standard(),
        AnalyzerSettings {
            reference_year: REFERENCE_YEAR,
            clamp_final_score: true,
        },
    );
    let result = analyzer.analyze(&record(1, strong_investor("Apex AI Ventures")));

    assert_eq!(result.score, 100);
    assert!(result.raw_score > 100.0);
}

#[test]
fn sparse_investor_gets_placeholder_reason() {
    let result = analyzer().analyze(&record(7, weak_investor("Corner Bakery Fund")));

    assert_eq!(result.score, 0);
    assert!(!result.top_rated);
    assert_eq!(result.reason(), NO_REASON);
    assert_eq!(result.investor_id, InvestorId(7));
}

#[test]
fn zero_investment_score_is_ignored() {
    let mut investor = weak_investor("Zero Score Capital");
    investor.investment_score = Some(InvestmentScore::Numeric(0.0));
    let result = analyzer().analyze(&record(1, investor));

    assert!(result.reasons.is_empty());
    assert_eq!(result.score, 0);
}

#[test]
fn malformed_investment_score_contributes_nothing_but_is_reported() {
    let mut investor = weak_investor("Garbage Score Capital");
    investor.investment_score = Some(InvestmentScore::Text("n/a".to_string()));
    let result = analyzer().analyze(&record(1, investor));

    assert_eq!(result.score, 0);
    assert_eq!(result.reason(), "Base investment score: n/a");
}

#[test]
fn batch_is_sorted_by_score_then_id_and_top_decile_is_forced() {
    let investors: Vec<_> = (1..=25)
        .map(|rank| record(u64::from(rank), ranked_investor(rank)))
        .collect();
    let analyses = analyzer().analyze_batch(&investors);

    assert_eq!(analyses.len(), 25);
    for pair in analyses.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].investor_id < pair[1].investor_id)
        );
    }

    let top: Vec<u64> = analyses
        .iter()
        .filter(|analysis| analysis.top_rated)
        .map(|analysis| analysis.investor_id.0)
        .collect();
    // 24 and 23 both round to 14, so the lower id ranks first.
    assert_eq!(top, [25, 23, 24]);
}

fn top_rated_ids(investors: &[InvestorRecord]) -> Vec<u64> {
    analyzer()
        .analyze_batch(investors)
        .iter()
        .filter(|analysis| analysis.top_rated)
        .map(|analysis| analysis.investor_id.0)
        .collect()
}

#[test]
fn batch_of_ten_forces_exactly_one_top_rated() {
    // Investment scores 9..90 give distinct final scores 2..18.
    let investors: Vec<_> = (1..=10)
        .map(|rank| record(u64::from(rank), ranked_investor(rank * 3)))
        .collect();
    let analyses = analyzer().analyze_batch(&investors);
    let mut scores: Vec<u32> = analyses.iter().map(|analysis| analysis.score).collect();
    scores.dedup();
    assert_eq!(scores.len(), 10);
    assert!(scores.iter().all(|score| *score < 80));

    assert_eq!(top_rated_ids(&investors), [10]);
}

#[test]
fn batch_of_ten_keeps_threshold_flag_below_the_top_spot() {
    let investors: Vec<_> = (1..=10)
        .map(|id| match id {
            4 | 9 => record(u64::from(id), strong_investor("Strong")),
            rank => record(u64::from(rank), ranked_investor(rank * 3)),
        })
        .collect();

    assert_eq!(top_rated_ids(&investors), [4, 9]);
}

#[test]
fn equal_scores_keep_investor_id_order() {
    let investors: Vec<_> = [3, 1, 2]
        .into_iter()
        .map(|id| record(id, weak_investor("Same")))
        .collect();
    let analyses = analyzer().analyze_batch(&investors);

    let ids: Vec<u64> = analyses.iter().map(|a| a.investor_id.0).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert!(analyses[0].top_rated);
    assert!(!analyses[1].top_rated);
}

#[test]
fn threshold_flag_survives_outside_top_decile() {
    let investors: Vec<_> = (1..=20)
        .map(|id| record(id, strong_investor("Strong")))
        .collect();
    let analyses = analyzer().analyze_batch(&investors);

    assert!(analyses.iter().all(|analysis| analysis.top_rated));
}

#[test]
fn single_record_batch_is_top_rated_and_empty_batch_is_empty() {
    let analyses = analyzer().analyze_batch(&[record(1, weak_investor("Solo"))]);
    assert_eq!(analyses.len(), 1);
    assert!(analyses[0].top_rated);

    assert!(analyzer().analyze_batch(&[]).is_empty());
}

#[test]
fn older_firms_earn_less_completeness_bonus() {
    let mut young = weak_investor("Young");
    young.founded_year = Some(REFERENCE_YEAR - 5);
    let mut mature = weak_investor("Mature");
    mature.founded_year = Some(REFERENCE_YEAR - 15);
    let mut old = weak_investor("Old");
    old.founded_year = Some(REFERENCE_YEAR - 40);

    let scorer = analyzer();
    assert_eq!(scorer.analyze(&record(1, young)).score, 10);
    assert_eq!(scorer.analyze(&record(2, mature)).score, 5);
    assert_eq!(scorer.analyze(&record(3, old)).score, 0);
}

#[test]
fn extreme_founded_year_is_scored_not_rejected() {
    let mut ancient = weak_investor("Ancient");
    ancient.founded_year = Some(i32::MIN);

    let result = analyzer().analyze(&record(1, ancient));
    assert_eq!(result.score, 0);
}
