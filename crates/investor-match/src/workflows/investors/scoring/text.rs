use super::super::domain::CompanyProfile;
use super::super::profile::KeywordCatalog;

const INTEREST_POINTS: u32 = 5;
const FOCUS_POINTS: u32 = 8;
const COMPANY_POINTS: u32 = 10;
const DETAIL_BONUS: u32 = 5;
const DETAIL_THRESHOLD_CHARS: usize = 200;
const MAX_SCORE: u32 = 100;

/// Keyword relevance of a free-text field, pre-lowercased once at construction.
///
/// Matching is an unanchored substring test, so a short keyword such as "ai" also matches
/// inside "chain" or "maintain".
#[derive(Debug, Clone)]
pub(crate) struct TextRelevanceScorer {
    interest: Vec<String>,
    focus: Vec<Vec<String>>,
    company: Vec<String>,
}

impl TextRelevanceScorer {
    pub(crate) fn new(catalog: &KeywordCatalog, profile: &CompanyProfile) -> Self {
        Self {
            interest: lowercase_all(catalog.interest_keywords.iter().map(String::as_str)),
            focus: catalog
                .focus_areas
                .iter()
                .map(|area| lowercase_all(area.keywords.iter().map(String::as_str)))
                .collect(),
            company: lowercase_all(profile.match_terms()),
        }
    }

    pub(crate) fn score(&self, text: Option<&str>) -> u32 {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return 0,
        };

        let lower = text.to_lowercase();
        let hits = |keywords: &[String]| {
            keywords
                .iter()
                .filter(|keyword| lower.contains(keyword.as_str()))
                .count() as u32
        };

        let mut score = hits(&self.interest) * INTEREST_POINTS;
        score += self
            .focus
            .iter()
            .map(|keywords| hits(keywords) * FOCUS_POINTS)
            .sum::<u32>();
        score += hits(&self.company) * COMPANY_POINTS;

        if text.chars().count() > DETAIL_THRESHOLD_CHARS {
            score += DETAIL_BONUS;
        }

        score.min(MAX_SCORE)
    }
}

fn lowercase_all<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values.map(str::to_lowercase).collect()
}
