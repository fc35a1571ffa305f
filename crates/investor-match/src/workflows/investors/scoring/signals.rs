use super::super::domain::{InvestmentScore, InvestorRecord};

/// Additive points for substrings in the investor type. Any alias in a row earns the points once.
const TYPE_WEIGHTS: &[(&[&str], u32)] = &[
    (&["venture capital", "vc"], 25),
    (&["angel", "seed"], 20),
    (&["early stage", "startup"], 20),
    (&["technology", "tech"], 15),
    (&["ai", "artificial intelligence"], 30),
    (&["software", "saas"], 15),
    (&["enterprise"], 15),
    (&["growth"], 10),
    (&["private equity"], 8),
    (&["investment"], 5),
];

const TECH_HUBS: &[&str] = &[
    "united states",
    "usa",
    "us",
    "canada",
    "uk",
    "united kingdom",
    "germany",
    "france",
    "singapore",
    "israel",
];

pub(crate) fn investor_type_score(investor_type: Option<&str>) -> u32 {
    let lower = match investor_type {
        Some(value) if !value.is_empty() => value.to_lowercase(),
        _ => return 0,
    };

    let score: u32 = TYPE_WEIGHTS
        .iter()
        .filter(|(aliases, _)| aliases.iter().any(|alias| lower.contains(alias)))
        .map(|(_, points)| points)
        .sum();

    score.min(100)
}

/// Maps any supported representation onto 0-100. Unparseable input yields 0 rather than an error.
pub fn normalize_investment_score(score: &InvestmentScore) -> f64 {
    match score {
        InvestmentScore::Numeric(value) => clamp_percent(*value),
        InvestmentScore::Text(raw) => normalize_text_score(raw),
    }
}

fn normalize_text_score(raw: &str) -> f64 {
    if let Some((numerator, denominator)) = raw.split_once('/') {
        let denominator = denominator.split('/').next().unwrap_or_default();
        return match (parse_leading_float(numerator), parse_leading_float(denominator)) {
            (Some(numerator), Some(denominator)) if denominator > 0.0 => {
                clamp_percent(numerator / denominator * 100.0)
            }
            _ => 0.0,
        };
    }

    if raw.contains('%') {
        return parse_leading_float(&raw.replace('%', ""))
            .map(clamp_percent)
            .unwrap_or(0.0);
    }

    parse_leading_float(raw).map(clamp_percent).unwrap_or(0.0)
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Parses the longest numeric prefix, tolerating trailing text such as `"85 points"`.
fn parse_leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let candidate_len = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());

    (1..=candidate_len)
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Bonus for data completeness and location fit. At most 25 points.
pub(crate) fn additional_signals_score(investor: &InvestorRecord, reference_year: i32) -> u32 {
    let mut score = 0;

    if non_empty(investor.website.as_deref()) {
        score += 5;
    }
    if non_empty(investor.company_linkedin.as_deref()) {
        score += 5;
    }

    if let Some(founded) = investor.founded_year {
        let age = reference_year.saturating_sub(founded);
        if age <= 10 {
            score += 10;
        } else if age <= 20 {
            score += 5;
        }
    }

    if let Some(country) = investor.country.as_deref().filter(|c| !c.is_empty()) {
        let lower = country.to_lowercase();
        if TECH_HUBS.iter().any(|hub| lower.contains(hub)) {
            score += 5;
        }
    }

    score
}

fn non_empty(value: Option<&str>) -> bool {
    value.map(|v| !v.is_empty()).unwrap_or(false)
}
