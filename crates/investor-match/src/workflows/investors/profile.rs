use serde::{Deserialize, Serialize};

use super::domain::CompanyProfile;

/// Keyword dictionaries applied to every free-text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCatalog {
    /// Generic signals of interest in AI and enterprise software companies.
    pub interest_keywords: Vec<String>,
    /// Named focus areas and the keywords that indicate each one.
    pub focus_areas: Vec<FocusArea>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    pub name: String,
    pub keywords: Vec<String>,
}

const INTEREST_KEYWORDS: &[&str] = &[
    // AI / ML
    "artificial intelligence",
    "machine learning",
    "AI",
    "ML",
    "deep learning",
    "neural networks",
    "generative AI",
    "automation",
    "intelligent systems",
    "cognitive",
    "agent systems",
    // Technology
    "technology",
    "tech",
    "software",
    "SaaS",
    "enterprise software",
    "platform",
    "digital transformation",
    "innovation",
    "disruptive",
    "emerging technology",
    // Business models
    "B2B",
    "enterprise",
    "SaaS",
    "subscription",
    "recurring revenue",
    "scalable",
    // Stages
    "seed",
    "early stage",
    "startup",
    "growth",
    "venture capital",
    "angel investment",
    // Sectors
    "fintech",
    "healthtech",
    "enterprise",
    "manufacturing",
    "financial services",
    // Positive indicators
    "innovative",
    "disruptive",
    "transformative",
    "scalable",
    "high growth",
    "market leader",
    "competitive advantage",
    "proprietary",
    "intellectual property",
];

const FOCUS_AREAS: &[(&str, &[&str])] = &[
    (
        "ai_ml",
        &[
            "artificial intelligence",
            "machine learning",
            "AI",
            "ML",
            "deep learning",
            "neural networks",
            "generative AI",
        ],
    ),
    (
        "enterprise",
        &[
            "enterprise",
            "B2B",
            "corporate",
            "business software",
            "enterprise software",
        ],
    ),
    (
        "saas",
        &[
            "SaaS",
            "software as a service",
            "subscription",
            "recurring revenue",
        ],
    ),
    (
        "fintech",
        &[
            "fintech",
            "financial technology",
            "banking",
            "payments",
            "financial services",
        ],
    ),
    (
        "healthtech",
        &[
            "healthtech",
            "healthcare technology",
            "medical",
            "healthcare",
        ],
    ),
    (
        "automation",
        &["automation", "workflow", "process automation", "efficiency"],
    ),
    (
        "data",
        &[
            "data",
            "analytics",
            "insights",
            "business intelligence",
            "data integration",
        ],
    ),
];

impl KeywordCatalog {
    pub fn standard() -> Self {
        Self {
            interest_keywords: INTEREST_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            focus_areas: FOCUS_AREAS
                .iter()
                .map(|(name, keywords)| FocusArea {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl Default for KeywordCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl CompanyProfile {
    /// The operator's company as configured for investor matching.
    pub fn standard() -> Self {
        Self {
            name: "Neural Arc".to_string(),
            description: "Neural Arc is a generative artificial intelligence company establishing \
                the cognitive infrastructure for enterprises. Its intelligent agent systems \
                integrate natively with existing data, allowing organisations to automate \
                decisions, streamline workflows, and extract actionable insights without costly \
                system replacement."
                .to_string(),
            industry: "Artificial Intelligence".to_string(),
            stage: "Seed".to_string(),
            funding_needed: "Seed round".to_string(),
            key_technologies: owned(&[
                "Generative AI",
                "Machine Learning",
                "Enterprise Software",
                "Agent Systems",
                "Data Integration",
                "Workflow Automation",
                "Cognitive Computing",
            ]),
            target_markets: owned(&[
                "Enterprise",
                "B2B",
                "SaaS",
                "Financial Services",
                "Healthcare",
                "Manufacturing",
                "Technology",
            ]),
            business_model: "SaaS".to_string(),
            competitive_advantages: owned(&[
                "Proprietary AI agent framework",
                "Native data integration",
                "Rapid deployment capability",
                "Experienced founding team",
                "Strong market momentum in agentic automation",
            ]),
        }
    }
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self::standard()
    }
}
