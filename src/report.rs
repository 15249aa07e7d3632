//! Static review analytics shown on the report tab

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub time_period: TimePeriod,
    pub critical_insights: Vec<&'static str>,
    pub metrics: Metrics,
    /// Industry name and share of reviews, largest first
    pub industry_distribution: Vec<Share>,
    pub feature_analysis: FeatureAnalysis,
    pub buyer_personas: BuyerPersonas,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimePeriod {
    pub label: &'static str,
    pub total_reviews: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric<T> {
    pub value: T,
    pub change: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub total_reviews: Metric<u32>,
    pub satisfaction_score: Metric<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Share {
    pub name: &'static str,
    pub percentage: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore {
    pub name: &'static str,
    /// Score out of 5
    pub score: f32,
    /// Score as a percentage of the maximum, for bar widths
    pub percent: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<&'static str>,
}

impl FeatureScore {
    fn new(name: &'static str, score: f32) -> Self {
        Self {
            name,
            score,
            percent: score / 5.0 * 100.0,
            details: Vec::new(),
        }
    }

    fn with_details(mut self, details: &[&'static str]) -> Self {
        self.details = details.to_vec();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureAnalysis {
    pub strongest: Vec<FeatureScore>,
    pub improvements: Vec<FeatureScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Persona {
    pub title: &'static str,
    pub stakeholder: &'static str,
    pub concerns: Vec<Share>,
    pub requirements: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyerPersonas {
    pub technical: Persona,
    pub operations: Persona,
}

/// Headline cards derived from the report body
#[derive(Debug, Clone, Serialize)]
pub struct Highlights {
    pub top_industry: Option<Share>,
    pub top_concern: Option<Share>,
}

impl Report {
    pub fn highlights(&self) -> Highlights {
        let top = |shares: &[Share]| shares.iter().max_by_key(|s| s.percentage).cloned();
        Highlights {
            top_industry: top(&self.industry_distribution),
            top_concern: top(&self.buyer_personas.technical.concerns),
        }
    }
}

fn share(name: &'static str, percentage: u8) -> Share {
    Share { name, percentage }
}

/// G2 enterprise reviews, June 2024
pub fn june_2024() -> Report {
    Report {
        time_period: TimePeriod {
            label: "June 1-30, 2024",
            total_reviews: 142,
        },
        critical_insights: vec![
            "Enterprise security becoming primary selection factor",
            "API capabilities driving technical evaluation",
            "Integration depth increasingly critical",
            "Compliance feature gap emerging",
        ],
        metrics: Metrics {
            total_reviews: Metric {
                value: 142,
                change: "+15% quarter",
            },
            satisfaction_score: Metric {
                value: 4.4,
                change: "+0.2 from Q1",
            },
        },
        industry_distribution: vec![
            share("Technology", 35),
            share("Financial Services", 25),
            share("Healthcare", 20),
            share("Manufacturing", 15),
            share("Others", 5),
        ],
        feature_analysis: FeatureAnalysis {
            strongest: vec![
                FeatureScore::new("Content Quality", 4.8),
                FeatureScore::new("Accuracy", 4.7),
                FeatureScore::new("Brand voice", 4.6),
                FeatureScore::new("Multi-language", 4.5),
            ],
            improvements: vec![
                FeatureScore::new("Role-based Access", 3.7).with_details(&[
                    "Detailed permissions needed",
                    "Department-level controls lacking",
                ]),
                FeatureScore::new("Enterprise SSO", 3.5)
                    .with_details(&["Limited provider options", "Complex implementation"]),
            ],
        },
        buyer_personas: BuyerPersonas {
            technical: Persona {
                title: "Technical Decision Makers",
                stakeholder: "Primary Stakeholder",
                concerns: vec![
                    share("API capabilities", 45),
                    share("Security features", 38),
                    share("Integration depth", 35),
                    share("Performance metrics", 28),
                ],
                requirements: vec![
                    "REST API documentation",
                    "Security certifications",
                    "Integration scalability",
                    "Performance SLAs",
                ],
            },
            operations: Persona {
                title: "Operations Leaders",
                stakeholder: "Secondary Stakeholder",
                concerns: vec![
                    share("Team workflows", 52),
                    share("Scale requirements", 48),
                    share("Template management", 42),
                    share("Quality controls", 35),
                ],
                requirements: vec![
                    "Team collaboration tools",
                    "Bulk operations",
                    "Template systems",
                    "Quality metrics",
                ],
            },
        },
    }
}
