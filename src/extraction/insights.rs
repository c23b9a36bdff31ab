// Keyword insights attached to user turns

use crate::models::{Insight, InsightKind};

struct InsightRule {
    keywords: &'static [&'static str],
    kind: InsightKind,
    message: &'static str,
    confidence: f32,
}

const INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        keywords: &["staff", "recruitment"],
        kind: InsightKind::Pattern,
        message: "Staffing concerns are commonly reported across departments in the health sector.",
        confidence: 0.8,
    },
    InsightRule {
        keywords: &["student", "placement"],
        kind: InsightKind::Opportunity,
        message: "Student placement challenges often indicate partnership development opportunities.",
        confidence: 0.7,
    },
    InsightRule {
        keywords: &["technology", "system"],
        kind: InsightKind::Trend,
        message: "Technology infrastructure is a recurring theme in stakeholder feedback.",
        confidence: 0.75,
    },
];

/// Derive insights from a user message
pub fn extract_insights(user_text: &str) -> Vec<Insight> {
    let lowered = user_text.to_lowercase();
    INSIGHT_RULES
        .iter()
        .filter(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map(|rule| Insight {
            kind: rule.kind,
            message: rule.message.to_string(),
            confidence: rule.confidence,
        })
        .collect()
}
