// Extraction pass - populate summary records from a user/assistant exchange
//
// Matching is plain keyword containment on the lowercased exchange, plus two
// regex rules for delivery plans. Records are only ever added.

mod insights;
mod rules;

pub use insights::extract_insights;
pub use rules::{trigger_rules, TriggerRule};

use crate::models::{
    ConsultationTool, DeliveryProject, SummaryBoard, SummaryCategory, SummaryRecord,
    TimelineEntry,
};
use regex::Regex;
use serde::Serialize;

/// Stakeholder values substituted into owner/lead fields
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub department: &'a str,
    pub lead: &'a str,
}

/// Records added by one extraction pass
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub added: Vec<SummaryRecord>,
}

impl ExtractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

// ============================================================================
// Extraction Pass
// ============================================================================

/// Scan one exchange and insert any newly detected records into `board`.
///
/// A record whose key already exists in its category is discarded.
pub fn extract(
    tool: ConsultationTool,
    ctx: &ExtractionContext,
    user_text: &str,
    assistant_text: &str,
    board: &mut SummaryBoard,
) -> ExtractionOutcome {
    let combined = format!("{} {}", user_text, assistant_text);
    let lowered = combined.to_lowercase();
    let mut outcome = ExtractionOutcome::default();

    let mut candidates: Vec<SummaryRecord> = trigger_rules()
        .iter()
        .filter(|rule| rule.applies_to(tool) && rule.matches(&lowered))
        .map(|rule| rule.instantiate(ctx))
        .collect();

    if tool == ConsultationTool::Delivery {
        candidates.extend(extract_projects(&combined, &lowered, ctx));
    }

    for record in candidates {
        if board.insert(record.clone()) {
            outcome.added.push(record);
        }
    }

    // Timeline fallback depends on what this pass already added
    if tool == ConsultationTool::Delivery {
        for record in extract_timeline(&combined, &lowered, ctx, board) {
            if board.insert(record.clone()) {
                outcome.added.push(record);
            }
        }
    }

    if !outcome.is_empty() {
        log::debug!(
            "Extraction added {} record(s) for {} consultation",
            outcome.added.len(),
            tool
        );
    }

    outcome
}

// ============================================================================
// Delivery Pattern Rules
// ============================================================================

fn extract_projects(combined: &str, lowered: &str, ctx: &ExtractionContext) -> Vec<SummaryRecord> {
    if !lowered.contains("project") && !lowered.contains("initiative") {
        return Vec::new();
    }

    let re = match Regex::new(r#"(?i)project\s+(?:called|named)?\s+['"]?([A-Za-z0-9\s]+)['"]?"#) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("Invalid project pattern: {}", e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = Vec::new();
    for cap in re.captures_iter(combined) {
        let name = cap.get(1).map_or("", |m| m.as_str()).trim();
        if name.chars().count() <= 3 {
            continue;
        }
        if names.iter().any(|n| n.to_lowercase() == name.to_lowercase()) {
            continue;
        }
        names.push(name.to_string());
    }

    names
        .into_iter()
        .map(|name| {
            SummaryRecord::DeliveryProject(DeliveryProject {
                name,
                status: "Planning".to_string(),
                priority: "Medium".to_string(),
                completion: "0%".to_string(),
                lead: ctx.lead.to_string(),
            })
        })
        .collect()
}

fn extract_timeline(
    combined: &str,
    lowered: &str,
    ctx: &ExtractionContext,
    board: &SummaryBoard,
) -> Vec<SummaryRecord> {
    if !lowered.contains("schedule") && !lowered.contains("timeline") {
        return Vec::new();
    }

    let re = match Regex::new(
        r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}",
    ) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("Invalid timeline pattern: {}", e);
            return Vec::new();
        }
    };

    let dated: Vec<SummaryRecord> = re
        .find_iter(combined)
        .map(|m| {
            SummaryRecord::TimelineEntry(TimelineEntry {
                phase: "Implementation".to_string(),
                milestone: format!("Complete phase by {}", m.as_str()),
                status: "Not started".to_string(),
                owner: ctx.lead.to_string(),
            })
        })
        .collect();

    if !dated.is_empty() {
        return dated;
    }

    if board.count(SummaryCategory::TimelineEntry) == 0 {
        return vec![SummaryRecord::TimelineEntry(TimelineEntry {
            phase: "Planning".to_string(),
            milestone: "Define project scope and objectives".to_string(),
            status: "In progress".to_string(),
            owner: ctx.lead.to_string(),
        })];
    }

    Vec::new()
}
