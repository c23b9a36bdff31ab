// Summary record models - records accumulated by the extraction pass

use serde::{Deserialize, Serialize};

// ============================================================================
// Categories
// ============================================================================

/// Category of a summary record; each category has its own key field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryCategory {
    Priority,
    Risk,
    CapacityGap,
    Opportunity,
    Recommendation,
    StakeholderGroup,
    Strategy,
    Communication,
    DeliveryProject,
    DeliveryResource,
    TimelineEntry,
    DeliveryRisk,
}

impl SummaryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryCategory::Priority => "priority",
            SummaryCategory::Risk => "risk",
            SummaryCategory::CapacityGap => "capacity_gap",
            SummaryCategory::Opportunity => "opportunity",
            SummaryCategory::Recommendation => "recommendation",
            SummaryCategory::StakeholderGroup => "stakeholder_group",
            SummaryCategory::Strategy => "strategy",
            SummaryCategory::Communication => "communication",
            SummaryCategory::DeliveryProject => "delivery_project",
            SummaryCategory::DeliveryResource => "delivery_resource",
            SummaryCategory::TimelineEntry => "timeline_entry",
            SummaryCategory::DeliveryRisk => "delivery_risk",
        }
    }
}

impl std::fmt::Display for SummaryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk level bands derived from likelihood x impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 60 => RiskLevel::Critical,
            s if s >= 40 => RiskLevel::High,
            s if s >= 20 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

// ============================================================================
// Record Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRecord {
    pub title: String,
    pub description: String,
    pub importance: u8,
    pub urgency: u8,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    pub likelihood: u32,
    pub impact: u32,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub mitigation_strategies: Vec<String>,
    pub owner: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityGap {
    pub area: String,
    pub description: String,
    pub impact: String,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub area: String,
    pub description: String,
    pub potential: String,
    pub effort: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub timeframe: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderGroup {
    pub group: String,
    pub influence: String,
    pub interest: String,
    pub approach: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStrategy {
    pub method: String,
    pub description: String,
    pub audience: String,
    pub frequency: String,
    pub resources: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationChannel {
    pub channel: String,
    pub purpose: String,
    pub frequency: String,
    pub audience: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryProject {
    pub name: String,
    pub status: String,
    pub priority: String,
    pub completion: String,
    pub lead: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub status: String,
    pub allocation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub phase: String,
    pub milestone: String,
    pub status: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRisk {
    pub category: String,
    pub description: String,
    pub impact: String,
    pub likelihood: String,
    pub mitigation: String,
}

/// Any record produced by the extraction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "record", rename_all = "snake_case")]
pub enum SummaryRecord {
    Priority(PriorityRecord),
    Risk(RiskRecord),
    CapacityGap(CapacityGap),
    Opportunity(Opportunity),
    Recommendation(Recommendation),
    StakeholderGroup(StakeholderGroup),
    Strategy(EngagementStrategy),
    Communication(CommunicationChannel),
    DeliveryProject(DeliveryProject),
    DeliveryResource(DeliveryResource),
    TimelineEntry(TimelineEntry),
    DeliveryRisk(DeliveryRisk),
}

impl SummaryRecord {
    pub fn category(&self) -> SummaryCategory {
        match self {
            SummaryRecord::Priority(_) => SummaryCategory::Priority,
            SummaryRecord::Risk(_) => SummaryCategory::Risk,
            SummaryRecord::CapacityGap(_) => SummaryCategory::CapacityGap,
            SummaryRecord::Opportunity(_) => SummaryCategory::Opportunity,
            SummaryRecord::Recommendation(_) => SummaryCategory::Recommendation,
            SummaryRecord::StakeholderGroup(_) => SummaryCategory::StakeholderGroup,
            SummaryRecord::Strategy(_) => SummaryCategory::Strategy,
            SummaryRecord::Communication(_) => SummaryCategory::Communication,
            SummaryRecord::DeliveryProject(_) => SummaryCategory::DeliveryProject,
            SummaryRecord::DeliveryResource(_) => SummaryCategory::DeliveryResource,
            SummaryRecord::TimelineEntry(_) => SummaryCategory::TimelineEntry,
            SummaryRecord::DeliveryRisk(_) => SummaryCategory::DeliveryRisk,
        }
    }

    /// Distinguishing key within the record's category
    pub fn key(&self) -> String {
        match self {
            SummaryRecord::Priority(r) => r.title.clone(),
            SummaryRecord::Risk(r) => r.title.clone(),
            SummaryRecord::CapacityGap(r) => r.area.clone(),
            SummaryRecord::Opportunity(r) => r.area.clone(),
            SummaryRecord::Recommendation(r) => r.title.clone(),
            SummaryRecord::StakeholderGroup(r) => r.group.clone(),
            SummaryRecord::Strategy(r) => r.method.clone(),
            SummaryRecord::Communication(r) => r.channel.clone(),
            SummaryRecord::DeliveryProject(r) => r.name.to_lowercase(),
            SummaryRecord::DeliveryResource(r) => r.kind.clone(),
            SummaryRecord::TimelineEntry(r) => r.milestone.clone(),
            SummaryRecord::DeliveryRisk(r) => r.description.clone(),
        }
    }
}

// ============================================================================
// Summary Board
// ============================================================================

/// Accumulated summary records of one consultation, one list per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBoard {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<PriorityRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<RiskRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capacity_gaps: Vec<CapacityGap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<Opportunity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stakeholder_groups: Vec<StakeholderGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<EngagementStrategy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communications: Vec<CommunicationChannel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<DeliveryProject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<DeliveryResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_risks: Vec<DeliveryRisk>,
}

impl SummaryBoard {
    /// Whether a record with this key already exists in the category
    pub fn contains(&self, category: SummaryCategory, key: &str) -> bool {
        match category {
            SummaryCategory::Priority => self.priorities.iter().any(|r| r.title == key),
            SummaryCategory::Risk => self.risks.iter().any(|r| r.title == key),
            SummaryCategory::CapacityGap => self.capacity_gaps.iter().any(|r| r.area == key),
            SummaryCategory::Opportunity => self.opportunities.iter().any(|r| r.area == key),
            SummaryCategory::Recommendation => {
                self.recommendations.iter().any(|r| r.title == key)
            }
            SummaryCategory::StakeholderGroup => {
                self.stakeholder_groups.iter().any(|r| r.group == key)
            }
            SummaryCategory::Strategy => self.strategies.iter().any(|r| r.method == key),
            SummaryCategory::Communication => self.communications.iter().any(|r| r.channel == key),
            SummaryCategory::DeliveryProject => self
                .projects
                .iter()
                .any(|r| r.name.to_lowercase() == key.to_lowercase()),
            SummaryCategory::DeliveryResource => self.resources.iter().any(|r| r.kind == key),
            SummaryCategory::TimelineEntry => self.timeline.iter().any(|r| r.milestone == key),
            SummaryCategory::DeliveryRisk => {
                self.delivery_risks.iter().any(|r| r.description == key)
            }
        }
    }

    /// Insert a record unless its key is already present in its category.
    ///
    /// Returns `true` when the record was added. Later duplicates are discarded,
    /// never merged.
    pub fn insert(&mut self, record: SummaryRecord) -> bool {
        if self.contains(record.category(), &record.key()) {
            return false;
        }

        match record {
            SummaryRecord::Priority(r) => self.priorities.push(r),
            SummaryRecord::Risk(r) => self.risks.push(r),
            SummaryRecord::CapacityGap(r) => self.capacity_gaps.push(r),
            SummaryRecord::Opportunity(r) => self.opportunities.push(r),
            SummaryRecord::Recommendation(r) => self.recommendations.push(r),
            SummaryRecord::StakeholderGroup(r) => self.stakeholder_groups.push(r),
            SummaryRecord::Strategy(r) => self.strategies.push(r),
            SummaryRecord::Communication(r) => self.communications.push(r),
            SummaryRecord::DeliveryProject(r) => self.projects.push(r),
            SummaryRecord::DeliveryResource(r) => self.resources.push(r),
            SummaryRecord::TimelineEntry(r) => self.timeline.push(r),
            SummaryRecord::DeliveryRisk(r) => self.delivery_risks.push(r),
        }
        true
    }

    /// Total number of records across all categories
    pub fn len(&self) -> usize {
        self.priorities.len()
            + self.risks.len()
            + self.capacity_gaps.len()
            + self.opportunities.len()
            + self.recommendations.len()
            + self.stakeholder_groups.len()
            + self.strategies.len()
            + self.communications.len()
            + self.projects.len()
            + self.resources.len()
            + self.timeline.len()
            + self.delivery_risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records in one category
    pub fn count(&self, category: SummaryCategory) -> usize {
        match category {
            SummaryCategory::Priority => self.priorities.len(),
            SummaryCategory::Risk => self.risks.len(),
            SummaryCategory::CapacityGap => self.capacity_gaps.len(),
            SummaryCategory::Opportunity => self.opportunities.len(),
            SummaryCategory::Recommendation => self.recommendations.len(),
            SummaryCategory::StakeholderGroup => self.stakeholder_groups.len(),
            SummaryCategory::Strategy => self.strategies.len(),
            SummaryCategory::Communication => self.communications.len(),
            SummaryCategory::DeliveryProject => self.projects.len(),
            SummaryCategory::DeliveryResource => self.resources.len(),
            SummaryCategory::TimelineEntry => self.timeline.len(),
            SummaryCategory::DeliveryRisk => self.delivery_risks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap(area: &str, priority: u8) -> SummaryRecord {
        SummaryRecord::CapacityGap(CapacityGap {
            area: area.to_string(),
            description: "desc".to_string(),
            impact: "high".to_string(),
            priority,
        })
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(56), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::Low);
    }

    #[test]
    fn test_insert_discards_duplicate_keys() {
        let mut board = SummaryBoard::default();
        assert!(board.insert(gap("Staffing Levels", 9)));
        assert!(!board.insert(gap("Staffing Levels", 3)));
        assert_eq!(board.capacity_gaps.len(), 1);
        // First detection wins, nothing is merged
        assert_eq!(board.capacity_gaps[0].priority, 9);
    }

    #[test]
    fn test_same_key_in_other_category_is_independent() {
        let mut board = SummaryBoard::default();
        board.insert(gap("Resource Optimization", 5));
        let opportunity = SummaryRecord::Opportunity(Opportunity {
            area: "Resource Optimization".to_string(),
            description: "desc".to_string(),
            potential: "high".to_string(),
            effort: "medium".to_string(),
        });
        assert!(board.insert(opportunity));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_project_key_is_case_insensitive() {
        let mut board = SummaryBoard::default();
        let project = |name: &str| {
            SummaryRecord::DeliveryProject(DeliveryProject {
                name: name.to_string(),
                status: "Planning".to_string(),
                priority: "Medium".to_string(),
                completion: "0%".to_string(),
                lead: "Sam".to_string(),
            })
        };
        assert!(board.insert(project("Nursing Hub")));
        assert!(!board.insert(project("nursing hub")));
        assert_eq!(board.count(SummaryCategory::DeliveryProject), 1);
    }

    #[test]
    fn test_empty_lists_are_omitted_from_json() {
        let mut board = SummaryBoard::default();
        board.insert(gap("Staffing Levels", 9));
        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("capacityGaps").is_some());
        assert!(json.get("risks").is_none());
    }
}
