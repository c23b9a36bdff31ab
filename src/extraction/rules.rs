// Keyword trigger table for summary records

use crate::models::{
    CapacityGap, CommunicationChannel, ConsultationTool, DeliveryResource, DeliveryRisk,
    EngagementStrategy, Opportunity, PriorityRecord, Recommendation, RiskLevel, RiskRecord,
    StakeholderGroup, SummaryRecord,
};
use std::sync::OnceLock;

use super::ExtractionContext;

use ConsultationTool::{Capacity, Delivery, Engagement, ExternalStakeholders, Priority, Risk};

/// A keyword rule that produces one fixed record when it fires.
///
/// Each group must have at least one keyword present in the lowercased text.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub tools: &'static [ConsultationTool],
    pub groups: &'static [&'static [&'static str]],
    pub template: SummaryRecord,
}

impl TriggerRule {
    pub fn applies_to(&self, tool: ConsultationTool) -> bool {
        self.tools.contains(&tool)
    }

    /// `lowered` must already be lowercase
    pub fn matches(&self, lowered: &str) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|keyword| lowered.contains(keyword)))
    }

    /// Build the record, filling stakeholder-dependent fields
    pub fn instantiate(&self, ctx: &ExtractionContext) -> SummaryRecord {
        let mut record = self.template.clone();
        if let SummaryRecord::Risk(risk) = &mut record {
            risk.owner = ctx.department.to_string();
        }
        record
    }
}

/// All keyword rules, in evaluation order
pub fn trigger_rules() -> &'static [TriggerRule] {
    static RULES: OnceLock<Vec<TriggerRule>> = OnceLock::new();
    RULES.get_or_init(build_rules)
}

fn s(value: &str) -> String {
    value.to_string()
}

fn rule(
    tools: &'static [ConsultationTool],
    groups: &'static [&'static [&'static str]],
    template: SummaryRecord,
) -> TriggerRule {
    TriggerRule {
        tools,
        groups,
        template,
    }
}

fn priority(title: &str, description: &str, importance: u8, urgency: u8, themes: &[&str]) -> SummaryRecord {
    SummaryRecord::Priority(PriorityRecord {
        title: s(title),
        description: s(description),
        importance,
        urgency,
        themes: themes.iter().map(|t| s(t)).collect(),
    })
}

fn risk(
    title: &str,
    description: &str,
    category: &str,
    likelihood: u32,
    impact: u32,
    mitigations: &[&str],
) -> SummaryRecord {
    let score = likelihood * impact;
    SummaryRecord::Risk(RiskRecord {
        title: s(title),
        description: s(description),
        category: s(category),
        likelihood,
        impact,
        risk_score: score,
        risk_level: RiskLevel::from_score(score),
        mitigation_strategies: mitigations.iter().map(|m| s(m)).collect(),
        owner: String::new(),
        status: s("identified"),
    })
}

fn group(name: &str, influence: &str, interest: &str, approach: &str, priority: &str) -> SummaryRecord {
    SummaryRecord::StakeholderGroup(StakeholderGroup {
        group: s(name),
        influence: s(influence),
        interest: s(interest),
        approach: s(approach),
        priority: s(priority),
    })
}

fn strategy(method: &str, description: &str, audience: &str, frequency: &str, resources: &str) -> SummaryRecord {
    SummaryRecord::Strategy(EngagementStrategy {
        method: s(method),
        description: s(description),
        audience: s(audience),
        frequency: s(frequency),
        resources: s(resources),
    })
}

fn channel(name: &str, purpose: &str, frequency: &str, audience: &str) -> SummaryRecord {
    SummaryRecord::Communication(CommunicationChannel {
        channel: s(name),
        purpose: s(purpose),
        frequency: s(frequency),
        audience: s(audience),
    })
}

fn delivery_risk(category: &str, description: &str, impact: &str, mitigation: &str) -> SummaryRecord {
    SummaryRecord::DeliveryRisk(DeliveryRisk {
        category: s(category),
        description: s(description),
        impact: s(impact),
        likelihood: s("Medium"),
        mitigation: s(mitigation),
    })
}

const RISK_TALK: &[&str] = &["risk", "challenge", "issue"];

fn build_rules() -> Vec<TriggerRule> {
    vec![
        // Priority discovery. These rules are local to this crate; the
        // priority persona's own pages never fill priorities from keywords.
        rule(
            &[Priority],
            &[&["staff", "recruitment", "workforce"]],
            priority(
                "Workforce Capability",
                "Strengthen recruitment and retention of qualified teaching staff",
                9,
                8,
                &["Workforce"],
            ),
        ),
        rule(
            &[Priority],
            &[&["student", "placement"]],
            priority(
                "Student Placement Partnerships",
                "Expand clinical and industry placement opportunities for students",
                8,
                7,
                &["Students", "Partnerships"],
            ),
        ),
        rule(
            &[Priority],
            &[&["technology", "system", "digital"]],
            priority(
                "Digital Infrastructure",
                "Modernise the systems and technology that support teaching delivery",
                7,
                6,
                &["Technology"],
            ),
        ),
        rule(
            &[Priority],
            &[&["industry", "employer"]],
            priority(
                "Industry Alignment",
                "Align course offerings with current industry and employer needs",
                7,
                5,
                &["Industry", "Curriculum"],
            ),
        ),
        // Capacity assessment
        rule(
            &[Capacity],
            &[&["understaffed", "overloaded"]],
            SummaryRecord::CapacityGap(CapacityGap {
                area: s("Staffing Levels"),
                description: s("Current staffing levels appear insufficient for workload demands"),
                impact: s("high"),
                priority: 9,
            }),
        ),
        rule(
            &[Capacity],
            &[&["training", "skills"]],
            SummaryRecord::Opportunity(Opportunity {
                area: s("Skills Development"),
                description: s("Opportunity to enhance staff capabilities through targeted training"),
                potential: s("medium"),
                effort: s("low"),
            }),
        ),
        rule(
            &[Capacity],
            &[&["process", "workflow"]],
            SummaryRecord::Recommendation(Recommendation {
                title: s("Process Optimization"),
                description: s("Review and streamline current workflows for efficiency gains"),
                timeframe: s("3-6 months"),
                impact: s("medium"),
            }),
        ),
        rule(
            &[Capacity],
            &[&["resource allocation", "utilization"]],
            SummaryRecord::Opportunity(Opportunity {
                area: s("Resource Optimization"),
                description: s("Opportunities identified for better resource allocation and utilization"),
                potential: s("high"),
                effort: s("medium"),
            }),
        ),
        // Risk register
        rule(
            &[Risk],
            &[&["staff"], &["shortage", "turnover"]],
            risk(
                "Staff Retention Risk",
                "High staff turnover or shortage affecting service delivery",
                "Human Resources",
                7,
                8,
                &[
                    "Implement staff retention programs",
                    "Improve working conditions and benefits",
                    "Develop succession planning",
                ],
            ),
        ),
        rule(
            &[Risk],
            &[&["compliance", "regulation"]],
            risk(
                "Regulatory Compliance Risk",
                "Risk of non-compliance with industry regulations",
                "Compliance",
                5,
                9,
                &[
                    "Regular compliance audits",
                    "Staff training on regulations",
                    "Update policies and procedures",
                ],
            ),
        ),
        rule(
            &[Risk],
            &[&["technology", "system"]],
            risk(
                "Technology Failure Risk",
                "Risk of system outages affecting operations",
                "Technology",
                6,
                7,
                &[
                    "Implement backup systems",
                    "Regular system maintenance",
                    "Disaster recovery planning",
                ],
            ),
        ),
        // Stakeholder groups
        rule(
            &[Engagement, ExternalStakeholders],
            &[&["student", "learner"]],
            group("Students", "high", "high", "Direct consultation and feedback sessions", "primary"),
        ),
        rule(
            &[Engagement],
            &[&["staff", "teacher", "faculty"]],
            group("Academic Staff", "high", "medium", "Professional development sessions and workshops", "primary"),
        ),
        rule(
            &[ExternalStakeholders],
            &[&["staff", "teacher"]],
            group("Academic Staff", "high", "medium", "Professional development sessions and workshops", "primary"),
        ),
        rule(
            &[Engagement],
            &[&["industry", "employer", "partner"]],
            group("Industry Partners", "medium", "high", "Partnership meetings and industry forums", "secondary"),
        ),
        rule(
            &[ExternalStakeholders],
            &[&["industry", "employer"]],
            group("Industry Partners", "medium", "high", "Partnership meetings and industry forums", "secondary"),
        ),
        rule(
            &[Engagement],
            &[&["parent", "family"]],
            group("Parents/Families", "medium", "high", "Information sessions and regular updates", "secondary"),
        ),
        rule(
            &[Engagement],
            &[&["government", "policy", "regulator"]],
            group("Government/Regulators", "high", "medium", "Formal reporting and compliance meetings", "primary"),
        ),
        // Engagement strategies
        rule(
            &[Engagement, ExternalStakeholders],
            &[&["survey", "feedback"]],
            strategy(
                "Surveys & Feedback",
                "Online surveys and feedback collection mechanisms",
                "All stakeholders",
                "Quarterly",
                "Survey platform, analysis tools",
            ),
        ),
        rule(
            &[Engagement],
            &[&["workshop", "meeting", "forum"]],
            strategy(
                "Workshops & Forums",
                "Face-to-face consultation sessions and forums",
                "Key stakeholders",
                "Monthly",
                "Meeting facilities, facilitation support",
            ),
        ),
        rule(
            &[ExternalStakeholders],
            &[&["workshop", "meeting"]],
            strategy(
                "Workshops & Meetings",
                "Face-to-face consultation sessions",
                "Key stakeholders",
                "Monthly",
                "Meeting facilities, facilitation support",
            ),
        ),
        rule(
            &[Engagement],
            &[&["focus group", "consultation"]],
            strategy(
                "Focus Groups",
                "Small group discussions for detailed feedback",
                "Selected representatives",
                "As needed",
                "Facilitator, recording equipment",
            ),
        ),
        rule(
            &[Engagement],
            &[&["social media", "online"]],
            strategy(
                "Digital Engagement",
                "Social media and online platform engagement",
                "Broad community",
                "Ongoing",
                "Social media management, content creation",
            ),
        ),
        // Communication channels
        rule(
            &[Engagement, ExternalStakeholders],
            &[&["email", "newsletter"]],
            channel("Email Communications", "Regular updates and announcements", "Bi-weekly", "All stakeholders"),
        ),
        rule(
            &[Engagement],
            &[&["website", "portal"]],
            channel("Web Portal", "Information hub and resource center", "Ongoing updates", "All stakeholders"),
        ),
        rule(
            &[Engagement],
            &[&["report", "document"]],
            channel("Progress Reports", "Formal progress and outcome reporting", "Quarterly", "Key stakeholders"),
        ),
        // Delivery resources
        rule(
            &[Delivery],
            &[&["staff", "resource"]],
            SummaryRecord::DeliveryResource(DeliveryResource {
                kind: s("Staff"),
                description: s("Teaching and administrative personnel"),
                status: s("Needed"),
                allocation: s("Partial"),
            }),
        ),
        rule(
            &[Delivery],
            &[&["budget", "funding"]],
            SummaryRecord::DeliveryResource(DeliveryResource {
                kind: s("Budget"),
                description: s("Financial resources for project implementation"),
                status: s("Under review"),
                allocation: s("Pending"),
            }),
        ),
        // Delivery risks
        rule(
            &[Delivery],
            &[RISK_TALK, &["staff"]],
            delivery_risk(
                "Resource",
                "Insufficient staff resources to deliver project",
                "High",
                "Secure additional staff allocation or adjust timeline",
            ),
        ),
        rule(
            &[Delivery],
            &[RISK_TALK, &["timeline"]],
            delivery_risk(
                "Schedule",
                "Timeline delays due to dependencies",
                "Medium",
                "Regular progress monitoring and proactive management",
            ),
        ),
        rule(
            &[Delivery],
            &[RISK_TALK, &["stakeholder"]],
            delivery_risk(
                "Stakeholder",
                "Stakeholder resistance to changes",
                "High",
                "Early and consistent stakeholder engagement",
            ),
        ),
    ]
}
