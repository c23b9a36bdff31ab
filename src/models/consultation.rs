// Consultation models - tools, stakeholder intake and conversation turns

use serde::{Deserialize, Serialize};

// ============================================================================
// Consultation Tools
// ============================================================================

/// The consultation tools offered, one per assistant persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationTool {
    Priority,
    Capacity,
    Risk,
    Engagement,
    Delivery,
    ExternalStakeholders,
}

impl ConsultationTool {
    pub const ALL: [ConsultationTool; 6] = [
        ConsultationTool::Priority,
        ConsultationTool::Capacity,
        ConsultationTool::Risk,
        ConsultationTool::Engagement,
        ConsultationTool::Delivery,
        ConsultationTool::ExternalStakeholders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "priority",
            ConsultationTool::Capacity => "capacity",
            ConsultationTool::Risk => "risk",
            ConsultationTool::Engagement => "engagement",
            ConsultationTool::Delivery => "delivery",
            ConsultationTool::ExternalStakeholders => "external_stakeholders",
        }
    }

    /// Display name of the assistant persona
    pub fn persona(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "Riley",
            ConsultationTool::Capacity => "Morgan",
            ConsultationTool::Risk => "Alex",
            ConsultationTool::Engagement => "Jordan",
            ConsultationTool::Delivery => "Riva",
            ConsultationTool::ExternalStakeholders => "Josh",
        }
    }

    /// Human readable tool title, used in report headings and PDF file names
    pub fn title(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "Priority Discovery",
            ConsultationTool::Capacity => "Capacity Assessment",
            ConsultationTool::Risk => "Risk Register",
            ConsultationTool::Engagement => "Engagement Planner",
            ConsultationTool::Delivery => "Delivery Planner",
            ConsultationTool::ExternalStakeholders => "External Stakeholder Planner",
        }
    }

    /// Consultation type label stored with persisted sessions
    pub fn consultation_type(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "priority_discovery",
            ConsultationTool::Capacity => "capacity_assessment",
            ConsultationTool::Risk => "risk_register",
            ConsultationTool::Engagement => "engagement_planning",
            ConsultationTool::Delivery => "delivery_staff",
            ConsultationTool::ExternalStakeholders => "external_stakeholder",
        }
    }

    /// Agent label written into exports (not every backend agent has one)
    pub fn agent_label(&self) -> Option<&'static str> {
        match self {
            ConsultationTool::Capacity => Some("morgan_capacity_analyst"),
            ConsultationTool::Risk => Some("alex_risk_specialist"),
            ConsultationTool::Delivery => Some("riva_delivery_specialist"),
            ConsultationTool::ExternalStakeholders => Some("josh_external_specialist"),
            ConsultationTool::Priority | ConsultationTool::Engagement => None,
        }
    }

    /// File name prefix for JSON exports
    pub fn export_prefix(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "priority-consultation",
            ConsultationTool::Capacity => "capacity-assessment",
            ConsultationTool::Risk => "risk-register",
            ConsultationTool::Engagement => "engagement-planning",
            ConsultationTool::Delivery => "delivery-plan",
            ConsultationTool::ExternalStakeholders => "engagement-plan",
        }
    }

    /// Default backend path of the persona agent
    pub fn default_path(&self) -> &'static str {
        match self {
            ConsultationTool::Priority => "/run",
            ConsultationTool::Capacity => "/capacity-agent",
            ConsultationTool::Risk => "/risk-agent",
            ConsultationTool::Engagement => "/engagement-agent",
            ConsultationTool::Delivery => "/delivery-staff-agent",
            ConsultationTool::ExternalStakeholders => "/external-stakeholder-agent",
        }
    }

    /// Message sent to the backend to open the conversation.
    ///
    /// Tools that greet locally return `None`.
    pub fn opening_message(&self, info: &StakeholderInfo) -> Option<String> {
        let intro = format!(
            "Hello, I'm {}, {} from {}.",
            info.name, info.role, info.department
        );
        match self {
            ConsultationTool::Priority => {
                Some("Hello, I'd like to start a strategic priority consultation.".to_string())
            }
            ConsultationTool::Capacity => {
                Some(format!("{} I'd like to start a capacity assessment.", intro))
            }
            ConsultationTool::Risk => Some(format!("{} I'd like to start a risk assessment.", intro)),
            ConsultationTool::Engagement => Some(format!(
                "{} I'd like to start stakeholder engagement planning.",
                intro
            )),
            ConsultationTool::Delivery | ConsultationTool::ExternalStakeholders => None,
        }
    }

    /// Greeting shown when the opening request fails, or always for local greeters
    pub fn greeting(&self, info: &StakeholderInfo) -> String {
        match self {
            ConsultationTool::Priority => "G'day! I'm Riley, your strategic consultant. I'm having a bit of trouble getting started, but I'm here to help you identify strategic priorities. What brings you here today?".to_string(),
            ConsultationTool::Capacity => format!(
                "Hi {}! I'm Morgan, your capacity analysis specialist. I'll help you assess your current capacity and identify optimization opportunities for {}. Let's start by understanding your current situation. Can you tell me about your team size and the main functions your department handles?",
                info.name, info.department
            ),
            ConsultationTool::Risk => format!(
                "Hello {}! I'm Alex, your risk assessment specialist. I'll help you identify, assess, and develop mitigation strategies for operational and strategic risks in {}. Let's begin by discussing any concerns or potential risks you're currently aware of in your department. What areas keep you awake at night?",
                info.name, info.department
            ),
            ConsultationTool::Engagement => format!(
                "G'day {}! I'm Jordan, your stakeholder engagement specialist. I'm here to help you develop a comprehensive engagement strategy for {}. Let's start by understanding what you're trying to achieve. Are you looking to engage stakeholders for a specific project, policy change, or ongoing relationship building?",
                info.name, info.department
            ),
            ConsultationTool::Delivery => format!(
                "G'day {}! I'm Riva, your delivery specialist. I'm here to help you plan and optimize project delivery for {}.\n\nLet's start by understanding your current projects and delivery challenges. Could you tell me about the key projects you're currently working on or planning to deliver soon?",
                info.name, info.department
            ),
            ConsultationTool::ExternalStakeholders => format!(
                "G'day {}! I'm Josh, your external stakeholder engagement specialist. I'm here to help you develop strategies for effective collaboration with partners outside TAFE NSW.",
                info.name
            ),
        }
    }

    /// Fixed assistant turn appended when a reply cannot be obtained
    pub fn apology(&self) -> &'static str {
        match self {
            ConsultationTool::Delivery | ConsultationTool::ExternalStakeholders => {
                "I apologize, but I encountered an error. Please try again."
            }
            _ => "I apologize, but I'm having trouble processing your response right now. Could you please try again?",
        }
    }

    /// Identifier sent to the backend as `user_id`
    pub fn user_id(&self, info: &StakeholderInfo) -> String {
        if let Some(email) = info.email.as_deref().filter(|e| !e.trim().is_empty()) {
            return email.to_string();
        }
        match self {
            ConsultationTool::Priority => "anonymous".to_string(),
            _ => info
                .name
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

impl std::fmt::Display for ConsultationTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsultationTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "priority" | "priority_discovery" => Ok(ConsultationTool::Priority),
            "capacity" | "capacity_assessment" => Ok(ConsultationTool::Capacity),
            "risk" | "risk_register" => Ok(ConsultationTool::Risk),
            "engagement" | "engagement_planning" => Ok(ConsultationTool::Engagement),
            "delivery" | "delivery_staff" => Ok(ConsultationTool::Delivery),
            "external_stakeholders" | "external_stakeholder" | "external" => {
                Ok(ConsultationTool::ExternalStakeholders)
            }
            _ => Err(format!(
                "Invalid consultation tool: '{}'. Expected 'priority', 'capacity', 'risk', 'engagement', 'delivery', or 'external_stakeholders'",
                s
            )),
        }
    }
}

// ============================================================================
// Stakeholder Intake
// ============================================================================

/// Details captured by the intake form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderInfo {
    pub name: String,
    pub role: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl StakeholderInfo {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.role.trim().is_empty() {
            missing.push("role");
        }
        if self.department.trim().is_empty() {
            missing.push("department");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Lifecycle phase of a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationPhase {
    Intake,
    Conversing,
}

impl ConsultationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationPhase::Intake => "intake",
            ConsultationPhase::Conversing => "conversing",
        }
    }
}

impl std::fmt::Display for ConsultationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Conversation Turns
// ============================================================================

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Sender label used on the wire to the agent backend and in the store
    pub fn wire_label(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "ai",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of keyword insight attached to a user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Pattern,
    Opportunity,
    Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
    pub confidence: f32,
}

/// A single-choice question embedded in an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedQuestion {
    pub question: String,
    pub options: Vec<String>,
}

/// One message in a consultation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: String,
    pub sender: Sender,
    /// Display text (the question label when a question was detected)
    pub text: String,
    /// Sanitized markup of the original reply, if it contained any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<Insight>,
    /// Structured data returned by the agent backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<EmbeddedQuestion>,
    /// User turn produced by selecting an offered option
    #[serde(default)]
    pub interactive_response: bool,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text.into())
    }

    fn new(sender: Sender, text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text,
            html: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            insights: Vec::new(),
            data: None,
            question: None,
            interactive_response: false,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> StakeholderInfo {
        StakeholderInfo {
            name: "Sam Lee".to_string(),
            role: "Head Teacher".to_string(),
            department: "Nursing".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_tool_round_trips_through_str() {
        for tool in ConsultationTool::ALL {
            let parsed: ConsultationTool = tool.as_str().parse().unwrap();
            assert_eq!(parsed, tool);
        }
        assert_eq!(
            "capacity_assessment".parse::<ConsultationTool>().unwrap(),
            ConsultationTool::Capacity
        );
        assert!("finance".parse::<ConsultationTool>().is_err());
    }

    #[test]
    fn test_missing_fields() {
        let mut stakeholder = info();
        assert!(stakeholder.is_complete());
        stakeholder.role = "   ".to_string();
        assert_eq!(stakeholder.missing_fields(), vec!["role"]);
    }

    #[test]
    fn test_user_id_falls_back_to_name() {
        let stakeholder = info();
        assert_eq!(ConsultationTool::Capacity.user_id(&stakeholder), "sam_lee");
        assert_eq!(ConsultationTool::Priority.user_id(&stakeholder), "anonymous");

        let with_email = StakeholderInfo {
            email: Some("sam@example.edu.au".to_string()),
            ..stakeholder
        };
        assert_eq!(
            ConsultationTool::Risk.user_id(&with_email),
            "sam@example.edu.au"
        );
    }

    #[test]
    fn test_local_greeters_have_no_opening_message() {
        let stakeholder = info();
        assert!(ConsultationTool::Delivery
            .opening_message(&stakeholder)
            .is_none());
        assert!(ConsultationTool::Risk
            .opening_message(&stakeholder)
            .unwrap()
            .contains("Sam Lee, Head Teacher from Nursing"));
        assert!(ConsultationTool::Delivery
            .greeting(&stakeholder)
            .starts_with("G'day Sam Lee! I'm Riva"));
    }

    #[test]
    fn test_turn_serialization() {
        let mut turn = ConversationTurn::assistant("Which matters most?");
        turn.question = Some(EmbeddedQuestion {
            question: "Which matters most?".to_string(),
            options: vec!["Staffing".to_string()],
        });
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["sender"], "assistant");
        assert_eq!(json["question"]["options"][0], "Staffing");
        assert_eq!(json["interactiveResponse"], false);
    }
}
