// Data models shared by the server, the store and the browser UI

pub mod admin;
pub mod consultation;
pub mod summary;

pub use admin::{AdminStats, SessionDetail, SessionListing, StakeholderSummary, StoredStakeholder};
pub use consultation::{
    ConsultationPhase, ConsultationTool, ConversationTurn, EmbeddedQuestion, Insight,
    InsightKind, Sender, StakeholderInfo,
};
pub use summary::{
    CapacityGap, CommunicationChannel, DeliveryProject, DeliveryResource, DeliveryRisk,
    EngagementStrategy, Opportunity, PriorityRecord, Recommendation, RiskLevel, RiskRecord,
    StakeholderGroup, SummaryBoard, SummaryCategory, SummaryRecord, TimelineEntry,
};
