// Admin listing models - rows returned by the hosted store

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Accept either a string or a numeric id column
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Stakeholder columns embedded in a session listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
}

/// A persisted stakeholder row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredStakeholder {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One row of the admin session listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionListing {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub stakeholder_id: Option<String>,
    #[serde(default)]
    pub consultation_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub completion_percentage: Option<u32>,
    #[serde(default)]
    pub stakeholders: Option<StakeholderSummary>,
}

/// Full session detail joined with stakeholder, messages and priorities.
///
/// Unknown columns are preserved so per-session exports stay lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub consultation_type: String,
    #[serde(default)]
    pub stakeholders: Option<StoredStakeholder>,
    #[serde(default)]
    pub conversation_messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub priorities: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Aggregate counts shown on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub completed: usize,
    pub this_month: usize,
    pub available_exports: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_accepts_numeric_ids() {
        let row: SessionListing = serde_json::from_value(serde_json::json!({
            "id": 42,
            "stakeholder_id": 7,
            "consultation_type": "risk_register",
            "started_at": "2026-10-01T00:00:00Z",
            "stakeholders": {"name": "Sam", "role": "Teacher", "department": "Nursing"}
        }))
        .unwrap();
        assert_eq!(row.id, "42");
        assert_eq!(row.stakeholder_id.as_deref(), Some("7"));
        assert_eq!(row.stakeholders.unwrap().department, "Nursing");
    }

    #[test]
    fn test_detail_keeps_unknown_columns() {
        let detail: SessionDetail = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "consultation_type": "capacity_assessment",
            "session_data": {"conversation": []},
            "conversation_messages": [{"sender": "user"}]
        }))
        .unwrap();
        assert!(detail.extra.contains_key("session_data"));
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["session_data"]["conversation"], serde_json::json!([]));
        assert_eq!(json["conversation_messages"][0]["sender"], "user");
    }
}
