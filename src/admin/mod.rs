// Admin listing - stored sessions, aggregate counts and per-session export

use crate::export::ExportFile;
use crate::models::{AdminStats, SessionListing};
use crate::persistence::{ConsultationStore, StoreError};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Serialize;

/// Filter value that shows every consultation type
pub const ALL_TYPES: &str = "all";

const COMPLETED_STATUS: &str = "completed";

/// Sessions and counts shown on the admin dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListing {
    pub stats: AdminStats,
    pub filter: String,
    pub sessions: Vec<SessionListing>,
}

/// RFC 3339, or a plain `timestamp` column value read as UTC
fn parse_started_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn started_in_month(session: &SessionListing, now: DateTime<Utc>) -> bool {
    session
        .started_at
        .as_deref()
        .and_then(parse_started_at)
        .map(|started| started.year() == now.year() && started.month() == now.month())
        .unwrap_or(false)
}

/// Counts over all sessions; "this month" is relative to `now`
pub fn compute_stats(sessions: &[SessionListing], now: DateTime<Utc>) -> AdminStats {
    let mut stats = AdminStats {
        total: sessions.len(),
        available_exports: sessions.len(),
        ..Default::default()
    };

    for session in sessions {
        *stats
            .by_type
            .entry(session.consultation_type.clone())
            .or_insert(0) += 1;

        let status = session.status.as_deref().unwrap_or("unknown");
        *stats.by_status.entry(status.to_string()).or_insert(0) += 1;
        if status == COMPLETED_STATUS {
            stats.completed += 1;
        }

        if started_in_month(session, now) {
            stats.this_month += 1;
        }
    }

    stats
}

/// Keep sessions of one consultation type, or all of them for `"all"`
pub fn filter_sessions(sessions: Vec<SessionListing>, filter: &str) -> Vec<SessionListing> {
    if filter.is_empty() || filter == ALL_TYPES {
        return sessions;
    }
    sessions
        .into_iter()
        .filter(|s| s.consultation_type == filter)
        .collect()
}

/// Fetch the listing; stats always cover every stored session
pub async fn list_sessions(
    store: &dyn ConsultationStore,
    filter: &str,
) -> Result<AdminListing, StoreError> {
    let sessions = store.list_sessions().await?;
    let stats = compute_stats(&sessions, Utc::now());
    log::debug!("Admin listing: {} sessions, filter '{}'", stats.total, filter);

    Ok(AdminListing {
        stats,
        filter: filter.to_string(),
        sessions: filter_sessions(sessions, filter),
    })
}

/// Re-fetch one stored session in full as `consultation-<id>.json`
pub async fn export_session(
    store: &dyn ConsultationStore,
    id: &str,
) -> Result<ExportFile, StoreError> {
    let detail = store.get_session(id).await?;
    let bytes = serde_json::to_vec_pretty(&detail)
        .map_err(|e| StoreError::Decode(format!("Failed to serialize session: {}", e)))?;

    Ok(ExportFile {
        file_name: format!("consultation-{}.json", id),
        content_type: "application/json",
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn listing(id: &str, kind: &str, status: Option<&str>, started_at: &str) -> SessionListing {
        SessionListing {
            id: id.to_string(),
            stakeholder_id: None,
            consultation_type: kind.to_string(),
            status: status.map(str::to_string),
            started_at: Some(started_at.to_string()),
            completed_at: None,
            completion_percentage: None,
            stakeholders: None,
        }
    }

    fn sample() -> Vec<SessionListing> {
        vec![
            listing("1", "risk_register", Some("completed"), "2026-10-03T09:00:00+00:00"),
            listing("2", "risk_register", Some("active"), "2026-09-30T23:00:00Z"),
            listing("3", "capacity_assessment", None, "2026-10-18T12:30:00.123456+00:00"),
        ]
    }

    #[test]
    fn test_compute_stats() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let stats = compute_stats(&sample(), now);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.available_exports, 3);
        assert_eq!(stats.by_type["risk_register"], 2);
        assert_eq!(stats.by_type["capacity_assessment"], 1);
        assert_eq!(stats.by_status["unknown"], 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.this_month, 2);
    }

    #[test]
    fn test_stats_ignore_unparseable_dates() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let stats = compute_stats(&[listing("1", "x", None, "yesterday")], now);
        assert_eq!(stats.this_month, 0);
    }

    #[test]
    fn test_stats_count_timestamps_without_offset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let sessions = vec![
            listing("1", "risk_register", None, "2026-10-18T12:30:00.123456"),
            listing("2", "risk_register", None, "2026-10-01T08:00:00"),
            listing("3", "risk_register", None, "2026-09-30T23:59:59"),
        ];
        assert_eq!(compute_stats(&sessions, now).this_month, 2);
    }

    #[test]
    fn test_filter_sessions() {
        assert_eq!(filter_sessions(sample(), ALL_TYPES).len(), 3);
        let risks = filter_sessions(sample(), "risk_register");
        assert_eq!(risks.len(), 2);
        assert!(filter_sessions(sample(), "delivery_staff").is_empty());
    }
}
