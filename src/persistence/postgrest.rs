// PostgREST client for the hosted store

use super::{
    ConsultationStore, NewMessage, NewPriority, NewSession, NewStakeholder, StoreError,
    MESSAGES_TABLE, PRIORITIES_TABLE, SESSIONS_TABLE, STAKEHOLDERS_TABLE,
};
use crate::models::{SessionDetail, SessionListing, StoredStakeholder};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

const DETAIL_SELECT: &str = "*,stakeholders(*),conversation_messages(*),priorities(*)";
const LISTING_SELECT: &str = "*,stakeholders(name,role,department)";

/// Store client speaking the PostgREST dialect (`/rest/v1/<table>`)
pub struct PostgrestStore {
    base_url: String,
    headers: HeaderMap,
    http_client: reqwest::Client,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| StoreError::NotConfigured(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| StoreError::NotConfigured(format!("Invalid API key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::NotConfigured(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers,
            http_client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn insert<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        table: &str,
        rows: &T,
    ) -> Result<Vec<R>, StoreError> {
        let response = self
            .http_client
            .post(self.table_url(table))
            .headers(self.headers.clone())
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        Self::decode(table, response).await
    }

    async fn select<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<R>, StoreError> {
        let response = self
            .http_client
            .get(self.table_url(table))
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await?;

        Self::decode(table, response).await
    }

    async fn decode<R: DeserializeOwned>(
        table: &str,
        response: reqwest::Response,
    ) -> Result<Vec<R>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{}: {}", table, e)))
    }

    fn first<R>(table: &str, rows: Vec<R>) -> Result<R, StoreError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("{}: insert returned no rows", table)))
    }
}

#[async_trait]
impl ConsultationStore for PostgrestStore {
    async fn insert_stakeholder(
        &self,
        row: &NewStakeholder,
    ) -> Result<StoredStakeholder, StoreError> {
        let rows = self.insert(STAKEHOLDERS_TABLE, &[row]).await?;
        Self::first(STAKEHOLDERS_TABLE, rows)
    }

    async fn insert_session(&self, row: &NewSession) -> Result<SessionListing, StoreError> {
        let rows = self.insert(SESSIONS_TABLE, &[row]).await?;
        Self::first(SESSIONS_TABLE, rows)
    }

    async fn insert_messages(&self, rows: &[NewMessage]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let _: Vec<serde_json::Value> = self.insert(MESSAGES_TABLE, rows).await?;
        Ok(())
    }

    async fn insert_priorities(&self, rows: &[NewPriority]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let _: Vec<serde_json::Value> = self.insert(PRIORITIES_TABLE, rows).await?;
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<SessionDetail, StoreError> {
        let rows: Vec<SessionDetail> = self
            .select(
                SESSIONS_TABLE,
                &[
                    ("select", DETAIL_SELECT.to_string()),
                    ("id", format!("eq.{}", id)),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("consultation session {}", id)))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionListing>, StoreError> {
        self.select(
            SESSIONS_TABLE,
            &[
                ("select", LISTING_SELECT.to_string()),
                ("order", "started_at.desc".to_string()),
            ],
        )
        .await
    }
}
