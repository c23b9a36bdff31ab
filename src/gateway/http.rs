// HTTP transport to the persona agent backend

use super::{AgentGateway, AgentReply, AgentRequest, GatewayError};
use crate::models::ConsultationTool;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;

/// Agent gateway posting JSON to `<base_url><tool path>`
pub struct HttpAgentGateway {
    base_url: String,
    paths: HashMap<ConsultationTool, String>,
    http_client: reqwest::Client,
}

impl HttpAgentGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            paths: HashMap::new(),
            http_client,
        })
    }

    /// Override the backend path of one tool
    pub fn with_path(mut self, tool: ConsultationTool, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self.paths.insert(tool, path);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, tool: ConsultationTool) -> String {
        let path = self
            .paths
            .get(&tool)
            .map(String::as_str)
            .unwrap_or_else(|| tool.default_path());
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn send(
        &self,
        tool: ConsultationTool,
        request: AgentRequest,
    ) -> Result<AgentReply, GatewayError> {
        let url = self.url_for(tool);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        log::debug!(
            "Sending {} message to {} ({} prior turns)",
            tool,
            url,
            request.context.conversation_history.len()
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let reply: AgentReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if let Some(stage) = reply.conversation_stage() {
            log::debug!("{} agent stage: {}", tool, stage);
        }

        Ok(reply)
    }
}
