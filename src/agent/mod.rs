mod chat;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use chat::{ChatMessage, ChatOutcome, ChatSession, FALLBACK_REPLY, Speaker, context_prompt};

pub const DEFAULT_AGENT_ID: &str = "6985ab8d3b50e9c8d7d7e9f2";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no agent endpoint configured")]
    NotConfigured,

    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("agent returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("agent response had no reply text")]
    MalformedResponse,

    #[error("chat request ended before the agent replied")]
    Interrupted,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTurn {
    pub role: TurnRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub agent_id: String,
    pub session_id: String,
    pub messages: Vec<AgentTurn>,
}

#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    async fn send(&self, request: &AgentRequest) -> Result<String, AgentError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAgent;

#[async_trait]
impl ConversationalAgent for DisabledAgent {
    async fn send(&self, _request: &AgentRequest) -> Result<String, AgentError> {
        Err(AgentError::NotConfigured)
    }
}

pub struct HttpAgent {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAgent {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, AgentError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ConversationalAgent for HttpAgent {
    async fn send(&self, request: &AgentRequest) -> Result<String, AgentError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let resp = call.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Status { status, body });
        }

        let body: Value = resp.json().await?;
        debug!(session = %request.session_id, "agent replied");
        extract_text(&body).ok_or(AgentError::MalformedResponse)
    }
}

const REPLY_KEYS: [&str; 3] = ["response", "message", "text"];

pub fn extract_text(body: &Value) -> Option<String> {
    match body {
        Value::String(text) => non_blank(text),
        Value::Object(map) => REPLY_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .chain(map.get("result"))
            .find_map(extract_text),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_text_reads_common_shapes() {
        assert_eq!(extract_text(&json!("hi")), Some("hi".to_string()));
        assert_eq!(
            extract_text(&json!({"response": "Start with an emergency fund."})),
            Some("Start with an emergency fund.".to_string())
        );
        assert_eq!(
            extract_text(&json!({"status": "ok", "result": {"text": "  Keep going  "}})),
            Some("Keep going".to_string())
        );
        assert_eq!(
            extract_text(&json!({"result": {"message": {"text": "nested"}}})),
            Some("nested".to_string())
        );
    }

    #[test]
    fn extract_text_rejects_empty_or_foreign_bodies() {
        assert_eq!(extract_text(&json!({"response": "   "})), None);
        assert_eq!(extract_text(&json!({"answer": "x"})), None);
        assert_eq!(extract_text(&json!([1, 2, 3])), None);
        assert_eq!(extract_text(&Value::Null), None);
    }

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let request = AgentRequest {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            session_id: "session-1".to_string(),
            messages: vec![AgentTurn {
                role: TurnRole::Assistant,
                content: "hello".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).expect("serializes");
        assert_eq!(json["agentId"], DEFAULT_AGENT_ID);
        assert_eq!(json["sessionId"], "session-1");
        assert_eq!(json["messages"][0]["role"], "assistant");
    }

    #[tokio::test]
    async fn disabled_agent_always_fails() {
        let request = AgentRequest {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            session_id: "s".to_string(),
            messages: Vec::new(),
        };
        let err = DisabledAgent.send(&request).await.expect_err("must fail");
        assert!(matches!(err, AgentError::NotConfigured));
    }
}
