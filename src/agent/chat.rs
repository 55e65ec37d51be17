use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::warn;

use super::{AgentError, AgentRequest, AgentTurn, ConversationalAgent, TurnRole};
use crate::core::{Session, metrics};
use crate::export::format_inr;

pub const FALLBACK_REPLY: &str = "I apologize, but I encountered an error. Please try again.";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Speaker,
    pub content: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "lowercase")]
pub enum ChatOutcome {
    Success(String),
    Failure(String),
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub fn context_prompt(session: &Session, question: &str) -> String {
    let plan = session.plan();
    format!(
        "User is on Step {}. Current financial data: Income ₹{}, Bills ₹{}, Surplus ₹{}. Question: {}",
        session.current_step(),
        format_inr(plan.monthly_income()),
        format_inr(plan.monthly_bills()),
        format_inr(metrics::surplus(plan)),
        question
    )
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: String,
    agent_id: String,
    messages: Vec<ChatMessage>,
    in_flight: bool,
}

impl ChatSession {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::with_session_id(agent_id, format!("session-{}", now_millis()))
    }

    pub fn with_session_id(agent_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            messages: Vec::new(),
            in_flight: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn begin(&mut self, input: &str, session: &Session) -> Option<AgentRequest> {
        let question = input.trim();
        if question.is_empty() || self.in_flight {
            return None;
        }

        let mut turns: Vec<AgentTurn> = self
            .messages
            .iter()
            .map(|m| AgentTurn {
                role: match m.role {
                    Speaker::User => TurnRole::User,
                    Speaker::Agent => TurnRole::Assistant,
                },
                content: m.content.clone(),
            })
            .collect();
        turns.push(AgentTurn {
            role: TurnRole::User,
            content: context_prompt(session, question),
        });

        self.messages.push(ChatMessage {
            role: Speaker::User,
            content: question.to_string(),
            timestamp_ms: now_millis(),
        });
        self.in_flight = true;

        Some(AgentRequest {
            agent_id: self.agent_id.clone(),
            session_id: self.session_id.clone(),
            messages: turns,
        })
    }

    pub fn finish(&mut self, result: Result<String, AgentError>) -> ChatOutcome {
        self.in_flight = false;
        let (content, outcome) = match result {
            Ok(reply) => (reply.clone(), ChatOutcome::Success(reply)),
            Err(e) => {
                warn!(session = %self.session_id, "chat call failed: {e}");
                (FALLBACK_REPLY.to_string(), ChatOutcome::Failure(e.to_string()))
            }
        };
        self.messages.push(ChatMessage {
            role: Speaker::Agent,
            content,
            timestamp_ms: now_millis(),
        });
        outcome
    }

    pub async fn send<A>(&mut self, agent: &A, input: &str, session: &Session) -> Option<ChatOutcome>
    where
        A: ConversationalAgent + ?Sized,
    {
        let request = self.begin(input, session)?;
        let result = agent.send(&request).await;
        Some(self.finish(result))
    }
}
