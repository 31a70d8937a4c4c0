//! Shared state for one workflow execution.
//!
//! The state is owned by exactly one run and never shared across concurrent
//! runs. Nodes do not mutate it directly; each returns a [`StateUpdate`]
//! merged with reducer semantics: message lists concatenate, scalars
//! overwrite.

use chrono::{DateTime, Utc};

/// One agent utterance in the transcript.
#[derive(Debug, Clone)]
pub struct AgentMessage {
    /// Role name of the agent that produced it.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Workflow-run state.
#[derive(Debug, Default)]
pub struct AgentState {
    /// Ordered, append-only transcript.
    pub messages: Vec<AgentMessage>,
    /// Role name of the last agent to act.
    pub sender: String,
    /// How many times the decider sent the draft back.
    pub iteration_count: u32,
    /// Latest question draft (creator) / final output (formatter).
    pub question_content: Option<String>,
    /// Latest critique output.
    pub analysis_result: Option<String>,
    pub is_completed: bool,
}

/// Partial state returned by one node.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub messages: Vec<AgentMessage>,
    pub sender: Option<String>,
    pub question_content: Option<String>,
    pub analysis_result: Option<String>,
    pub is_completed: Option<bool>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reducer merge: concatenate messages, overwrite scalars that are set.
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(sender) = update.sender {
            self.sender = sender;
        }
        if let Some(content) = update.question_content {
            self.question_content = Some(content);
        }
        if let Some(analysis) = update.analysis_result {
            self.analysis_result = Some(analysis);
        }
        if let Some(completed) = update.is_completed {
            self.is_completed = completed;
        }
    }

    /// Content of the most recent message from the named role.
    pub fn last_content_from(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}
