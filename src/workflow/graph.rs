//! The workflow graph.
//!
//! A directed state graph over the five agent roles with one bounded
//! feedback loop:
//!
//! ```text
//! Extractor -> QuestionCreator -> QuestionAnalysis -> Decider -> Formatter -> Done
//!                    ^                                   |
//!                    +--------- "NOT PERFECT" -----------+   (at most `max_iterations` times)
//! ```
//!
//! The iteration cap bounds cost and latency deterministically. Any node's
//! underlying call failing rejects the whole run; callers fall back to the
//! non-agentic path if they want partial resilience.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::server_api::ServerApi;
use crate::models::settings::GenerationOptions;
use crate::workflow::agents::{call_agent, AgentRole};
use crate::workflow::state::{AgentMessage, AgentState, StateUpdate};

/// Position in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Extractor,
    QuestionCreator,
    QuestionAnalysis,
    Decider,
    Formatter,
    Done,
}

/// Pure router: where to go after the node for `current` has run.
///
/// The only conditional edge is at the decider: loop back to the creator
/// while the verdict contains `NOT PERFECT` and the iteration budget is not
/// spent; otherwise proceed to the formatter.
pub fn next_state(current: WorkflowState, state: &AgentState, max_iterations: u32) -> WorkflowState {
    match current {
        WorkflowState::Extractor => WorkflowState::QuestionCreator,
        WorkflowState::QuestionCreator => WorkflowState::QuestionAnalysis,
        WorkflowState::QuestionAnalysis => WorkflowState::Decider,
        WorkflowState::Decider => {
            let verdict = state
                .last_content_from(AgentRole::Decider.name())
                .unwrap_or_default();
            if verdict.contains("NOT PERFECT") && state.iteration_count < max_iterations {
                WorkflowState::QuestionCreator
            } else {
                WorkflowState::Formatter
            }
        }
        WorkflowState::Formatter => WorkflowState::Done,
        WorkflowState::Done => WorkflowState::Done,
    }
}

/// The multi-agent question workflow.
///
/// Owns no resources; borrows the transport and drives one [`AgentState`]
/// per run.
pub struct QuestionWorkflow {
    api: Arc<dyn ServerApi>,
    model: String,
    max_iterations: u32,
}

impl QuestionWorkflow {
    pub fn new(api: Arc<dyn ServerApi>, config: &Config) -> Self {
        Self {
            api,
            model: config.model_name.clone(),
            max_iterations: config.decider_max_iterations,
        }
    }

    /// Run the graph to completion and return the formatter's output text.
    pub async fn run(&self, content: &str, options: &GenerationOptions) -> Result<String> {
        let mut state = AgentState::new();
        let mut current = WorkflowState::Extractor;

        info!(max_iterations = self.max_iterations, "starting question workflow");

        while current != WorkflowState::Done {
            let update = self.run_node(current, content, options, &state).await?;
            state.apply(update);

            let next = next_state(current, &state, self.max_iterations);
            if current == WorkflowState::Decider && next == WorkflowState::QuestionCreator {
                state.iteration_count += 1;
                debug!(iteration = state.iteration_count, "decider sent the draft back");
            }
            current = next;
        }

        info!(
            iterations = state.iteration_count,
            messages = state.messages.len(),
            "workflow completed"
        );

        state
            .question_content
            .ok_or_else(|| crate::error::AppError::validation_empty("produced by the workflow"))
    }

    async fn run_node(
        &self,
        node: WorkflowState,
        content: &str,
        options: &GenerationOptions,
        state: &AgentState,
    ) -> Result<StateUpdate> {
        let role = match node {
            WorkflowState::Extractor => AgentRole::Extractor,
            WorkflowState::QuestionCreator => AgentRole::QuestionCreator,
            WorkflowState::QuestionAnalysis => AgentRole::QuestionAnalysis,
            WorkflowState::Decider => AgentRole::Decider,
            WorkflowState::Formatter => AgentRole::Formatter,
            WorkflowState::Done => return Ok(StateUpdate::default()),
        };

        let user_message = self.build_user_message(role, content, options, state);
        let response = call_agent(self.api.as_ref(), role, &user_message, options, &self.model).await?;

        let mut update = StateUpdate {
            messages: vec![AgentMessage::new(role.name(), response.clone())],
            sender: Some(role.name().to_string()),
            ..StateUpdate::default()
        };
        match role {
            AgentRole::QuestionCreator => update.question_content = Some(response),
            AgentRole::QuestionAnalysis => update.analysis_result = Some(response),
            AgentRole::Formatter => {
                update.question_content = Some(response);
                update.is_completed = Some(true);
            }
            _ => {}
        }
        Ok(update)
    }

    /// Each node sees exactly the upstream artifacts it needs, never the
    /// whole transcript.
    fn build_user_message(
        &self,
        role: AgentRole,
        content: &str,
        options: &GenerationOptions,
        state: &AgentState,
    ) -> String {
        match role {
            AgentRole::Extractor => format!(
                "Request: create {} questions, {} difficulty, type {}. {}\n\nSource material:\n---\n{}\n---",
                options.number_of_questions,
                options.difficulty.name(),
                options.question_type.name(),
                options.language.directive(),
                content,
            ),
            AgentRole::QuestionCreator => format!(
                "Requirements:\n{}\n\nSource material:\n---\n{}\n---\n\nDraft exactly {} questions.",
                state.last_content_from(AgentRole::Extractor.name()).unwrap_or(""),
                content,
                options.number_of_questions,
            ),
            AgentRole::QuestionAnalysis => format!(
                "Requirements:\n{}\n\nDrafted questions:\n{}",
                state.last_content_from(AgentRole::Extractor.name()).unwrap_or(""),
                state.question_content.as_deref().unwrap_or(""),
            ),
            AgentRole::Decider => format!(
                "Requirements:\n{}\n\nAnalysed questions:\n{}",
                state.last_content_from(AgentRole::Extractor.name()).unwrap_or(""),
                state.analysis_result.as_deref().unwrap_or(""),
            ),
            AgentRole::Formatter => state
                .analysis_result
                .as_deref()
                .unwrap_or("")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_verdict(verdict: &str, iteration_count: u32) -> AgentState {
        let mut state = AgentState::new();
        state.apply(StateUpdate {
            messages: vec![AgentMessage::new("decider", verdict)],
            ..StateUpdate::default()
        });
        state.iteration_count = iteration_count;
        state
    }

    #[test]
    fn linear_edges() {
        let state = AgentState::new();
        assert_eq!(next_state(WorkflowState::Extractor, &state, 1), WorkflowState::QuestionCreator);
        assert_eq!(next_state(WorkflowState::QuestionCreator, &state, 1), WorkflowState::QuestionAnalysis);
        assert_eq!(next_state(WorkflowState::QuestionAnalysis, &state, 1), WorkflowState::Decider);
        assert_eq!(next_state(WorkflowState::Formatter, &state, 1), WorkflowState::Done);
    }

    #[test]
    fn decider_loops_back_within_budget() {
        let state = state_with_verdict("NOT PERFECT", 0);
        assert_eq!(next_state(WorkflowState::Decider, &state, 1), WorkflowState::QuestionCreator);
    }

    #[test]
    fn decider_proceeds_when_budget_spent() {
        let state = state_with_verdict("NOT PERFECT", 1);
        assert_eq!(next_state(WorkflowState::Decider, &state, 1), WorkflowState::Formatter);
    }

    #[test]
    fn decider_proceeds_on_perfect() {
        let state = state_with_verdict("PERFECT", 0);
        assert_eq!(next_state(WorkflowState::Decider, &state, 1), WorkflowState::Formatter);
    }

    #[test]
    fn missing_verdict_proceeds_to_formatter() {
        let state = AgentState::new();
        assert_eq!(next_state(WorkflowState::Decider, &state, 1), WorkflowState::Formatter);
    }
}
