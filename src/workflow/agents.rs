//! The five agent roles of the question workflow.
//!
//! An "agent" here is one role-scoped LLM prompt/response step, not an
//! autonomous process. Each node issues exactly one call through the
//! opaque server route.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::infrastructure::server_api::{content_of, Endpoint, ServerApi};
use crate::models::settings::GenerationOptions;

/// Agent roles, in graph order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Extractor,
    QuestionCreator,
    QuestionAnalysis,
    Decider,
    Formatter,
}

impl AgentRole {
    pub fn name(self) -> &'static str {
        match self {
            AgentRole::Extractor => "extractor",
            AgentRole::QuestionCreator => "question_creator",
            AgentRole::QuestionAnalysis => "question_analysis",
            AgentRole::Decider => "decider",
            AgentRole::Formatter => "formatter",
        }
    }

    /// Role-specific system prompt.
    pub fn system_prompt(self) -> &'static str {
        match self {
            AgentRole::Extractor => {
                "You analyse a quiz request and its source material. Respond with a structured \
                 summary of: exam type, target difficulty, question types to use, and the list of \
                 topics the material covers. Be concise and concrete."
            }
            AgentRole::QuestionCreator => {
                "You draft quiz questions from a requirements summary and source material. \
                 Produce exactly the requested number of questions as a JSON array. Every \
                 multiple-choice question has exactly 4 options and exactly one correct option. \
                 Return only the JSON array."
            }
            AgentRole::QuestionAnalysis => {
                "You review drafted quiz questions against the extracted requirements. Check \
                 clarity, relevance to the material, difficulty match, topic coverage, and answer \
                 correctness. Return an improved version of the questions as a JSON array and \
                 nothing else."
            }
            AgentRole::Decider => {
                "You judge whether an analysed question set fully satisfies the requirements. \
                 Respond with exactly PERFECT or exactly NOT PERFECT. No other output."
            }
            AgentRole::Formatter => {
                "You reformat quiz questions into the final strict JSON. Return ONLY a JSON object \
                 {\"questions\": [...]} where each question has text, kind, difficulty, points, \
                 explanation, tags, and answers with isCorrect flags. No prose."
            }
        }
    }
}

/// Run one agent step: a single LLM call through the server route.
pub async fn call_agent(
    api: &dyn ServerApi,
    role: AgentRole,
    user_message: &str,
    options: &GenerationOptions,
    model: &str,
) -> Result<String> {
    debug!(agent = role.name(), "running agent node");

    let payload = json!({
        "agent": role.name(),
        "system": role.system_prompt(),
        "user": user_message,
        "model": model,
        "settings": {
            "language": options.language.code(),
            "difficulty": options.difficulty.name(),
            "questionType": options.question_type.name(),
            "numberOfQuestions": options.number_of_questions,
        },
    });

    let response = api.call(Endpoint::GenerateQuestions, payload).await?;
    content_of(&response, Endpoint::GenerateQuestions)
}
