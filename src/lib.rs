//! # Quiz Pipeline
//!
//! Turns an arbitrary uploaded document or pasted text into a validated set
//! of structured quiz questions: either by deterministically parsing
//! already-formatted Q&A text, or by delegating to a multi-step AI agent
//! workflow, under retry, deduplication and schema-validation discipline.
//!
//! ## Architecture
//!
//! The system is layered strictly:
//!
//! ### ① Infrastructure layer
//! - `infrastructure/` - owns the scarce resource (the HTTP client), exposes
//!   only the capability to call the AI provider route (`ServerApi`)
//!
//! ### ② Service layer
//! - `services/` - single capabilities, ignorant of flow order
//! - `normalizer` - canonicalizes raw document text
//! - `extractor` - heuristic structural parsing, no AI
//! - `validator` - AI response validation and repair
//! - `coordinator` - request deduplication and bounded retry
//!
//! ### ③ Workflow layer
//! - `workflow/` - the multi-agent question workflow: five agent roles on a
//!   directed state graph with one bounded feedback loop
//!
//! ### ④ Orchestration layer
//! - `orchestrator/` - the `QuizPipeline` facade composing everything into
//!   the public operations, plus concurrent multi-file fan-out

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::{Endpoint, HttpServerApi, ServerApi};
pub use models::{
    Answer, Difficulty, GenerationMode, GenerationOptions, Language, ParsingMode, Question,
    QuestionKind, QuestionType, QuizDraft, TitleDescription, TitleOptions, UploadedFile,
};
pub use orchestrator::QuizPipeline;
pub use services::extractor::extract_questions;
pub use workflow::QuestionWorkflow;
