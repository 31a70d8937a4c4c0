//! Typed settings for the pipeline operations.
//!
//! One explicit options struct per operation instead of an optional-bag
//! object threaded through the layers. Every recognized option is a field
//! here, with its effect documented.

use serde::{Deserialize, Serialize};

use crate::models::question::Difficulty;

/// Output language for AI-produced questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    /// Follow the language of the source material.
    Auto,
    En,
    Vi,
    Ko,
    Zh,
    Ja,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::En => "en",
            Language::Vi => "vi",
            Language::Ko => "ko",
            Language::Zh => "zh",
            Language::Ja => "ja",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Language::Auto),
            "en" => Some(Language::En),
            "vi" => Some(Language::Vi),
            "ko" => Some(Language::Ko),
            "zh" => Some(Language::Zh),
            "ja" => Some(Language::Ja),
            _ => None,
        }
    }

    /// Prompt directive for this language.
    pub fn directive(self) -> &'static str {
        match self {
            Language::Auto => "Write the questions in the same language as the source material.",
            Language::En => "Write the questions in English.",
            Language::Vi => "Write the questions in Vietnamese.",
            Language::Ko => "Write the questions in Korean.",
            Language::Zh => "Write the questions in Chinese.",
            Language::Ja => "Write the questions in Japanese.",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Auto
    }
}

/// Quality/latency trade-off for AI generation.
///
/// `Fast` and `Balanced` use a single LLM call; `Thorough` engages the
/// multi-agent workflow (higher quality, higher latency, more calls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsingMode {
    Fast,
    Balanced,
    Thorough,
}

impl ParsingMode {
    pub fn name(self) -> &'static str {
        match self {
            ParsingMode::Fast => "FAST",
            ParsingMode::Balanced => "BALANCED",
            ParsingMode::Thorough => "THOROUGH",
        }
    }
}

impl Default for ParsingMode {
    fn default() -> Self {
        ParsingMode::Balanced
    }
}

/// Whether the AI should invent new questions or recover ones already
/// present in the source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationMode {
    Generate,
    Extract,
}

impl GenerationMode {
    pub fn name(self) -> &'static str {
        match self {
            GenerationMode::Generate => "GENERATE",
            GenerationMode::Extract => "EXTRACT",
        }
    }
}

/// Requested question type mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Mixed,
    MultipleChoice,
    TrueFalse,
    FillBlank,
    FreeResponse,
}

impl QuestionType {
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::Mixed => "MIXED",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::FillBlank => "FILL_BLANK",
            QuestionType::FreeResponse => "FREE_RESPONSE",
        }
    }

    /// Prompt description of the requested mix.
    pub fn prompt_label(self) -> &'static str {
        match self {
            QuestionType::Mixed => "a mix of multiple-choice, true/false, fill-in-the-blank and free-response questions",
            QuestionType::MultipleChoice => "multiple-choice questions with exactly 4 options each",
            QuestionType::TrueFalse => "true/false questions",
            QuestionType::FillBlank => "fill-in-the-blank questions",
            QuestionType::FreeResponse => "free-response questions",
        }
    }
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Mixed
    }
}

/// Options for one AI generation/extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub mode: GenerationMode,
    pub parsing_mode: ParsingMode,
    pub language: Language,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub number_of_questions: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Generate,
            parsing_mode: ParsingMode::Balanced,
            language: Language::Auto,
            question_type: QuestionType::Mixed,
            difficulty: Difficulty::Medium,
            number_of_questions: 10,
        }
    }
}

impl GenerationOptions {
    /// Stable textual fingerprint used in the request-deduplication key.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.mode.name(),
            self.parsing_mode.name(),
            self.language.code(),
            self.question_type.name(),
            self.difficulty.name(),
            self.number_of_questions
        )
    }
}

/// Options for the title/description call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleOptions {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub category_hint: Option<String>,
}

/// An uploaded document, already converted to base64 by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// Best-effort result of the title/description call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDescription {
    pub title: String,
    pub description: String,
}
