//! Prompt builders for the single-shot AI calls.
//!
//! Every prompt ends with a strict output contract ("return only ...") so
//! the validator's strict path has a fighting chance; the validator's
//! recovery path covers the models that ignore it anyway.

use serde_json::json;

use crate::models::question::Question;
use crate::models::settings::{GenerationMode, GenerationOptions, TitleOptions};

/// JSON shape every question-producing prompt demands.
const OUTPUT_CONTRACT: &str = r#"Return ONLY a JSON object of this exact shape, with no prose before or after it:
{"questions": [{"text": "...", "kind": "MULTIPLE_CHOICE|TRUE_FALSE|FILL_BLANK|FREE_RESPONSE", "difficulty": "EASY|MEDIUM|HARD", "points": 1, "explanation": "...", "tags": ["..."], "answers": [{"text": "...", "isCorrect": true}]}]}
Rules: multiple-choice questions have exactly 4 answers with exactly one isCorrect=true; true/false questions have exactly 2 answers; free-response questions have an empty answers array."#;

/// System + user messages for the single-shot generation/extraction call.
pub fn build_generation_messages(content: &str, options: &GenerationOptions) -> (String, String) {
    let system = match options.mode {
        GenerationMode::Generate => {
            "You are an experienced teacher writing quiz questions from course material. \
             Questions must be answerable from the material alone, unambiguous, and free of trick wording."
        }
        GenerationMode::Extract => {
            "You are a careful exam digitizer. You recover questions that already exist in the \
             source material, preserving their wording. You never invent new questions."
        }
    };

    let task = match options.mode {
        GenerationMode::Generate => format!(
            "Create exactly {} {} at {} difficulty from the material below.",
            options.number_of_questions,
            options.question_type.prompt_label(),
            options.difficulty.name(),
        ),
        GenerationMode::Extract => format!(
            "Extract up to {} questions that are already present in the material below, keeping their original wording.",
            options.number_of_questions,
        ),
    };

    let user = format!(
        "{}\n{}\n\nMaterial:\n---\n{}\n---\n\n{}",
        task,
        options.language.directive(),
        content,
        OUTPUT_CONTRACT
    );

    (system.to_string(), user)
}

/// Messages for the best-effort title/description call.
pub fn build_title_messages(
    content: &str,
    questions: &[Question],
    is_extract_mode: bool,
    options: &TitleOptions,
) -> (String, String) {
    let system = "You name quizzes. You answer with compact JSON and nothing else.";

    let question_texts: Vec<&str> = questions.iter().take(10).map(|q| q.text.as_str()).collect();
    let verb = if is_extract_mode { "extracted from" } else { "generated from" };
    let category = options
        .category_hint
        .as_deref()
        .map(|c| format!("\nCategory hint: {}", c))
        .unwrap_or_default();

    let preview: String = content.chars().take(1500).collect();
    let user = format!(
        "A quiz was {} the material below. Propose a short title (under 10 words) and a one-sentence description.\n{}{}\n\nMaterial excerpt:\n---\n{}\n---\n\nQuestions:\n{}\n\nReturn ONLY: {}",
        verb,
        options.language.directive(),
        category,
        preview,
        serde_json::to_string(&question_texts).unwrap_or_default(),
        json!({"title": "...", "description": "..."})
    );

    (system.to_string(), user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;
    use crate::models::settings::{Language, QuestionType};

    #[test]
    fn generation_prompt_carries_count_and_contract() {
        let options = GenerationOptions {
            number_of_questions: 7,
            question_type: QuestionType::MultipleChoice,
            difficulty: Difficulty::Hard,
            language: Language::Vi,
            ..GenerationOptions::default()
        };
        let (system, user) = build_generation_messages("cell biology notes", &options);
        assert!(system.contains("teacher"));
        assert!(user.contains("exactly 7"));
        assert!(user.contains("HARD"));
        assert!(user.contains("Vietnamese"));
        assert!(user.contains("Return ONLY"));
        assert!(user.contains("cell biology notes"));
    }

    #[test]
    fn extract_prompt_forbids_invention() {
        let options = GenerationOptions {
            mode: GenerationMode::Extract,
            ..GenerationOptions::default()
        };
        let (system, user) = build_generation_messages("material", &options);
        assert!(system.contains("never invent"));
        assert!(user.contains("already present"));
    }
}
