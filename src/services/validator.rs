//! AI response validator.
//!
//! Models return "JSON, mostly": reasoning blocks, Markdown fences, a
//! trailing explanatory sentence, or a stream truncated right after the
//! questions array. The validator has a strict path and a partial-recovery
//! path; both end in schema validation plus answer-set repair. Never fails,
//! returns an empty list on total failure (the caller must treat empty as
//! failure).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::question::{Answer, Difficulty, Question, QuestionKind};

/// `<think>...</think>` reasoning blocks some models prepend.
static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// Markdown code fences around the payload.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?").unwrap());

/// Start of the questions array, for partial recovery.
static QUESTIONS_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""questions"\s*:\s*\["#).unwrap());

/// Parse a raw model response into validated questions.
pub fn parse_ai_response(raw: &str) -> Vec<Question> {
    let cleaned = clean_response(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }

    if let Some(questions) = strict_parse(&cleaned) {
        debug!(count = questions.len(), "strict parse succeeded");
        return questions;
    }

    let recovered = partial_recovery(&cleaned);
    if recovered.is_empty() {
        warn!("AI response failed both validation paths");
    } else {
        warn!(count = recovered.len(), "strict parse failed, partial recovery kept valid elements");
    }
    recovered
}

/// Strip reasoning blocks and code fences.
fn clean_response(raw: &str) -> String {
    let without_think = THINK_BLOCK.replace_all(raw, "");
    CODE_FENCE.replace_all(&without_think, "").trim().to_string()
}

/// Strict path: the whole cleaned text must parse, and every element must
/// validate. One invalid element fails the strict path (partial recovery
/// then salvages the rest).
fn strict_parse(cleaned: &str) -> Option<Vec<Question>> {
    let value: Value = serde_json::from_str(cleaned).ok()?;

    let elements = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map.get("questions")?.as_array()?.as_slice(),
        _ => return None,
    };
    if elements.is_empty() {
        return None;
    }

    let questions: Vec<Question> = elements
        .iter()
        .enumerate()
        .map(|(i, element)| validate_question(element, i + 1))
        .collect::<Option<Vec<_>>>()?;
    Some(questions)
}

/// Fallback path: locate the `"questions": [...]` substring, balance-match
/// the closing bracket, and validate elements independently, discarding the
/// invalid ones.
fn partial_recovery(cleaned: &str) -> Vec<Question> {
    let array_text = match QUESTIONS_ARRAY.find(cleaned) {
        Some(m) => balanced_array(&cleaned[m.end() - 1..]),
        // No named array; try the first bare bracket.
        None => cleaned.find('[').and_then(|i| balanced_array(&cleaned[i..])),
    };
    let Some(array_text) = array_text else {
        return Vec::new();
    };

    let Ok(Value::Array(elements)) = serde_json::from_str::<Value>(&array_text) else {
        return Vec::new();
    };

    elements
        .iter()
        .enumerate()
        .filter_map(|(i, element)| validate_question(element, i + 1))
        .collect()
}

/// Extract a balanced `[...]` prefix, respecting strings and escapes.
fn balanced_array(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Schema-validate one element. Required: non-empty `text` and a known
/// `kind`. Everything else gets a defaulted, clamped value. Returns `None`
/// for elements that cannot be a question at all.
fn validate_question(element: &Value, number: usize) -> Option<Question> {
    let object = element.as_object()?;

    let text = object
        .get("text")
        .or_else(|| object.get("question"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();

    let kind = object
        .get("kind")
        .or_else(|| object.get("type"))
        .and_then(Value::as_str)
        .and_then(QuestionKind::parse)?;

    let difficulty = object
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .unwrap_or_default();

    let points = object
        .get("points")
        .and_then(Value::as_u64)
        .map(|p| p.clamp(1, 1000) as u32)
        .unwrap_or(1);

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let tags = object
        .get("tags")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let answers = object
        .get("answers")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| validate_answer(item, number, i))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    // Non-free-response questions without a single usable answer are not
    // salvageable.
    if kind != QuestionKind::FreeResponse && answers.is_empty() {
        return None;
    }

    let short_answer_text = object
        .get("shortAnswerText")
        .or_else(|| object.get("short_answer_text"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut question = Question {
        id: object
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("q{}", number)),
        text,
        kind,
        difficulty,
        points,
        explanation,
        tags,
        answers,
        short_answer_text,
    };
    question.ensure_correct_answers();
    Some(question)
}

fn validate_answer(element: &Value, question_number: usize, index: usize) -> Option<Answer> {
    let object = element.as_object()?;
    let text = object
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();
    let is_correct = object
        .get("isCorrect")
        .or_else(|| object.get("is_correct"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(Answer::new(
        object
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("q{}-a{}", question_number, index + 1)),
        text,
        is_correct,
        index as u32 + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{"questions": [
        {"text": "What is 2+2?", "kind": "MULTIPLE_CHOICE", "difficulty": "EASY",
         "points": 2, "explanation": "basic arithmetic", "tags": ["math"],
         "answers": [{"text": "3", "isCorrect": false}, {"text": "4", "isCorrect": true}]}
    ]}"#;

    #[test]
    fn strict_path_parses_clean_json() {
        let questions = parse_ai_response(WELL_FORMED);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(questions[0].points, 2);
        assert_eq!(questions[0].answers[1].order_index, 2);
        assert!(questions[0].has_valid_answers());
    }

    #[test]
    fn strips_think_blocks_and_fences() {
        let wrapped = format!("<think>let me reason...\nabout this</think>```json\n{}\n```", WELL_FORMED);
        assert_eq!(parse_ai_response(&wrapped).len(), 1);
    }

    #[test]
    fn trailing_prose_triggers_partial_recovery() {
        let with_prose = format!("{}\n\nI hope these questions are helpful!", WELL_FORMED);
        assert_eq!(parse_ai_response(&with_prose).len(), 1);
    }

    #[test]
    fn truncated_after_array_recovers() {
        let truncated = r#"{"questions": [{"text": "Pick one", "kind": "TRUE_FALSE",
            "answers": [{"text": "True", "isCorrect": true}, {"text": "False"}]}], "meta"#;
        let questions = parse_ai_response(truncated);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind, QuestionKind::TrueFalse);
    }

    #[test]
    fn invalid_elements_are_discarded_valid_kept() {
        let mixed = r#"{"questions": [
            {"text": "Good one?", "kind": "MULTIPLE_CHOICE", "answers": [{"text": "a", "isCorrect": true}]},
            {"kind": "MULTIPLE_CHOICE", "answers": [{"text": "no text"}]},
            {"text": "Unknown kind", "kind": "RIDDLE"},
            {"text": "No answers", "kind": "MULTIPLE_CHOICE", "answers": []}
        ]}"#;
        let questions = parse_ai_response(mixed);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Good one?");
    }

    #[test]
    fn garbage_returns_empty() {
        assert!(parse_ai_response("").is_empty());
        assert!(parse_ai_response("I could not produce questions, sorry.").is_empty());
        assert!(parse_ai_response("{\"questions\": \"none\"}").is_empty());
    }

    #[test]
    fn free_response_answers_are_forced_empty() {
        let response = r#"{"questions": [{"text": "Explain gravity.", "kind": "FREE_RESPONSE",
            "answers": [{"text": "it pulls things", "isCorrect": true}]}]}"#;
        let questions = parse_ai_response(response);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].answers.is_empty());
        assert_eq!(questions[0].short_answer_text.as_deref(), Some("it pulls things"));
    }

    #[test]
    fn bare_array_is_accepted() {
        let response = r#"[{"text": "Bare?", "kind": "MULTIPLE_CHOICE",
            "answers": [{"text": "yes", "isCorrect": true}, {"text": "no"}]}]"#;
        assert_eq!(parse_ai_response(response).len(), 1);
    }
}
