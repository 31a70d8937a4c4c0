//! Domain model for quiz questions and answers.
//!
//! Every pipeline path (structural extraction, single-shot AI, multi-agent
//! workflow) ends in these types. The "exactly one correct answer" invariant
//! is enforced here, never trusted from input.

use serde::{Deserialize, Serialize};

/// Question kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    FreeResponse,
}

impl QuestionKind {
    /// Canonical wire name.
    pub fn name(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionKind::TrueFalse => "TRUE_FALSE",
            QuestionKind::FillBlank => "FILL_BLANK",
            QuestionKind::FreeResponse => "FREE_RESPONSE",
        }
    }

    /// Lenient parse of the names models actually emit.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "multiplechoice" | "mcq" | "choice" => Some(QuestionKind::MultipleChoice),
            "truefalse" | "boolean" => Some(QuestionKind::TrueFalse),
            "fillblank" | "fillintheblank" | "blank" => Some(QuestionKind::FillBlank),
            "freeresponse" | "shortanswer" | "essay" | "open" => Some(QuestionKind::FreeResponse),
            _ => None,
        }
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "normal" => Some(Difficulty::Medium),
            "hard" | "difficult" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// One answer option.
///
/// `order_index` is display order only, not a correctness ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub order_index: u32,
}

impl Answer {
    pub fn new(id: impl Into<String>, text: impl Into<String>, is_correct: bool, order_index: u32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
            order_index,
        }
    }
}

/// A quiz question.
///
/// Invariant: for `FreeResponse` the answer list is empty; for every other
/// kind it is non-empty and exactly one answer has `is_correct == true`.
/// Call [`Question::ensure_correct_answers`] after building one from
/// untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_answer_text: Option<String>,
}

fn default_points() -> u32 {
    1
}

impl Question {
    /// Repair the answer-set invariant.
    ///
    /// - `FreeResponse`: the answer list is forced empty (the first answer's
    ///   text is kept as `short_answer_text` if none was set).
    /// - Other kinds: if no answer is marked correct, the first becomes
    ///   correct; if several are, only the earliest keeps the flag.
    pub fn ensure_correct_answers(&mut self) {
        if self.kind == QuestionKind::FreeResponse {
            if self.short_answer_text.is_none() {
                if let Some(first) = self.answers.first() {
                    self.short_answer_text = Some(first.text.clone());
                }
            }
            self.answers.clear();
            return;
        }

        if self.answers.is_empty() {
            return;
        }

        let mut seen_correct = false;
        for answer in &mut self.answers {
            if answer.is_correct {
                if seen_correct {
                    answer.is_correct = false;
                } else {
                    seen_correct = true;
                }
            }
        }
        if !seen_correct {
            self.answers[0].is_correct = true;
        }

        if self.points == 0 {
            self.points = 1;
        }
    }

    /// Whether the answer-set invariant holds.
    pub fn has_valid_answers(&self) -> bool {
        match self.kind {
            QuestionKind::FreeResponse => self.answers.is_empty(),
            _ => {
                !self.answers.is_empty()
                    && self.answers.iter().filter(|a| a.is_correct).count() == 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_with_flags(flags: &[bool]) -> Question {
        Question {
            id: "q1".to_string(),
            text: "What is 2+2?".to_string(),
            kind: QuestionKind::MultipleChoice,
            difficulty: Difficulty::Medium,
            points: 1,
            explanation: String::new(),
            tags: vec![],
            answers: flags
                .iter()
                .enumerate()
                .map(|(i, &correct)| {
                    Answer::new(format!("a{}", i + 1), format!("option {}", i + 1), correct, i as u32 + 1)
                })
                .collect(),
            short_answer_text: None,
        }
    }

    #[test]
    fn repair_marks_first_when_none_correct() {
        let mut q = question_with_flags(&[false, false, false]);
        q.ensure_correct_answers();
        assert!(q.answers[0].is_correct);
        assert_eq!(q.answers.iter().filter(|a| a.is_correct).count(), 1);
    }

    #[test]
    fn repair_keeps_earliest_when_several_correct() {
        let mut q = question_with_flags(&[false, true, true, true]);
        q.ensure_correct_answers();
        assert!(q.answers[1].is_correct);
        assert_eq!(q.answers.iter().filter(|a| a.is_correct).count(), 1);
    }

    #[test]
    fn free_response_forces_empty_answers() {
        let mut q = question_with_flags(&[true, false]);
        q.kind = QuestionKind::FreeResponse;
        q.ensure_correct_answers();
        assert!(q.answers.is_empty());
        assert_eq!(q.short_answer_text.as_deref(), Some("option 1"));
        assert!(q.has_valid_answers());
    }

    #[test]
    fn kind_parse_is_lenient() {
        assert_eq!(QuestionKind::parse("MULTIPLE_CHOICE"), Some(QuestionKind::MultipleChoice));
        assert_eq!(QuestionKind::parse("true-false"), Some(QuestionKind::TrueFalse));
        assert_eq!(QuestionKind::parse("short_answer"), Some(QuestionKind::FreeResponse));
        assert_eq!(QuestionKind::parse("riddle"), None);
    }
}
