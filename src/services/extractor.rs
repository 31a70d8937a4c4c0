//! Structural parser (content extractor).
//!
//! Recovers (question, answer-list) records from already-formatted Q&A text
//! with no AI involved. A single greedy line state machine is used instead
//! of a grammar because the source material is inconsistent: mixed numbering
//! schemes, OCR artifacts, Vietnamese/English mixing. The continuation
//! heuristics trade perfect precision for robustness on messy documents.
//!
//! Never fails; an unrecognizable document yields an empty list and the
//! caller decides whether that is an error.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::question::{Answer, Difficulty, Question, QuestionKind};
use crate::services::normalizer;

/// Parser position within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// No question block open yet.
    NoBlock,
    /// Collecting question text.
    InQuestion,
    /// Collecting answer text.
    InAnswer,
}

/// One answer option under construction.
#[derive(Debug)]
struct ParsedAnswerBlock {
    lines: Vec<String>,
    is_correct: bool,
}

/// One question block under construction. Owned by a single parsing pass and
/// discarded after conversion to [`Question`].
#[derive(Debug)]
struct ParsedQuestionBlock {
    question_lines: Vec<String>,
    answers: Vec<ParsedAnswerBlock>,
    start_line: usize,
    end_line: usize,
}

// ========== Question-start rules (ordered, first match wins) ==========

struct QuestionRule {
    name: &'static str,
    pattern: &'static Lazy<Regex>,
}

static Q_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}[.)]\s*(.*)$").unwrap());
static Q_LABELED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:câu|question|q)\s*\.?\s*\d{1,3}\s*[:.)]?\s*(.*)$").unwrap());
static Q_WRAPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\[(]\s*\d{1,3}\s*[\])]\s*[:.]?\s*(.*)$").unwrap());
static Q_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:[ivxlc]{2,})\s*[.)]\s*(.*)$").unwrap());
static Q_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•●▪‣]\s*(.*)$").unwrap());

/// Priority order matters: the plain numbered convention is by far the most
/// common, bullets are the most ambiguous.
static QUESTION_RULES: &[QuestionRule] = &[
    QuestionRule { name: "numbered", pattern: &Q_NUMBERED },
    QuestionRule { name: "labeled", pattern: &Q_LABELED },
    QuestionRule { name: "wrapped", pattern: &Q_WRAPPED },
    QuestionRule { name: "roman", pattern: &Q_ROMAN },
    QuestionRule { name: "bullet", pattern: &Q_BULLET },
];

// ========== Answer-start rules ==========

/// Correctness marker in front of an option, e.g. `*B. 4` or `✓ Paris`.
static CORRECT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[*✓✔☑√]|(?i:đúng|correct)\s*[:.])\s*").unwrap());

static A_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([A-Ha-h])\)\s*[.:]?\s*(.*)$").unwrap());
static A_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Ha-h])\]\s*[.:]?\s*(.*)$").unwrap());
static A_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-H])[.):]\s*(.*)$").unwrap());
static A_LOWER_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-h])\)\s*(.*)$").unwrap());
static A_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:answer|option|choice|đáp án)\s*(?:\d{1,2}|[A-Ha-h])?\s*[:.)]\s*(.*)$")
        .unwrap()
});

static ANSWER_RULES: &[&Lazy<Regex>] = &[&A_PAREN, &A_BRACKET, &A_LETTER, &A_LOWER_PAREN, &A_LABELED];

/// Relaxed answer shape used by the continuation fallback: an option letter
/// with an inconsistent delimiter, e.g. `B- 5` or `c/ Huế`.
static A_RELAXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?([A-Ha-h])[\)\].:\-/]+\s+(.+)$").unwrap());

// ========== Line classification ==========

/// Match a question-start marker and return the text after it.
///
/// A match is rejected when the remaining text itself looks like an answer
/// (guards against `1. A.` being misread), is under 3 characters, or is
/// purely numeric/punctuation.
fn match_question_start(line: &str) -> Option<String> {
    for rule in QUESTION_RULES {
        if let Some(caps) = rule.pattern.captures(line) {
            let body = caps.get(1).map_or("", |m| m.as_str()).trim();
            if looks_like_answer(body) {
                return None;
            }
            if body.chars().count() < 3 || is_numeric_or_punct(body) {
                return None;
            }
            debug!(rule = rule.name, "question start");
            return Some(body.to_string());
        }
    }
    None
}

/// Match an answer-start marker; returns (option text, is_correct).
fn match_answer_start(line: &str) -> Option<(String, bool)> {
    let (rest, marked_correct) = match CORRECT_PREFIX.find(line) {
        Some(m) => (&line[m.end()..], true),
        None => (line, false),
    };

    for rule in ANSWER_RULES {
        if let Some(caps) = rule.captures(rest) {
            let text = caps
                .get(caps.len() - 1)
                .map_or("", |m| m.as_str())
                .trim()
                .to_string();
            return Some((text, marked_correct));
        }
    }

    // A bare correctness marker still opens an answer: `✓ Paris`.
    if marked_correct && !rest.trim().is_empty() {
        return Some((rest.trim().to_string(), true));
    }

    None
}

/// Whether a line that failed the primary answer regexes still reads as an
/// answer label. Used as the continuation fallback to recover options with
/// inconsistent delimiters.
fn fallback_answer(line: &str) -> Option<(String, bool)> {
    if line.chars().count() > 120 {
        return None;
    }
    let (rest, marked_correct) = match CORRECT_PREFIX.find(line) {
        Some(m) => (&line[m.end()..], true),
        None => (line, false),
    };
    A_RELAXED
        .captures(rest)
        .map(|caps| (caps[2].trim().to_string(), marked_correct))
}

/// Cheap check used only as a question-start guard.
fn looks_like_answer(text: &str) -> bool {
    match_answer_start(text).is_some() || fallback_answer(text).is_some()
}

fn is_numeric_or_punct(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_punctuation() || c.is_whitespace())
}

/// Whether a plain line continues the open question text.
fn reads_as_continuation(prev_line: Option<&str>, line: &str) -> bool {
    if let Some(prev) = prev_line {
        let unterminated = !prev
            .chars()
            .last()
            .map(|c| matches!(c, '.' | '?' | '!' | ':' | ';'))
            .unwrap_or(false);
        if unterminated {
            return true;
        }
    }
    if let Some(first) = line.chars().next() {
        if first.is_lowercase() || matches!(first, '-' | '"' | '\'' | '“' | '‘' | '(') {
            return true;
        }
    }
    line.chars().count() < 50
}

// ========== Extraction ==========

/// Extract questions from already-formatted Q&A text.
pub fn extract_questions(content: &str) -> Vec<Question> {
    let normalized = normalizer::normalize(content);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut blocks: Vec<ParsedQuestionBlock> = Vec::new();
    let mut current: Option<ParsedQuestionBlock> = None;
    let mut state = ParserState::NoBlock;
    let mut prev_line: Option<String> = None;

    for (line_no, raw_line) in normalized.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(body) = match_question_start(line) {
            if let Some(mut block) = current.take() {
                block.end_line = line_no.saturating_sub(1);
                blocks.push(block);
            }
            current = Some(ParsedQuestionBlock {
                question_lines: vec![body],
                answers: Vec::new(),
                start_line: line_no,
                end_line: line_no,
            });
            state = ParserState::InQuestion;
        } else if let Some((text, is_correct)) = match_answer_start(line) {
            if let Some(block) = current.as_mut() {
                block.answers.push(ParsedAnswerBlock {
                    lines: vec![text],
                    is_correct,
                });
                state = ParserState::InAnswer;
            }
            // An answer before any question is preamble junk; skipped.
        } else {
            match (state, current.as_mut()) {
                (ParserState::InAnswer, Some(block)) => {
                    if let Some((text, is_correct)) = fallback_answer(line) {
                        block.answers.push(ParsedAnswerBlock {
                            lines: vec![text],
                            is_correct,
                        });
                    } else if let Some(answer) = block.answers.last_mut() {
                        answer.lines.push(line.to_string());
                    }
                }
                (ParserState::InQuestion, Some(block)) => {
                    if let Some((text, is_correct)) = fallback_answer(line) {
                        block.answers.push(ParsedAnswerBlock {
                            lines: vec![text],
                            is_correct,
                        });
                        state = ParserState::InAnswer;
                    } else if reads_as_continuation(prev_line.as_deref(), line) {
                        block.question_lines.push(line.to_string());
                    }
                }
                _ => {} // NoBlock: skip until the first question marker.
            }
        }

        prev_line = Some(line.to_string());
    }

    if let Some(mut block) = current.take() {
        block.end_line = normalized.lines().count().saturating_sub(1);
        blocks.push(block);
    }

    debug!(blocks = blocks.len(), "structural extraction finished");

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(index, block)| block_to_question(block, index + 1))
        .collect()
}

/// Convert a finished block into a domain question.
fn block_to_question(block: ParsedQuestionBlock, number: usize) -> Option<Question> {
    let text = collapse_whitespace(&block.question_lines.join(" "));
    if text.is_empty() {
        return None;
    }

    debug!(
        number,
        start = block.start_line,
        end = block.end_line,
        answers = block.answers.len(),
        "converting block"
    );

    let answers: Vec<Answer> = block
        .answers
        .into_iter()
        .enumerate()
        .filter_map(|(i, answer)| {
            let answer_text = collapse_whitespace(&answer.lines.join(" "));
            if answer_text.is_empty() {
                return None;
            }
            Some(Answer::new(
                format!("q{}-a{}", number, i + 1),
                answer_text,
                answer.is_correct,
                i as u32 + 1,
            ))
        })
        .collect();

    let kind = infer_kind(&text, &answers);

    let mut question = Question {
        id: format!("q{}", number),
        text,
        kind,
        difficulty: Difficulty::Medium,
        points: 1,
        explanation: String::new(),
        tags: Vec::new(),
        answers,
        short_answer_text: None,
    };
    question.ensure_correct_answers();
    Some(question)
}

fn infer_kind(text: &str, answers: &[Answer]) -> QuestionKind {
    if answers.is_empty() {
        return QuestionKind::FreeResponse;
    }
    if answers.len() == 2 && answers.iter().all(|a| is_boolean_text(&a.text)) {
        return QuestionKind::TrueFalse;
    }
    if text.contains("___") {
        return QuestionKind::FillBlank;
    }
    QuestionKind::MultipleChoice
}

fn is_boolean_text(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "true" | "false" | "đúng" | "sai" | "t" | "f"
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_round_trip() {
        let content = "1. What is 2+2?\nA. 3\n*B. 4\nC. 5\n2. Capital of France?\nA. Paris\n*B. Lyon";
        let questions = extract_questions(content);

        assert_eq!(questions.len(), 2);

        let first = &questions[0];
        assert_eq!(first.text, "What is 2+2?");
        assert_eq!(first.answers.len(), 3);
        let correct: Vec<_> = first.answers.iter().filter(|a| a.is_correct).collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].text, "4");

        let second = &questions[1];
        assert_eq!(second.answers.len(), 2);
        assert!(second.has_valid_answers());
    }

    #[test]
    fn empty_and_unstructured_input_yield_nothing() {
        assert!(extract_questions("").is_empty());
        assert!(extract_questions("random prose with no markers").is_empty());
        assert!(extract_questions("Some notes.\nMore notes without any list.").is_empty());
    }

    #[test]
    fn vietnamese_conventions() {
        let content = "Câu 1: Thủ đô của Việt Nam là gì?\nA. Huế\nĐáp án: Hà Nội\nCâu 2: Sông dài nhất?\na) Mê Kông\nb) Hồng";
        let questions = extract_questions(content);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].answers.len(), 2);
        assert_eq!(questions[1].answers.len(), 2);
    }

    #[test]
    fn question_text_continuation_joins_lines() {
        let content = "1. A train leaves the station at 9am\ntravelling at 60 km/h. When does it arrive?\nA. 10am\n*B. 11am";
        let questions = extract_questions(content);
        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].text,
            "A train leaves the station at 9am travelling at 60 km/h. When does it arrive?"
        );
    }

    #[test]
    fn answer_text_continuation_joins_lines() {
        let content = "1. Which statement is correct?\nA. The mitochondria is\nthe powerhouse of the cell\nB. Other";
        let questions = extract_questions(content);
        assert_eq!(questions[0].answers[0].text, "The mitochondria is the powerhouse of the cell");
    }

    #[test]
    fn fallback_recovers_inconsistent_delimiters() {
        let content = "1. Pick one option now\nA- first\nB- second\nC- third";
        let questions = extract_questions(content);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answers.len(), 3);
    }

    #[test]
    fn numeric_label_alone_is_not_a_question() {
        // Body under 3 characters or purely numeric rejects the marker.
        assert!(match_question_start("12.").is_none());
        assert!(match_question_start("3) 42").is_none());
        assert!(match_question_start("1. A.").is_none());
    }

    #[test]
    fn true_false_kind_is_inferred() {
        let content = "1. The Earth orbits the Sun, correct?\n*A. True\nB. False";
        let questions = extract_questions(content);
        assert_eq!(questions[0].kind, QuestionKind::TrueFalse);
    }

    #[test]
    fn block_without_answers_becomes_free_response() {
        let content = "1. Explain photosynthesis in your own words.\n2. Describe the water cycle briefly.";
        let questions = extract_questions(content);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].kind, QuestionKind::FreeResponse);
        assert!(questions[0].answers.is_empty());
    }

    #[test]
    fn every_question_keeps_the_answer_invariant() {
        let content = "1. No marked answer here?\nA. one\nB. two\n2. Two marked answers?\n*A. yes\n*B. also yes";
        for question in extract_questions(content) {
            assert!(question.has_valid_answers(), "{:?}", question);
        }
    }

    #[test]
    fn answer_order_index_is_one_based_and_stable() {
        let content = "1. Order check question?\nA. first\nB. second\nC. third";
        let questions = extract_questions(content);
        let indices: Vec<u32> = questions[0].answers.iter().map(|a| a.order_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
