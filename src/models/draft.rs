//! Quiz draft assembled by the pipeline facade.
//!
//! A draft is created once per generation/extraction call, enriched with
//! metadata in place, and handed to the caller. It has no lifecycle of its
//! own beyond that call.

use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// Aggregate metadata computed over a draft's question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMetadata {
    pub total_questions: u32,
    pub total_points: u32,
    pub estimated_minutes: u32,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A generated or extracted quiz, ready for an editor store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QuizMetadata>,
}

impl QuizDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            questions,
            metadata: None,
        }
    }

    /// Recompute and attach metadata from the current question set.
    ///
    /// - `tags`: union over all questions, first-seen order, no duplicates.
    /// - `total_points`: sum of per-question points.
    /// - `estimated_minutes`: `max(5, ceil(count * 1.5))`.
    pub fn enrich_metadata(&mut self, category: Option<String>) {
        let count = self.questions.len() as u32;
        let total_points: u32 = self.questions.iter().map(|q| q.points).sum();

        let mut tags: Vec<String> = Vec::new();
        for question in &self.questions {
            for tag in &question.tags {
                let tag = tag.trim();
                if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                    tags.push(tag.to_string());
                }
            }
        }

        let estimated_minutes = ((count * 3 + 1) / 2).max(5);

        self.metadata = Some(QuizMetadata {
            total_questions: count,
            total_points,
            estimated_minutes,
            tags,
            category,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Answer, Difficulty, QuestionKind};

    fn question(id: &str, points: u32, tags: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {}", id),
            kind: QuestionKind::MultipleChoice,
            difficulty: Difficulty::Medium,
            points,
            explanation: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            answers: vec![
                Answer::new(format!("{}-a1", id), "yes", true, 1),
                Answer::new(format!("{}-a2", id), "no", false, 2),
            ],
            short_answer_text: None,
        }
    }

    #[test]
    fn metadata_aggregates_points_and_tags() {
        let mut draft = QuizDraft::new(
            "t",
            "d",
            vec![
                question("q1", 2, &["algebra", "basics"]),
                question("q2", 3, &["Basics", "geometry"]),
            ],
        );
        draft.enrich_metadata(Some("math".to_string()));

        let meta = draft.metadata.unwrap();
        assert_eq!(meta.total_questions, 2);
        assert_eq!(meta.total_points, 5);
        assert_eq!(meta.tags, vec!["algebra", "basics", "geometry"]);
        assert_eq!(meta.category.as_deref(), Some("math"));
    }

    #[test]
    fn estimated_minutes_has_floor_of_five() {
        let mut small = QuizDraft::new("t", "d", vec![question("q1", 1, &[])]);
        small.enrich_metadata(None);
        assert_eq!(small.metadata.unwrap().estimated_minutes, 5);

        let mut large = QuizDraft::new(
            "t",
            "d",
            (0..9).map(|i| question(&format!("q{}", i), 1, &[])).collect(),
        );
        large.enrich_metadata(None);
        // ceil(9 * 1.5) = 14
        assert_eq!(large.metadata.unwrap().estimated_minutes, 14);
    }
}
