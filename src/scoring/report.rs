use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exam::TestDocument;
use crate::scoring::{SectionScore, percentage, score_listening, score_reading};
use crate::session::answers::AnswerStore;

/// The write-once record created at submission: raw per-question answers,
/// correct answers, computed scores and percentages for listening and
/// reading, and the verbatim writing task text. Writing is not scored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultDocument {
    #[serde(default)]
    pub result_id: String,
    pub candidate: String,
    pub test_id: String,
    pub test_title: String,
    pub listening: StageResult,
    pub reading: StageResult,
    pub writing: WritingResult,
    pub total_score: u32,
    pub total_possible: u32,
    pub overall_percentage: u32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageResult {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub answers: BTreeMap<u16, Option<String>>,
    pub correct_answers: BTreeMap<u16, Vec<String>>,
}

impl From<SectionScore> for StageResult {
    fn from(score: SectionScore) -> Self {
        let pct = score.percentage();
        Self {
            score: score.correct,
            total: score.total,
            percentage: pct,
            answers: score.answers,
            correct_answers: score.correct_answers,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WritingResult {
    pub task1: String,
    pub task2: String,
    pub task1_words: usize,
    pub task2_words: usize,
    pub total_words: usize,
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Run the scorer over both scored stages and assemble the result document.
/// Called exactly once per session, at final submission.
pub fn build_result(
    doc: &TestDocument,
    store: &AnswerStore,
    candidate: &str,
    submitted_at: DateTime<Utc>,
) -> ResultDocument {
    let listening: StageResult = score_listening(&doc.listening, store).into();
    let reading: StageResult = score_reading(&doc.reading, store).into();

    let total_score = listening.score + reading.score;
    let total_possible = listening.total + reading.total;

    let task1_words = count_words(&store.task1);
    let task2_words = count_words(&store.task2);

    ResultDocument {
        result_id: String::new(),
        candidate: candidate.to_string(),
        test_id: doc.id.clone(),
        test_title: doc.title.clone(),
        listening,
        reading,
        writing: WritingResult {
            task1: store.task1.clone(),
            task2: store.task2.clone(),
            task1_words,
            task2_words,
            total_words: task1_words + task2_words,
        },
        total_score,
        total_possible,
        overall_percentage: percentage(total_score, total_possible),
        submitted_at,
    }
}
