pub mod report;

use std::collections::BTreeMap;

use crate::exam::QuestionId;
use crate::exam::model::{
    AnswerKey, ContentItem, ListeningStage, ReadingQuestion, ReadingStage,
};
use crate::session::answers::AnswerStore;

pub use report::{ResultDocument, StageResult, WritingResult, build_result, count_words};

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-insensitive, trimmed comparison against the accepted variants.
/// A missing or blank response never matches; an empty key never matches.
pub fn answers_match(user: Option<&str>, expected: &AnswerKey) -> bool {
    if expected.is_empty() {
        return false;
    }
    let Some(user) = user else {
        return false;
    };
    let user = normalize(user);
    if user.is_empty() {
        return false;
    }
    expected.variants().iter().any(|v| normalize(v) == user)
}

/// Per-stage scoring outcome: counts plus the raw and correct answers keyed
/// by question number, exactly what the result document records.
#[derive(Clone, Debug, Default)]
pub struct SectionScore {
    pub correct: u32,
    pub total: u32,
    pub answers: BTreeMap<u16, Option<String>>,
    pub correct_answers: BTreeMap<u16, Vec<String>>,
}

impl SectionScore {
    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.total)
    }

    fn grade(&mut self, store: &AnswerStore, id: QuestionId, expected: Option<&AnswerKey>) {
        let user = store.get(id).map(str::to_string);
        self.answers.insert(id.number, user.clone());
        if let Some(expected) = expected {
            self.correct_answers.insert(
                id.number,
                expected.variants().iter().map(|v| v.to_string()).collect(),
            );
            if answers_match(user.as_deref(), expected) {
                self.correct += 1;
            }
        }
        self.total += 1;
    }
}

pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// Walk every content item in every listening section: plain questions,
/// both group kinds, and tables.
pub fn score_listening(stage: &ListeningStage, store: &AnswerStore) -> SectionScore {
    let mut score = SectionScore::default();
    for section in &stage.sections {
        for item in &section.content {
            match item {
                ContentItem::Question(q) => {
                    score.grade(store, QuestionId::listening(q.number), Some(&q.answer));
                }
                ContentItem::Group(group) => {
                    for member in &group.members {
                        score.grade(
                            store,
                            QuestionId::listening(member.number),
                            Some(&member.answer),
                        );
                    }
                }
                ContentItem::Table(table) => {
                    if table.answers.is_empty() {
                        // No authored answers: inline slots still count
                        // toward the total but can never be correct.
                        for n in table.slot_numbers() {
                            score.grade(store, QuestionId::listening(n), None);
                        }
                    } else {
                        for (&n, expected) in &table.answers {
                            score.grade(store, QuestionId::listening(n), Some(expected));
                        }
                    }
                }
                ContentItem::Text { .. } | ContentItem::Subheading { .. } => {}
            }
        }
    }
    score
}

/// Walk reading passages in loader-assigned number order.
pub fn score_reading(stage: &ReadingStage, store: &AnswerStore) -> SectionScore {
    let mut score = SectionScore::default();
    for passage in &stage.passages {
        for question in &passage.questions {
            match question {
                ReadingQuestion::Note { .. } => {}
                ReadingQuestion::GapFill { number, answer, .. }
                | ReadingQuestion::TrueFalseNotGiven { number, answer, .. }
                | ReadingQuestion::YesNoNotGiven { number, answer, .. }
                | ReadingQuestion::MultipleChoice { number, answer, .. }
                | ReadingQuestion::Matching { number, answer, .. } => {
                    score.grade(store, QuestionId::reading(*number), Some(answer));
                }
                ReadingQuestion::MultiSelect {
                    answers, numbers, ..
                } => {
                    for (number, answer) in numbers.iter().zip(answers) {
                        score.grade(store, QuestionId::reading(*number), Some(answer));
                    }
                }
                ReadingQuestion::Table {
                    answers,
                    slot_numbers,
                    ..
                } => {
                    for &n in slot_numbers {
                        score.grade(store, QuestionId::reading(n), answers.get(&n));
                    }
                }
            }
        }
    }
    score
}
