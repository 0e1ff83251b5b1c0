use std::fs;
use std::time::Instant;

use chrono::Utc;
use tempfile::TempDir;

use fullmock::exam::model::{ContentItem, ReadingQuestion, TestDocument};
use fullmock::exam::{QuestionId, Stage};
use fullmock::scoring::build_result;
use fullmock::session::{ExamSession, StageDurations, StageOutcome};
use fullmock::store::json_store::JsonStore;

fn make_store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

/// Every answerable question in the document with its first accepted answer.
fn correct_answers(doc: &TestDocument) -> Vec<(QuestionId, String)> {
    let mut answers = Vec::new();

    for section in &doc.listening.sections {
        for item in &section.content {
            match item {
                ContentItem::Question(q) => {
                    answers.push((
                        QuestionId::listening(q.number),
                        q.answer.variants()[0].clone(),
                    ));
                }
                ContentItem::Group(group) => {
                    for member in &group.members {
                        answers.push((
                            QuestionId::listening(member.number),
                            member.answer.variants()[0].clone(),
                        ));
                    }
                }
                ContentItem::Table(table) => {
                    for (&n, key) in &table.answers {
                        answers.push((QuestionId::listening(n), key.variants()[0].clone()));
                    }
                }
                _ => {}
            }
        }
    }

    for passage in &doc.reading.passages {
        for question in &passage.questions {
            match question {
                ReadingQuestion::Note { .. } => {}
                ReadingQuestion::GapFill { number, answer, .. }
                | ReadingQuestion::TrueFalseNotGiven { number, answer, .. }
                | ReadingQuestion::YesNoNotGiven { number, answer, .. }
                | ReadingQuestion::MultipleChoice { number, answer, .. }
                | ReadingQuestion::Matching { number, answer, .. } => {
                    answers.push((QuestionId::reading(*number), answer.variants()[0].clone()));
                }
                ReadingQuestion::MultiSelect {
                    answers: keys,
                    numbers,
                    ..
                } => {
                    for (n, key) in numbers.iter().zip(keys) {
                        answers.push((QuestionId::reading(*n), key.variants()[0].clone()));
                    }
                }
                ReadingQuestion::Table {
                    answers: keys,
                    slot_numbers,
                    ..
                } => {
                    for &n in slot_numbers {
                        if let Some(key) = keys.get(&n) {
                            answers.push((QuestionId::reading(n), key.variants()[0].clone()));
                        }
                    }
                }
            }
        }
    }

    answers
}

#[test]
fn bundled_test_has_forty_questions_per_scored_stage() {
    let (_dir, store) = make_store();
    let doc = store.load_test("test-1").unwrap();

    let listening: usize = doc
        .listening
        .sections
        .iter()
        .map(|s| s.question_numbers().len())
        .sum();
    assert_eq!(listening, 40);

    assert_eq!(doc.reading.passages.len(), 3);
    assert_eq!(doc.reading.passages[0].number_range, Some((1, 13)));
    assert_eq!(doc.reading.passages[1].number_range, Some((14, 26)));
    assert_eq!(doc.reading.passages[2].number_range, Some((27, 40)));
}

#[test]
fn full_session_end_to_end() {
    let (dir, store) = make_store();
    let doc = store.load_test("test-1").unwrap();
    let now = Instant::now();
    let mut session = ExamSession::new(doc, StageDurations::default(), now);

    // Answer everything correctly while walking the three stages.
    let key = correct_answers(&session.doc);
    assert_eq!(key.len(), 80);
    for (id, answer) in &key {
        session.record_answer(*id, answer.clone());
    }

    assert_eq!(session.stage(), Stage::Listening);
    assert_eq!(
        session.finish_stage(now),
        StageOutcome::Advanced(Stage::Reading)
    );
    assert_eq!(
        session.finish_stage(now),
        StageOutcome::Advanced(Stage::Writing)
    );

    session.answers.task1 = "The chart shows a steady rise in cruise passengers. ".repeat(20);
    session.answers.task2 = "Strict limits are justified in fragile regions. ".repeat(40);

    assert_eq!(session.finish_stage(now), StageOutcome::SubmitRequested);

    let result = build_result(&session.doc, &session.answers, "integration", Utc::now());
    assert_eq!(result.listening.total, 40);
    assert_eq!(result.listening.score, 40);
    assert_eq!(result.reading.total, 40);
    assert_eq!(result.reading.score, 40);
    assert_eq!(result.overall_percentage, 100);
    assert!(result.writing.task1_words >= 150);
    assert!(result.writing.task2_words >= 250);

    // Exactly one result document lands on disk.
    let id = store.save_result(&result).unwrap();
    let results_dir = dir.path().join("results");
    let files: Vec<_> = fs::read_dir(&results_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);

    let loaded = store.load_result(&id).unwrap();
    assert_eq!(loaded.result_id, id);
    assert_eq!(loaded.total_score, 80);
    assert_eq!(loaded.listening.answers.len(), 40);
    assert_eq!(loaded.reading.correct_answers.len(), 40);
}

#[test]
fn wrong_and_missing_answers_lower_the_score() {
    let (_dir, store) = make_store();
    let doc = store.load_test("test-1").unwrap();
    let now = Instant::now();
    let mut session = ExamSession::new(doc, StageDurations::default(), now);

    let key = correct_answers(&session.doc);
    // Answer everything except the last reading question; get listening
    // question 1 wrong.
    for (id, answer) in key.iter().take(key.len() - 1) {
        session.record_answer(*id, answer.clone());
    }
    session.record_answer(QuestionId::listening(1), "wrong");

    let result = build_result(&session.doc, &session.answers, "integration", Utc::now());
    assert_eq!(result.listening.score, 39);
    assert_eq!(result.reading.score, 39);
    assert_eq!(result.listening.total, 40);
    assert_eq!(result.reading.total, 40);
}

#[test]
fn case_and_whitespace_do_not_cost_marks() {
    let (_dir, store) = make_store();
    let doc = store.load_test("test-1").unwrap();
    let now = Instant::now();
    let mut session = ExamSession::new(doc, StageDurations::default(), now);

    for (id, answer) in correct_answers(&session.doc) {
        session.record_answer(id, format!("  {}  ", answer.to_uppercase()));
    }

    let result = build_result(&session.doc, &session.answers, "integration", Utc::now());
    assert_eq!(result.listening.score, 40);
    assert_eq!(result.reading.score, 40);
}

#[test]
fn jump_navigation_crosses_units_on_the_bundled_test() {
    let (_dir, store) = make_store();
    let doc = store.load_test("test-1").unwrap();
    let now = Instant::now();
    let mut session = ExamSession::new(doc, StageDurations::default(), now);

    session.jump_to_question(37);
    assert_eq!(session.section_index(), 3);
    session.jump_to_question(11);
    assert_eq!(session.section_index(), 1);

    session.finish_stage(now);
    session.jump_to_question(27);
    assert_eq!(session.passage_index(), 2);
    session.jump_to_question(14);
    assert_eq!(session.passage_index(), 1);
}
