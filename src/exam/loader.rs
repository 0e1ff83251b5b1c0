use std::collections::BTreeSet;

use thiserror::Error;

use crate::exam::model::{
    ContentItem, GroupKind, ReadingQuestion, TestDocument, table_slot_numbers,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse test document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid test document: {0}")]
    Validation(String),
}

fn invalid(msg: impl Into<String>) -> LoadError {
    LoadError::Validation(msg.into())
}

/// Parse and validate a test document from JSON text.
///
/// Beyond deserialization this pass resolves everything the session relies
/// on being settled: listening numbers are unique, multi-select caps are
/// explicit, and reading questions carry their sequential numbers.
pub fn load_from_str(json: &str) -> Result<TestDocument, LoadError> {
    let mut doc: TestDocument = serde_json::from_str(json)?;
    finalize(&mut doc)?;
    Ok(doc)
}

pub fn load_from_slice(bytes: &[u8]) -> Result<TestDocument, LoadError> {
    let mut doc: TestDocument = serde_json::from_slice(bytes)?;
    finalize(&mut doc)?;
    Ok(doc)
}

fn finalize(doc: &mut TestDocument) -> Result<(), LoadError> {
    if doc.listening.sections.is_empty() {
        return Err(invalid("listening stage has no sections"));
    }
    if doc.reading.passages.is_empty() {
        return Err(invalid("reading stage has no passages"));
    }

    resolve_listening(doc)?;
    assign_reading_numbers(doc)?;
    Ok(())
}

fn resolve_listening(doc: &mut TestDocument) -> Result<(), LoadError> {
    let mut seen = BTreeSet::new();
    let mut require_unique = |n: u16| -> Result<(), LoadError> {
        if !seen.insert(n) {
            return Err(invalid(format!("duplicate listening question number {n}")));
        }
        Ok(())
    };

    for (idx, section) in doc.listening.sections.iter_mut().enumerate() {
        for item in &mut section.content {
            match item {
                ContentItem::Question(q) => require_unique(q.number)?,
                ContentItem::Group(group) => {
                    if group.members.is_empty() {
                        return Err(invalid(format!(
                            "question group in section {} has no members",
                            idx + 1
                        )));
                    }
                    for member in &group.members {
                        require_unique(member.number)?;
                    }
                    if group.kind == GroupKind::MultiSelect && group.max_selections.is_none() {
                        // Legacy documents encoded the cap only in prose.
                        let cap = instruction_cap(&group.instructions)
                            .or_else(|| instruction_cap(&group.text))
                            .unwrap_or(group.members.len());
                        group.max_selections = Some(cap);
                    }
                    if let Some(cap) = group.max_selections {
                        if cap == 0 || cap > group.members.len() {
                            return Err(invalid(format!(
                                "group cap {cap} does not fit {} members",
                                group.members.len()
                            )));
                        }
                    }
                }
                ContentItem::Table(table) => {
                    for n in table.slot_numbers() {
                        require_unique(n)?;
                    }
                }
                ContentItem::Text { .. } | ContentItem::Subheading { .. } => {}
            }
        }
        if section.question_numbers().is_empty() {
            return Err(invalid(format!("listening section {} has no questions", idx + 1)));
        }
    }
    Ok(())
}

/// Number every answerable reading slot sequentially across passages, in
/// document order, table-embedded slots included. Authored `___qN___`
/// placeholders must agree with the assigned sequence.
fn assign_reading_numbers(doc: &mut TestDocument) -> Result<(), LoadError> {
    let mut next: u16 = 1;
    for passage in &mut doc.reading.passages {
        let first = next;
        for question in &mut passage.questions {
            match question {
                ReadingQuestion::Note { .. } => {}
                ReadingQuestion::GapFill { number, .. }
                | ReadingQuestion::TrueFalseNotGiven { number, .. }
                | ReadingQuestion::YesNoNotGiven { number, .. }
                | ReadingQuestion::MultipleChoice { number, .. }
                | ReadingQuestion::Matching { number, .. } => {
                    *number = next;
                    next += 1;
                }
                ReadingQuestion::MultiSelect {
                    answers, numbers, ..
                } => {
                    if answers.is_empty() {
                        return Err(invalid("reading multi-select group has no answers"));
                    }
                    numbers.clear();
                    for _ in answers.iter() {
                        numbers.push(next);
                        next += 1;
                    }
                }
                ReadingQuestion::Table {
                    columns,
                    rows,
                    slot_numbers,
                    ..
                } => {
                    *slot_numbers = table_slot_numbers(columns, rows);
                    if slot_numbers.is_empty() {
                        return Err(invalid("reading table has no ___qN___ slots"));
                    }
                    for &authored in slot_numbers.iter() {
                        if authored != next {
                            return Err(invalid(format!(
                                "reading table slot ___q{authored}___ out of sequence \
                                 (expected ___q{next}___)"
                            )));
                        }
                        next += 1;
                    }
                }
            }
        }
        passage.number_range = if next > first {
            Some((first, next - 1))
        } else {
            None
        };
    }

    if next == 1 {
        return Err(invalid("reading stage has no answerable questions"));
    }
    Ok(())
}

/// Pull a selection cap out of instruction prose: "Choose THREE letters",
/// "select two", "3 options". Legacy fallback only; new documents author
/// `max_selections` directly.
pub fn instruction_cap(text: &str) -> Option<usize> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (i, word) in words.iter().enumerate() {
        if *word == "choose" || *word == "select" {
            if let Some(n) = words.get(i + 1).and_then(|w| word_to_number(w)) {
                return Some(n);
            }
        }
        if matches!(*word, "letters" | "options" | "answers") && i > 0 {
            if let Ok(n) = words[i - 1].parse::<usize>() {
                return Some(n);
            }
        }
    }
    None
}

fn word_to_number(word: &str) -> Option<usize> {
    if let Ok(n) = word.parse() {
        return Some(n);
    }
    let n = match word {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(n)
}
