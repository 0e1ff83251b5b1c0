use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A full mock test document: three authored stages, loaded once per session
/// and treated as read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestDocument {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub listening: ListeningStage,
    pub reading: ReadingStage,
    pub writing: WritingStage,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListeningStage {
    pub sections: Vec<ListeningSection>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListeningSection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<SectionInstructions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioClip>,
    pub content: Vec<ContentItem>,
}

impl ListeningSection {
    /// Question numbers in this section, in authored order.
    pub fn question_numbers(&self) -> Vec<u16> {
        let mut numbers = Vec::new();
        for item in &self.content {
            match item {
                ContentItem::Question(q) => numbers.push(q.number),
                ContentItem::Group(g) => numbers.extend(g.members.iter().map(|m| m.number)),
                ContentItem::Table(t) => numbers.extend(t.slot_numbers()),
                ContentItem::Text { .. } | ContentItem::Subheading { .. } => {}
            }
        }
        numbers
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionInstructions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A section's audio clip. The runner models playback against the authored
/// duration; the url records where the recording lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioClip {
    pub url: String,
    pub duration_secs: u64,
}

/// Everything that can appear in a listening section body, in authored order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentItem {
    Text { value: String },
    Subheading { value: String },
    Question(ListeningQuestion),
    #[serde(rename = "question-group")]
    Group(QuestionGroup),
    Table(AnswerTable),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListeningQuestion {
    pub number: u16,
    #[serde(flatten)]
    pub format: ListeningFormat,
    pub answer: AnswerKey,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum ListeningFormat {
    /// `text` and `postfix` surround the blank.
    GapFill {
        text: String,
        #[serde(default)]
        postfix: String,
    },
    MultipleChoice {
        text: String,
        options: BTreeMap<String, String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    MultiSelect,
    Matching,
}

/// A cluster of sub-questions sharing one instruction and option set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub kind: GroupKind,
    pub instructions: String,
    #[serde(default)]
    pub text: String,
    pub options: BTreeMap<String, String>,
    /// Cap for multi-select groups. When absent the loader resolves it from
    /// the instruction text, then falls back to the member count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
    #[serde(rename = "questions")]
    pub members: Vec<GroupMember>,
}

impl QuestionGroup {
    /// The resolved selection cap. The loader guarantees `max_selections`
    /// is populated before a document reaches the session.
    pub fn cap(&self) -> usize {
        self.max_selections.unwrap_or(self.members.len())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMember {
    pub number: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub answer: AnswerKey,
}

/// A table whose cells may embed `___qN___` gap slots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerTable {
    #[serde(default)]
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
    /// Correct answers keyed by question number. Accepts the historical
    /// `q7` / `qq7` / bare `7` key spellings and normalizes them on parse.
    #[serde(default, deserialize_with = "table_answer_keys")]
    pub answers: BTreeMap<u16, AnswerKey>,
}

impl AnswerTable {
    /// Slot numbers embedded in the rows, scanned row-major in authored
    /// column order.
    pub fn slot_numbers(&self) -> Vec<u16> {
        table_slot_numbers(&self.columns, &self.rows)
    }
}

/// Row cells are keyed by the lowercased, space-stripped column name.
pub fn column_key(column: &str) -> String {
    column
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

pub fn table_slot_numbers(columns: &[String], rows: &[BTreeMap<String, String>]) -> Vec<u16> {
    let keys: Vec<String> = columns.iter().map(|c| column_key(c)).collect();
    let mut numbers = Vec::new();
    for row in rows {
        for key in &keys {
            if let Some(cell) = row.get(key) {
                collect_slot_numbers(cell, &mut numbers);
            }
        }
    }
    numbers
}

/// Scan a cell for `___qN___` markers, appending each `N` in order.
pub fn collect_slot_numbers(cell: &str, out: &mut Vec<u16>) {
    let mut rest = cell;
    while let Some(start) = rest.find("___q") {
        let tail = &rest[start + 4..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        let after = &tail[digits.len()..];
        if !digits.is_empty() && after.starts_with("___") {
            if let Ok(n) = digits.parse::<u16>() {
                out.push(n);
            }
            rest = &after[3..];
        } else {
            rest = &rest[start + 4..];
        }
    }
}

/// Parse a table-answer key. The authored corpus spells these three ways
/// (`q7`, `qq7`, bare `7`); all collapse to the question number.
pub fn parse_table_key(key: &str) -> Option<u16> {
    let trimmed = key.trim();
    let digits = trimmed
        .strip_prefix("qq")
        .or_else(|| trimmed.strip_prefix('q'))
        .unwrap_or(trimmed);
    digits.parse().ok()
}

fn table_answer_keys<'de, D>(deserializer: D) -> Result<BTreeMap<u16, AnswerKey>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: BTreeMap<String, AnswerKey> = BTreeMap::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let number = parse_table_key(&key)
            .ok_or_else(|| D::Error::custom(format!("invalid table answer key `{key}`")))?;
        if out.insert(number, value).is_some() {
            return Err(D::Error::custom(format!(
                "duplicate table answer key for question {number}"
            )));
        }
    }
    Ok(out)
}

/// A correct answer: either a single string or a set of acceptable variants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    One(String),
    Any(Vec<String>),
}

impl AnswerKey {
    pub fn variants(&self) -> &[String] {
        match self {
            AnswerKey::One(s) => std::slice::from_ref(s),
            AnswerKey::Any(v) => v.as_slice(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.variants().iter().all(|v| v.trim().is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingStage {
    pub passages: Vec<ReadingPassage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingPassage {
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    pub text: String,
    pub questions: Vec<ReadingQuestion>,
    /// Question number range covered by this passage; assigned by the loader.
    #[serde(skip)]
    pub number_range: Option<(u16, u16)>,
}

impl ReadingPassage {
    /// Passage body split into paragraphs on blank lines.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Reading question kinds. `number` fields are assigned sequentially across
/// passages by the loader, never authored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReadingQuestion {
    /// Headings and lead-in text with no answer slot.
    Note {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subheading: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    GapFill {
        question: String,
        answer: AnswerKey,
        #[serde(skip)]
        number: u16,
    },
    #[serde(rename = "true-false-notgiven")]
    TrueFalseNotGiven {
        question: String,
        answer: AnswerKey,
        #[serde(skip)]
        number: u16,
    },
    #[serde(rename = "yes-no-notgiven")]
    YesNoNotGiven {
        question: String,
        answer: AnswerKey,
        #[serde(skip)]
        number: u16,
    },
    MultipleChoice {
        question: String,
        options: Vec<LabeledOption>,
        answer: AnswerKey,
        #[serde(skip)]
        number: u16,
    },
    #[serde(
        rename = "paragraph-matching",
        alias = "match-person",
        alias = "match-purpose"
    )]
    Matching {
        question: String,
        options: Vec<LabeledOption>,
        answer: AnswerKey,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group_instruction: Option<String>,
        #[serde(skip)]
        number: u16,
    },
    MultiSelect {
        #[serde(default)]
        text: String,
        options: BTreeMap<String, String>,
        /// One entry per slot; answers are the correct option letters.
        answers: Vec<AnswerKey>,
        #[serde(skip)]
        numbers: Vec<u16>,
    },
    Table {
        #[serde(default)]
        title: String,
        columns: Vec<String>,
        rows: Vec<BTreeMap<String, String>>,
        #[serde(default, deserialize_with = "table_answer_keys")]
        answers: BTreeMap<u16, AnswerKey>,
        #[serde(skip)]
        slot_numbers: Vec<u16>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabeledOption {
    pub label: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WritingStage {
    pub task1: WritingTask,
    pub task2: WritingTask,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WritingTask {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub min_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_slot_numbers() {
        let mut out = Vec::new();
        collect_slot_numbers("leaves at ___q9___ from gate ___q10___", &mut out);
        assert_eq!(out, vec![9, 10]);
    }

    #[test]
    fn test_collect_slot_numbers_ignores_malformed() {
        let mut out = Vec::new();
        collect_slot_numbers("___q___ and ___qab___ and ___q7__", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_table_key_spellings() {
        assert_eq!(parse_table_key("q7"), Some(7));
        assert_eq!(parse_table_key("qq37"), Some(37));
        assert_eq!(parse_table_key("7"), Some(7));
        assert_eq!(parse_table_key("part1"), None);
        assert_eq!(parse_table_key("q"), None);
    }

    #[test]
    fn test_table_answers_normalize_mixed_keys() {
        let json = r#"{
            "columns": ["Item", "Detail"],
            "rows": [{"item": "Ferry", "detail": "at ___q37___ and ___q38___"}],
            "answers": {"qq37": "dawn", "38": "dusk"}
        }"#;
        let table: AnswerTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.answers.len(), 2);
        assert_eq!(table.answers[&37].variants(), ["dawn".to_string()]);
        assert_eq!(table.answers[&38].variants(), ["dusk".to_string()]);
    }

    #[test]
    fn test_table_answers_reject_colliding_keys() {
        let json = r#"{
            "columns": ["Item"],
            "rows": [],
            "answers": {"q5": "a", "qq5": "b"}
        }"#;
        let result: Result<AnswerTable, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_answer_key_variants() {
        let one: AnswerKey = serde_json::from_str("\"bus\"").unwrap();
        assert_eq!(one.variants(), ["bus".to_string()]);
        let many: AnswerKey = serde_json::from_str("[\"fish\", \"squid\"]").unwrap();
        assert_eq!(many.variants().len(), 2);
    }

    #[test]
    fn test_content_item_tagging() {
        let json = r#"{
            "type": "question",
            "number": 3,
            "format": "gap-fill",
            "text": "The tour starts at",
            "postfix": "am.",
            "answer": "nine"
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        match item {
            ContentItem::Question(q) => {
                assert_eq!(q.number, 3);
                assert!(matches!(q.format, ListeningFormat::GapFill { .. }));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn test_matching_aliases_deserialize() {
        for tag in ["paragraph-matching", "match-person", "match-purpose"] {
            let json = format!(
                r#"{{"type": "{tag}", "question": "Who?", "options": [{{"label": "A", "text": "x"}}], "answer": "A"}}"#
            );
            let q: ReadingQuestion = serde_json::from_str(&json).unwrap();
            assert!(matches!(q, ReadingQuestion::Matching { .. }));
        }
    }

    #[test]
    fn test_section_question_numbers_cover_all_item_kinds() {
        let json = r#"{
            "title": "Section 1",
            "content": [
                {"type": "text", "value": "intro"},
                {"type": "question", "number": 1, "format": "gap-fill", "text": "t", "answer": "a"},
                {"type": "question-group", "kind": "matching", "instructions": "Match.",
                 "options": {"A": "x"}, "questions": [
                    {"number": 2, "text": "m", "answer": "A"},
                    {"number": 3, "text": "n", "answer": "A"}
                 ]},
                {"type": "table", "columns": ["Item", "Detail"],
                 "rows": [{"item": "Bus", "detail": "at ___q4___"}],
                 "answers": {"4": "nine"}}
            ]
        }"#;
        let section: ListeningSection = serde_json::from_str(json).unwrap();
        assert_eq!(section.question_numbers(), vec![1, 2, 3, 4]);
    }
}
