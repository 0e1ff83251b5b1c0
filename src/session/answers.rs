use std::collections::BTreeMap;

use crate::exam::QuestionId;

/// The in-memory map from question id to the student's current response,
/// plus the two writing task texts. Created empty at session start, written
/// through on every input, preserved across stage transitions, and discarded
/// after submission. Navigation chips and the scorer both derive from this
/// store; nothing else tracks "answered" state.
#[derive(Clone, Debug, Default)]
pub struct AnswerStore {
    entries: BTreeMap<QuestionId, String>,
    pub task1: String,
    pub task2: String,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `id`. Empty values are kept (a cleared
    /// gap-fill still overwrites) but count as unanswered.
    pub fn set(&mut self, id: QuestionId, value: impl Into<String>) {
        self.entries.insert(id, value.into());
    }

    pub fn clear(&mut self, id: QuestionId) {
        self.entries.remove(&id);
    }

    pub fn get(&self, id: QuestionId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.get(id).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.entries.iter().map(|(id, v)| (*id, v.as_str()))
    }

    pub fn answered_count(&self, ids: impl IntoIterator<Item = QuestionId>) -> usize {
        ids.into_iter().filter(|id| self.is_answered(*id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let mut store = AnswerStore::new();
        let id = QuestionId::listening(7);
        assert!(store.get(id).is_none());

        store.set(id, "bus");
        assert_eq!(store.get(id), Some("bus"));
        assert!(store.is_answered(id));

        store.clear(id);
        assert!(store.get(id).is_none());
        assert!(!store.is_answered(id));
    }

    #[test]
    fn test_overwrite_keeps_one_entry_per_id() {
        let mut store = AnswerStore::new();
        let id = QuestionId::reading(3);
        store.set(id, "first");
        store.set(id, "second");
        assert_eq!(store.get(id), Some("second"));
        assert_eq!(store.iter().count(), 1);
    }

    #[test]
    fn test_blank_values_count_as_unanswered() {
        let mut store = AnswerStore::new();
        let id = QuestionId::listening(1);
        store.set(id, "");
        assert!(!store.is_answered(id));
        store.set(id, "   ");
        assert!(!store.is_answered(id));
    }

    #[test]
    fn test_stage_entries_are_disjoint() {
        let mut store = AnswerStore::new();
        store.set(QuestionId::listening(5), "A");
        store.set(QuestionId::reading(5), "B");
        assert_eq!(store.get(QuestionId::listening(5)), Some("A"));
        assert_eq!(store.get(QuestionId::reading(5)), Some("B"));
    }

    #[test]
    fn test_answered_count() {
        let mut store = AnswerStore::new();
        store.set(QuestionId::listening(1), "x");
        store.set(QuestionId::listening(2), "");
        let ids = (1..=3).map(QuestionId::listening);
        assert_eq!(store.answered_count(ids), 1);
    }
}
