use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three timed phases of a full mock test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Listening,
    Reading,
    Writing,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Listening, Stage::Reading, Stage::Writing];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Listening => "listening",
            Stage::Reading => "reading",
            Stage::Writing => "writing",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Listening => "Listening",
            Stage::Reading => "Reading",
            Stage::Writing => "Writing",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Listening => 0,
            Stage::Reading => 1,
            Stage::Writing => 2,
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Listening => Some(Stage::Reading),
            Stage::Reading => Some(Stage::Writing),
            Stage::Writing => None,
        }
    }

    /// Exam-condition stage length: 30 minutes of listening, an hour each
    /// for reading and writing.
    pub fn default_duration_secs(self) -> u64 {
        match self {
            Stage::Listening => 30 * 60,
            Stage::Reading => 60 * 60,
            Stage::Writing => 60 * 60,
        }
    }

    /// Only the listening stage may be paused mid-run.
    pub fn pausable(self) -> bool {
        self == Stage::Listening
    }
}

/// Strongly typed question identity: the stage plus the 1-based question
/// number within that stage. Replaces the string keys (`"q7"`,
/// `"reading_q14"`) the authored documents historically used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId {
    pub stage: Stage,
    pub number: u16,
}

impl QuestionId {
    pub fn listening(number: u16) -> Self {
        Self {
            stage: Stage::Listening,
            number,
        }
    }

    pub fn reading(number: u16) -> Self {
        Self {
            stage: Stage::Reading,
            number,
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.stage {
            Stage::Listening => "q",
            Stage::Reading => "r",
            Stage::Writing => "w",
        };
        write!(f, "{prefix}{}", self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Listening.next(), Some(Stage::Reading));
        assert_eq!(Stage::Reading.next(), Some(Stage::Writing));
        assert_eq!(Stage::Writing.next(), None);
    }

    #[test]
    fn test_stage_durations() {
        assert_eq!(Stage::Listening.default_duration_secs(), 1800);
        assert_eq!(Stage::Reading.default_duration_secs(), 3600);
        assert_eq!(Stage::Writing.default_duration_secs(), 3600);
    }

    #[test]
    fn test_only_listening_pausable() {
        assert!(Stage::Listening.pausable());
        assert!(!Stage::Reading.pausable());
        assert!(!Stage::Writing.pausable());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(QuestionId::listening(7).to_string(), "q7");
        assert_eq!(QuestionId::reading(14).to_string(), "r14");
    }

    #[test]
    fn test_id_ordering_groups_by_stage() {
        let mut ids = vec![
            QuestionId::reading(1),
            QuestionId::listening(40),
            QuestionId::listening(2),
        ];
        ids.sort();
        assert_eq!(ids[0], QuestionId::listening(2));
        assert_eq!(ids[1], QuestionId::listening(40));
        assert_eq!(ids[2], QuestionId::reading(1));
    }
}
