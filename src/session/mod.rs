pub mod answers;
pub mod audio;
pub mod runner;
pub mod timer;

pub use answers::AnswerStore;
pub use audio::{AudioSequencer, AudioStatus};
pub use runner::{ExamSession, StageDurations, StageOutcome, ToggleOutcome};
pub use timer::StageTimer;
