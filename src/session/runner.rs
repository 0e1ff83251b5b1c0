use std::time::{Duration, Instant};

use crate::exam::model::{ListeningSection, ReadingPassage, TestDocument};
use crate::exam::{QuestionId, Stage};
use crate::session::answers::AnswerStore;
use crate::session::audio::AudioSequencer;
use crate::session::timer::StageTimer;

/// Stage lengths for this run. Defaults are exam conditions; config can
/// shorten them for practice.
#[derive(Clone, Copy, Debug)]
pub struct StageDurations {
    pub listening: Duration,
    pub reading: Duration,
    pub writing: Duration,
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            listening: Duration::from_secs(Stage::Listening.default_duration_secs()),
            reading: Duration::from_secs(Stage::Reading.default_duration_secs()),
            writing: Duration::from_secs(Stage::Writing.default_duration_secs()),
        }
    }
}

impl StageDurations {
    pub fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Listening => self.listening,
            Stage::Reading => self.reading,
            Stage::Writing => self.writing,
        }
    }
}

/// Result of finishing the current stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Advanced(Stage),
    SubmitRequested,
}

/// Result of toggling a multi-select option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The group already holds its maximum; the store is unchanged.
    Rejected,
}

/// What a tick observed: at most one five-minute warning per stage, and
/// whether the stage clock ran out.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickOutcome {
    pub five_minute_warning: bool,
    pub expired: bool,
}

/// The whole live state of one test sitting: current stage and cursors, the
/// answer store, the stage timer, and the audio sequencer. Every mutation
/// of session state goes through a method here.
pub struct ExamSession {
    pub doc: TestDocument,
    durations: StageDurations,
    stage: Stage,
    section_idx: usize,
    passage_idx: usize,
    current_number: u16,
    pub answers: AnswerStore,
    timer: StageTimer,
    audio: AudioSequencer,
    /// Question numbers per listening section, in authored order.
    listening_numbers: Vec<Vec<u16>>,
}

impl ExamSession {
    pub fn new(doc: TestDocument, durations: StageDurations, now: Instant) -> Self {
        let listening_numbers: Vec<Vec<u16>> = doc
            .listening
            .sections
            .iter()
            .map(|s| s.question_numbers())
            .collect();
        let clips = doc
            .listening
            .sections
            .iter()
            .map(|s| s.audio.as_ref().map(|a| Duration::from_secs(a.duration_secs)))
            .collect();

        let mut session = Self {
            doc,
            durations,
            stage: Stage::Listening,
            section_idx: 0,
            passage_idx: 0,
            current_number: 0,
            answers: AnswerStore::new(),
            timer: StageTimer::start_at(durations.listening, now),
            audio: AudioSequencer::new(clips),
            listening_numbers,
        };
        session.begin_stage(Stage::Listening, now);
        session
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn timer(&self) -> &StageTimer {
        &self.timer
    }

    pub fn audio(&self) -> &AudioSequencer {
        &self.audio
    }

    pub fn section_index(&self) -> usize {
        self.section_idx
    }

    pub fn passage_index(&self) -> usize {
        self.passage_idx
    }

    pub fn current_number(&self) -> u16 {
        self.current_number
    }

    pub fn current_section(&self) -> &ListeningSection {
        &self.doc.listening.sections[self.section_idx]
    }

    pub fn current_passage(&self) -> &ReadingPassage {
        &self.doc.reading.passages[self.passage_idx]
    }

    /// Unit count for the current stage: sections, passages, or the two
    /// writing tasks.
    pub fn unit_count(&self) -> usize {
        match self.stage {
            Stage::Listening => self.doc.listening.sections.len(),
            Stage::Reading => self.doc.reading.passages.len(),
            Stage::Writing => 2,
        }
    }

    pub fn unit_index(&self) -> usize {
        match self.stage {
            Stage::Listening => self.section_idx,
            Stage::Reading => self.passage_idx,
            Stage::Writing => 0,
        }
    }

    /// Question numbers of the currently displayed section/passage.
    pub fn current_unit_numbers(&self) -> Vec<u16> {
        match self.stage {
            Stage::Listening => self.listening_numbers[self.section_idx].clone(),
            Stage::Reading => match self.doc.reading.passages[self.passage_idx].number_range {
                Some((lo, hi)) => (lo..=hi).collect(),
                None => Vec::new(),
            },
            Stage::Writing => Vec::new(),
        }
    }

    /// All question numbers of the current stage, in navigation order,
    /// grouped per section/passage with a group label.
    pub fn nav_groups(&self) -> Vec<(String, Vec<u16>)> {
        match self.stage {
            Stage::Listening => self
                .listening_numbers
                .iter()
                .enumerate()
                .map(|(i, nums)| (format!("Section {}", i + 1), nums.clone()))
                .collect(),
            Stage::Reading => self
                .doc
                .reading
                .passages
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let nums = match p.number_range {
                        Some((lo, hi)) => (lo..=hi).collect(),
                        None => Vec::new(),
                    };
                    (format!("Passage {}", i + 1), nums)
                })
                .collect(),
            Stage::Writing => Vec::new(),
        }
    }

    pub fn current_question_id(&self) -> Option<QuestionId> {
        match self.stage {
            Stage::Listening => Some(QuestionId::listening(self.current_number)),
            Stage::Reading => Some(QuestionId::reading(self.current_number)),
            Stage::Writing => None,
        }
    }

    fn stage_numbers(&self) -> Vec<u16> {
        self.nav_groups().into_iter().flat_map(|(_, n)| n).collect()
    }

    /// Which section/passage holds question `number`.
    fn unit_of(&self, number: u16) -> Option<usize> {
        match self.stage {
            Stage::Listening => self
                .listening_numbers
                .iter()
                .position(|nums| nums.contains(&number)),
            Stage::Reading => self
                .doc
                .reading
                .passages
                .iter()
                .position(|p| matches!(p.number_range, Some((lo, hi)) if (lo..=hi).contains(&number))),
            Stage::Writing => None,
        }
    }

    /// Navigation chip click: switch the containing unit if needed and
    /// select the question.
    pub fn jump_to_question(&mut self, number: u16) {
        let Some(unit) = self.unit_of(number) else {
            return;
        };
        match self.stage {
            Stage::Listening => self.section_idx = unit,
            Stage::Reading => self.passage_idx = unit,
            Stage::Writing => return,
        }
        self.current_number = number;
    }

    pub fn select_next_question(&mut self) {
        let numbers = self.stage_numbers();
        if let Some(pos) = numbers.iter().position(|&n| n == self.current_number) {
            if let Some(&next) = numbers.get(pos + 1) {
                self.jump_to_question(next);
            }
        } else if let Some(&first) = numbers.first() {
            self.jump_to_question(first);
        }
    }

    pub fn select_prev_question(&mut self) {
        let numbers = self.stage_numbers();
        if let Some(pos) = numbers.iter().position(|&n| n == self.current_number) {
            if pos > 0 {
                self.jump_to_question(numbers[pos - 1]);
            }
        }
    }

    pub fn next_unit(&mut self) {
        let last = self.unit_count().saturating_sub(1);
        match self.stage {
            Stage::Listening if self.section_idx < last => {
                self.section_idx += 1;
                self.select_first_in_unit();
            }
            Stage::Reading if self.passage_idx < last => {
                self.passage_idx += 1;
                self.select_first_in_unit();
            }
            _ => {}
        }
    }

    pub fn prev_unit(&mut self) {
        match self.stage {
            Stage::Listening if self.section_idx > 0 => {
                self.section_idx -= 1;
                self.select_first_in_unit();
            }
            Stage::Reading if self.passage_idx > 0 => {
                self.passage_idx -= 1;
                self.select_first_in_unit();
            }
            _ => {}
        }
    }

    pub fn on_last_unit(&self) -> bool {
        self.unit_index() + 1 >= self.unit_count()
    }

    fn select_first_in_unit(&mut self) {
        if let Some(&first) = self.current_unit_numbers().first() {
            self.current_number = first;
        }
    }

    /// Tear down the previous stage's audio, reset the cursor, and restart
    /// the timer. The answer store is intentionally left untouched.
    fn begin_stage(&mut self, stage: Stage, now: Instant) {
        self.stage = stage;
        self.timer = StageTimer::start_at(self.durations.for_stage(stage), now);
        match stage {
            Stage::Listening => {
                self.section_idx = 0;
                self.select_first_in_unit();
                self.audio.start(now);
            }
            Stage::Reading => {
                self.passage_idx = 0;
                self.select_first_in_unit();
            }
            Stage::Writing => {}
        }
    }

    /// Finish the current stage: Listening advances to Reading, Reading to
    /// Writing, and finishing Writing requests submission.
    pub fn finish_stage(&mut self, now: Instant) -> StageOutcome {
        match self.stage.next() {
            Some(next) => {
                self.begin_stage(next, now);
                StageOutcome::Advanced(next)
            }
            None => StageOutcome::SubmitRequested,
        }
    }

    /// Pause is honored only during listening; elsewhere it is a no-op.
    pub fn pause(&mut self, now: Instant) {
        if self.stage.pausable() && !self.timer.is_paused() {
            self.timer.pause(now);
            self.audio.pause(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.timer.is_paused() {
            self.timer.resume(now);
            self.audio.resume(now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.timer.is_paused()
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.timer.is_paused() {
            return TickOutcome::default();
        }
        if self.stage == Stage::Listening {
            self.audio.tick(now);
        }
        TickOutcome {
            five_minute_warning: self.timer.take_warning(now),
            expired: self.timer.expired(now),
        }
    }

    pub fn record_answer(&mut self, id: QuestionId, value: impl Into<String>) {
        self.answers.set(id, value);
    }

    pub fn clear_answer(&mut self, id: QuestionId) {
        self.answers.clear(id);
    }

    /// Options currently held by a multi-select group, read back from the
    /// store entries at the group's slot numbers.
    pub fn group_selections(&self, stage: Stage, numbers: &[u16]) -> Vec<String> {
        numbers
            .iter()
            .filter_map(|&n| self.answers.get(QuestionId { stage, number: n }))
            .map(str::to_string)
            .collect()
    }

    /// Toggle `option` in a multi-select group. Checking fills the lowest
    /// free slot; checking beyond the cap is rejected and leaves the store
    /// unchanged; unchecking clears exactly the slot holding that option.
    pub fn toggle_group_option(
        &mut self,
        stage: Stage,
        numbers: &[u16],
        cap: usize,
        option: &str,
    ) -> ToggleOutcome {
        let holder = numbers.iter().copied().find(|&n| {
            self.answers.get(QuestionId { stage, number: n }) == Some(option)
        });

        if let Some(number) = holder {
            self.answers.clear(QuestionId { stage, number });
            return ToggleOutcome::Removed;
        }

        let selected = numbers
            .iter()
            .filter(|&&n| self.answers.is_answered(QuestionId { stage, number: n }))
            .count();
        if selected >= cap {
            return ToggleOutcome::Rejected;
        }

        let free = numbers
            .iter()
            .copied()
            .find(|&n| !self.answers.is_answered(QuestionId { stage, number: n }));
        match free {
            Some(number) => {
                self.answers.set(QuestionId { stage, number }, option);
                ToggleOutcome::Added
            }
            None => ToggleOutcome::Rejected,
        }
    }
}
