use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::Config;
use crate::exam::model::{ContentItem, ListeningFormat, ReadingQuestion, TestDocument};
use crate::exam::{QuestionId, Stage};
use crate::notify;
use crate::scoring::{ResultDocument, build_result};
use crate::session::{ExamSession, ToggleOutcome};
use crate::store::json_store::JsonStore;
use crate::store::schema::DraftData;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Transient footer banners replace the original's blocking alerts.
const STATUS_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Exam,
    /// "Listening Complete! Ready to start Reading?"
    StageTransition { to: Stage },
    ConfirmSubmit,
    Result,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

/// What keyboard input the currently selected question accepts.
#[derive(Clone, Debug)]
pub enum Target {
    /// Free text, edited through the line input.
    GapFill(QuestionId),
    /// One of a fixed option set, selected by hotkey.
    Choice {
        id: QuestionId,
        options: Vec<(char, String)>,
    },
    /// A capped group of checkboxes sharing slot numbers.
    MultiSelect {
        numbers: Vec<u16>,
        cap: usize,
        options: Vec<(char, String)>,
    },
}

pub struct App {
    pub screen: AppScreen,
    pub session: ExamSession,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: JsonStore,
    /// Active gap-fill editor, if any.
    pub editing: Option<LineInput>,
    /// Which writing task has focus (0 or 1) and the cursor in each.
    pub writing_focus: usize,
    pub writing_cursor: [usize; 2],
    pub passage_scroll: u16,
    pub status: Option<StatusLine>,
    pub last_result: Option<ResultDocument>,
    pub notified: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: JsonStore, doc: TestDocument, theme: &'static Theme) -> Self {
        let now = Instant::now();
        let durations = config.stage_durations();
        let test_id = doc.id.clone();
        let mut session = ExamSession::new(doc, durations, now);

        // Restore in-progress writing text from a previous run of the same
        // test, the way the browser version restored from local storage.
        if let Some(draft) = store.load_draft(&test_id) {
            session.answers.task1 = draft.task1;
            session.answers.task2 = draft.task2;
        }

        Self {
            screen: AppScreen::Exam,
            session,
            config,
            theme,
            store,
            editing: None,
            writing_focus: 0,
            writing_cursor: [0, 0],
            passage_scroll: 0,
            status: None,
            last_result: None,
            notified: false,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusLine {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Resolve what the currently selected question accepts.
    pub fn current_target(&self) -> Option<Target> {
        let number = self.session.current_number();
        match self.session.stage() {
            Stage::Listening => self.listening_target(number),
            Stage::Reading => self.reading_target(number),
            Stage::Writing => None,
        }
    }

    fn listening_target(&self, number: u16) -> Option<Target> {
        let id = QuestionId::listening(number);
        for item in &self.session.current_section().content {
            match item {
                ContentItem::Question(q) if q.number == number => {
                    return Some(match &q.format {
                        ListeningFormat::GapFill { .. } => Target::GapFill(id),
                        ListeningFormat::MultipleChoice { options, .. } => Target::Choice {
                            id,
                            options: letter_options(options.keys()),
                        },
                    });
                }
                ContentItem::Group(group) => {
                    if !group.members.iter().any(|m| m.number == number) {
                        continue;
                    }
                    let options = letter_options(group.options.keys());
                    return Some(match group.kind {
                        crate::exam::model::GroupKind::MultiSelect => Target::MultiSelect {
                            numbers: group.members.iter().map(|m| m.number).collect(),
                            cap: group.cap(),
                            options,
                        },
                        crate::exam::model::GroupKind::Matching => Target::Choice { id, options },
                    });
                }
                ContentItem::Table(table) if table.slot_numbers().contains(&number) => {
                    return Some(Target::GapFill(id));
                }
                _ => {}
            }
        }
        None
    }

    fn reading_target(&self, number: u16) -> Option<Target> {
        let id = QuestionId::reading(number);
        for question in &self.session.current_passage().questions {
            match question {
                ReadingQuestion::Note { .. } => {}
                ReadingQuestion::GapFill { number: n, .. } if *n == number => {
                    return Some(Target::GapFill(id));
                }
                ReadingQuestion::TrueFalseNotGiven { number: n, .. } if *n == number => {
                    return Some(Target::Choice {
                        id,
                        options: vec![
                            ('T', "TRUE".to_string()),
                            ('F', "FALSE".to_string()),
                            ('G', "NOT GIVEN".to_string()),
                        ],
                    });
                }
                ReadingQuestion::YesNoNotGiven { number: n, .. } if *n == number => {
                    return Some(Target::Choice {
                        id,
                        options: vec![
                            ('Y', "YES".to_string()),
                            ('N', "NO".to_string()),
                            ('G', "NOT GIVEN".to_string()),
                        ],
                    });
                }
                ReadingQuestion::MultipleChoice {
                    number: n, options, ..
                }
                | ReadingQuestion::Matching {
                    number: n, options, ..
                } if *n == number => {
                    return Some(Target::Choice {
                        id,
                        options: letter_options(options.iter().map(|o| &o.label)),
                    });
                }
                ReadingQuestion::MultiSelect {
                    options,
                    answers,
                    numbers,
                    ..
                } if numbers.contains(&number) => {
                    return Some(Target::MultiSelect {
                        numbers: numbers.clone(),
                        cap: answers.len(),
                        options: letter_options(options.keys()),
                    });
                }
                ReadingQuestion::Table { slot_numbers, .. } if slot_numbers.contains(&number) => {
                    return Some(Target::GapFill(id));
                }
                _ => {}
            }
        }
        None
    }

    /// Enter on a gap-fill opens the editor pre-filled with the saved value.
    pub fn open_editor(&mut self) {
        if let Some(Target::GapFill(id)) = self.current_target() {
            let existing = self.session.answers.get(id).unwrap_or("");
            self.editing = Some(LineInput::new(existing));
        }
    }

    pub fn submit_editor(&mut self) {
        let Some(editor) = self.editing.take() else {
            return;
        };
        if let Some(Target::GapFill(id)) = self.current_target() {
            self.session.record_answer(id, editor.value());
        }
    }

    /// Apply an option hotkey to the current question.
    pub fn select_option(&mut self, pressed: char) {
        let pressed = pressed.to_ascii_uppercase();
        match self.current_target() {
            Some(Target::Choice { id, options }) => {
                if let Some((_, value)) = options.iter().find(|(hotkey, _)| *hotkey == pressed) {
                    self.session.record_answer(id, value.clone());
                }
            }
            Some(Target::MultiSelect {
                numbers,
                cap,
                options,
            }) => {
                let Some((_, value)) = options.iter().find(|(hotkey, _)| *hotkey == pressed)
                else {
                    return;
                };
                let stage = self.session.stage();
                if self.session.toggle_group_option(stage, &numbers, cap, value)
                    == ToggleOutcome::Rejected
                {
                    self.set_status(
                        format!("You can only select {cap} options."),
                        StatusKind::Warning,
                    );
                }
            }
            _ => {}
        }
    }

    /// Backspace on a selected question clears its stored answer.
    pub fn clear_current(&mut self) {
        match self.current_target() {
            Some(Target::GapFill(id)) | Some(Target::Choice { id, .. }) => {
                self.session.clear_answer(id);
            }
            _ => {}
        }
    }

    /// `f` pressed: show the transition modal, or the submit confirmation
    /// at the end of writing.
    pub fn request_finish_stage(&mut self) {
        self.screen = match self.session.stage().next() {
            Some(to) => AppScreen::StageTransition { to },
            None => AppScreen::ConfirmSubmit,
        };
    }

    pub fn confirm_transition(&mut self, now: Instant) {
        if let AppScreen::StageTransition { .. } = self.screen {
            self.session.finish_stage(now);
            self.passage_scroll = 0;
            self.screen = AppScreen::Exam;
        }
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        if !self.session.stage().pausable() {
            return;
        }
        if self.session.is_paused() {
            self.session.resume(now);
        } else {
            self.session.pause(now);
        }
    }

    /// Writing-stage text editing, routed at the character level.
    pub fn writing_insert(&mut self, ch: char) {
        let focus = self.writing_focus;
        let cursor = &mut self.writing_cursor[focus];
        let text = if focus == 0 {
            &mut self.session.answers.task1
        } else {
            &mut self.session.answers.task2
        };
        crate::ui::components::writing_area::insert_char(text, cursor, ch);
        self.save_draft();
    }

    pub fn writing_backspace(&mut self) {
        let focus = self.writing_focus;
        let cursor = &mut self.writing_cursor[focus];
        let text = if focus == 0 {
            &mut self.session.answers.task1
        } else {
            &mut self.session.answers.task2
        };
        crate::ui::components::writing_area::backspace(text, cursor);
        self.save_draft();
    }

    pub fn writing_move(&mut self, delta: i8) {
        let focus = self.writing_focus;
        let text = if focus == 0 {
            &self.session.answers.task1
        } else {
            &self.session.answers.task2
        };
        if delta < 0 {
            crate::ui::components::writing_area::move_left(text, &mut self.writing_cursor[focus]);
        } else {
            crate::ui::components::writing_area::move_right(text, &mut self.writing_cursor[focus]);
        }
    }

    pub fn switch_writing_task(&mut self) {
        self.writing_focus = 1 - self.writing_focus;
        let text_len = if self.writing_focus == 0 {
            self.session.answers.task1.chars().count()
        } else {
            self.session.answers.task2.chars().count()
        };
        self.writing_cursor[self.writing_focus] =
            self.writing_cursor[self.writing_focus].min(text_len);
    }

    fn save_draft(&mut self) {
        let draft = DraftData::new(
            &self.session.doc.id,
            &self.session.answers.task1,
            &self.session.answers.task2,
        );
        let _ = self.store.save_draft(&draft);
    }

    /// Score, persist, and notify. On a failed write the session stays on
    /// the writing screen with submission re-enabled for a manual retry.
    pub fn submit(&mut self) {
        let result = build_result(
            &self.session.doc,
            &self.session.answers,
            &self.config.candidate_name,
            Utc::now(),
        );

        match self.store.save_result(&result) {
            Ok(id) => {
                let mut stamped = result;
                stamped.result_id = id;
                self.notified = notify::notify_submission(&self.config, &stamped);
                self.store.clear_draft(&self.session.doc.id);
                self.last_result = Some(stamped);
                self.screen = AppScreen::Result;
            }
            Err(err) => {
                self.set_status(
                    format!("Error submitting your result: {err}. Please try again."),
                    StatusKind::Error,
                );
                self.screen = AppScreen::Exam;
            }
        }
    }

    /// Drive timers and audio. Expiry forces the stage forward, or submits
    /// when writing runs out.
    pub fn tick(&mut self, now: Instant) {
        if let Some(status) = &self.status {
            if now.saturating_duration_since(status.shown_at) > STATUS_LIFETIME {
                self.status = None;
            }
        }

        if self.screen != AppScreen::Exam {
            return;
        }

        let outcome = self.session.tick(now);
        if outcome.five_minute_warning {
            self.set_status("5 minutes remaining!", StatusKind::Warning);
        }
        if outcome.expired {
            self.set_status("Time's up for this stage!", StatusKind::Warning);
            match self.session.stage().next() {
                Some(to) => self.screen = AppScreen::StageTransition { to },
                None => self.submit(),
            }
        }
    }
}

/// Lettered options select with their own letter as the hotkey.
fn letter_options<'a>(labels: impl Iterator<Item = &'a String>) -> Vec<(char, String)> {
    labels
        .map(|label| {
            let hotkey = label
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('?');
            (hotkey, label.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::load_from_str;
    use tempfile::TempDir;

    fn fixture_doc() -> TestDocument {
        load_from_str(
            r#"{
            "id": "t",
            "title": "Mock",
            "listening": {"sections": [
                {"title": "S1", "content": [
                    {"type": "question", "number": 1, "format": "gap-fill", "text": "a", "answer": "x"},
                    {"type": "question", "number": 2, "format": "multiple-choice",
                     "text": "b", "options": {"A": "1", "B": "2"}, "answer": "A"},
                    {"type": "question-group", "kind": "multi-select",
                     "instructions": "Choose TWO letters.",
                     "options": {"A": "1", "B": "2", "C": "3"},
                     "questions": [
                        {"number": 3, "answer": "A"},
                        {"number": 4, "answer": "B"}
                     ]}
                ]}
            ]},
            "reading": {"passages": [
                {"title": "P1", "text": "Body.", "questions": [
                    {"type": "true-false-notgiven", "question": "s", "answer": "TRUE"},
                    {"type": "gap-fill", "question": "q ...", "answer": "a"}
                ]}
            ]},
            "writing": {
                "task1": {"prompt": "Describe.", "min_words": 150},
                "task2": {"prompt": "Discuss.", "min_words": 250}
            }
        }"#,
        )
        .unwrap()
    }

    fn make_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let theme: &'static Theme = Box::leak(Box::new(Theme {
            name: "test".to_string(),
            colors: Default::default(),
        }));
        let app = App::new(Config::default(), store, fixture_doc(), theme);
        (dir, app)
    }

    #[test]
    fn test_target_resolution_per_question_kind() {
        let (_dir, mut app) = make_app();
        assert!(matches!(app.current_target(), Some(Target::GapFill(_))));

        app.session.jump_to_question(2);
        assert!(matches!(app.current_target(), Some(Target::Choice { .. })));

        app.session.jump_to_question(3);
        match app.current_target() {
            Some(Target::MultiSelect { numbers, cap, .. }) => {
                assert_eq!(numbers, vec![3, 4]);
                assert_eq!(cap, 2);
            }
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_editor_round_trip() {
        let (_dir, mut app) = make_app();
        app.open_editor();
        assert!(app.editing.is_some());
        for ch in "bus".chars() {
            app.editing.as_mut().unwrap().handle_key(crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char(ch),
                crossterm::event::KeyModifiers::NONE,
            ));
        }
        app.submit_editor();
        assert_eq!(app.session.answers.get(QuestionId::listening(1)), Some("bus"));
        assert!(app.editing.is_none());
    }

    #[test]
    fn test_choice_hotkey_records_answer() {
        let (_dir, mut app) = make_app();
        app.session.jump_to_question(2);
        app.select_option('b');
        assert_eq!(app.session.answers.get(QuestionId::listening(2)), Some("B"));
    }

    #[test]
    fn test_multi_select_rejection_sets_status() {
        let (_dir, mut app) = make_app();
        app.session.jump_to_question(3);
        app.select_option('A');
        app.select_option('B');
        assert!(app.status.is_none());
        app.select_option('C');
        let status = app.status.as_ref().expect("expected warning status");
        assert_eq!(status.kind, StatusKind::Warning);
        assert!(status.message.contains("2"));
    }

    #[test]
    fn test_reading_tfng_hotkeys() {
        let (_dir, mut app) = make_app();
        let now = Instant::now();
        app.session.finish_stage(now);
        app.select_option('g');
        assert_eq!(
            app.session.answers.get(QuestionId::reading(1)),
            Some("NOT GIVEN")
        );
    }

    #[test]
    fn test_finish_flow_reaches_confirm_submit() {
        let (_dir, mut app) = make_app();
        let now = Instant::now();
        app.request_finish_stage();
        assert_eq!(app.screen, AppScreen::StageTransition { to: Stage::Reading });
        app.confirm_transition(now);
        assert_eq!(app.screen, AppScreen::Exam);
        assert_eq!(app.session.stage(), Stage::Reading);

        app.request_finish_stage();
        app.confirm_transition(now);
        app.request_finish_stage();
        assert_eq!(app.screen, AppScreen::ConfirmSubmit);
    }

    #[test]
    fn test_submit_creates_result_and_clears_draft() {
        let (_dir, mut app) = make_app();
        let now = Instant::now();
        app.session.finish_stage(now);
        app.session.finish_stage(now);
        app.writing_insert('h');
        app.writing_insert('i');
        assert!(app.store.load_draft("t").is_some());

        app.submit();
        assert_eq!(app.screen, AppScreen::Result);
        let result = app.last_result.as_ref().unwrap();
        assert!(!result.result_id.is_empty());
        assert_eq!(result.writing.task1, "hi");
        assert!(app.store.load_draft("t").is_none());
        assert!(app.store.load_result(&result.result_id).is_ok());
    }

    #[test]
    fn test_writing_drafts_restored_on_new_session() {
        let (dir, mut app) = make_app();
        let now = Instant::now();
        app.session.finish_stage(now);
        app.session.finish_stage(now);
        for ch in "draft text".chars() {
            app.writing_insert(ch);
        }
        drop(app);

        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let theme: &'static Theme = Box::leak(Box::new(Theme {
            name: "test".to_string(),
            colors: Default::default(),
        }));
        let app2 = App::new(Config::default(), store, fixture_doc(), theme);
        assert_eq!(app2.session.answers.task1, "draft text");
    }

    #[test]
    fn test_writing_expiry_submits() {
        let (_dir, mut app) = make_app();
        let now = Instant::now();
        app.session.finish_stage(now);
        app.session.finish_stage(now);
        assert_eq!(app.session.stage(), Stage::Writing);

        // Fast-forward past the writing duration.
        let later = now + Duration::from_secs(60 * 60 + 1);
        app.tick(later);
        assert_eq!(app.screen, AppScreen::Result);
        assert!(app.last_result.is_some());
    }

    #[test]
    fn test_listening_expiry_opens_transition() {
        let (_dir, mut app) = make_app();
        let later = Instant::now() + Duration::from_secs(30 * 60 + 1);
        app.tick(later);
        assert_eq!(app.screen, AppScreen::StageTransition { to: Stage::Reading });
    }
}
