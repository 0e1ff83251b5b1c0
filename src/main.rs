mod app;
mod config;
mod event;
mod exam;
mod notify;
mod scoring;
mod session;
mod store;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use app::{App, AppScreen, StatusKind};
use config::Config;
use event::{AppEvent, EventHandler};
use exam::Stage;
use session::AudioStatus;
use store::json_store::JsonStore;
use ui::components::nav_panel::NavPanel;
use ui::components::passage_view::PassageView;
use ui::components::question_list::{QuestionList, listening_lines, reading_lines};
use ui::components::result_summary::ResultSummary;
use ui::components::status_modal::{ModalKind, StatusModal};
use ui::components::writing_area::WritingArea;
use ui::layout::AppLayout;
use ui::line_input::InputResult;

#[derive(Parser)]
#[command(
    name = "fullmock",
    version,
    about = "Terminal IELTS full mock test runner"
)]
struct Cli {
    #[arg(short, long, default_value = "test-1", help = "Test document id")]
    test_id: String,

    #[arg(short, long, help = "Data directory override")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Candidate name stamped into the result")]
    name: Option<String>,

    #[arg(long, help = "List available test documents and exit")]
    list_tests: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();
    if let Some(name) = cli.name {
        config.candidate_name = name;
    }
    if let Some(theme_name) = cli.theme {
        config.theme = theme_name;
    }

    let store = match cli.data_dir {
        Some(dir) => JsonStore::with_base_dir(dir)?,
        None if !config.data_dir.is_empty() => {
            JsonStore::with_base_dir(PathBuf::from(&config.data_dir))?
        }
        None => JsonStore::new()?,
    };

    if cli.list_tests {
        for id in store.available_tests() {
            println!("{id}");
        }
        return Ok(());
    }

    let doc = store.load_test(&cli.test_id)?;

    let loaded_theme = ui::theme::Theme::load(&config.theme).unwrap_or_default();
    let theme: &'static ui::theme::Theme = Box::leak(Box::new(loaded_theme));

    let mut app = App::new(config, store, doc, theme);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(200));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Exam => handle_exam_key(app, key),
        AppScreen::StageTransition { .. } => handle_transition_key(app, key),
        AppScreen::ConfirmSubmit => handle_confirm_key(app, key),
        AppScreen::Result => handle_result_key(app, key),
    }
}

fn handle_exam_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();

    // While paused only resume is accepted.
    if app.session.is_paused() {
        if key.code == KeyCode::Char('p') {
            app.toggle_pause(now);
        }
        return;
    }

    // An open gap-fill editor captures all input first.
    if let Some(editor) = app.editing.as_mut() {
        match editor.handle_key(key) {
            InputResult::Submit => app.submit_editor(),
            InputResult::Cancel => app.editing = None,
            InputResult::Continue => {}
        }
        return;
    }

    if app.session.stage() == Stage::Writing {
        handle_writing_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Down | KeyCode::Tab => app.session.select_next_question(),
        KeyCode::Up | KeyCode::BackTab => app.session.select_prev_question(),
        KeyCode::Char(']') | KeyCode::Char('n') | KeyCode::Right => app.session.next_unit(),
        KeyCode::Char('[') | KeyCode::Char('b') | KeyCode::Left => app.session.prev_unit(),
        KeyCode::Enter => app.open_editor(),
        KeyCode::Backspace | KeyCode::Delete => app.clear_current(),
        KeyCode::Char('p') => app.toggle_pause(now),
        KeyCode::Char('f') => app.request_finish_stage(),
        KeyCode::PageDown => app.passage_scroll = app.passage_scroll.saturating_add(5),
        KeyCode::PageUp => app.passage_scroll = app.passage_scroll.saturating_sub(5),
        // Option hotkeys are uppercase so they never collide with controls.
        KeyCode::Char(ch) if ch.is_ascii_uppercase() => app.select_option(ch),
        _ => {}
    }
}

fn handle_writing_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('f') {
            app.request_finish_stage();
        }
        return;
    }
    match key.code {
        KeyCode::Char(ch) => app.writing_insert(ch),
        KeyCode::Enter => app.writing_insert('\n'),
        KeyCode::Backspace => app.writing_backspace(),
        KeyCode::Left => app.writing_move(-1),
        KeyCode::Right => app.writing_move(1),
        KeyCode::Tab => app.switch_writing_task(),
        _ => {}
    }
}

fn handle_transition_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('c') => app.confirm_transition(Instant::now()),
        _ => {}
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') => app.submit(),
        KeyCode::Esc | KeyCode::Char('n') => app.screen = AppScreen::Exam,
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => app.should_quit = true,
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Result => render_result(frame, app),
        _ => render_exam(frame, app),
    }

    match app.screen {
        AppScreen::StageTransition { to } => {
            let from = app.session.stage();
            let modal = StatusModal::new(
                &format!("{} Complete!", from.title()),
                vec![format!(
                    "You have completed the {} section. Ready to start {}?",
                    from.as_str(),
                    to.as_str()
                )],
                "[Enter] Continue",
                ModalKind::Info,
                app.theme,
            );
            frame.render_widget(modal, area);
        }
        AppScreen::ConfirmSubmit => {
            let modal = StatusModal::new(
                "Finish Test",
                vec!["Submit your answers? This cannot be undone.".to_string()],
                "[Enter] Submit   [Esc] Keep writing",
                ModalKind::Warning,
                app.theme,
            );
            frame.render_widget(modal, area);
        }
        _ => {}
    }

    if app.session.is_paused() && app.screen == AppScreen::Exam {
        let modal = StatusModal::new(
            "Paused",
            vec!["The clock and audio are stopped.".to_string()],
            "[p] Resume",
            ModalKind::Info,
            app.theme,
        );
        frame.render_widget(modal, area);
    }
}

fn render_exam(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::new(area);

    render_header(frame, app, layout.header);

    match app.session.stage() {
        Stage::Listening => {
            let rendered = listening_lines(
                app.session.current_section(),
                app.session.section_index(),
                &app.session.answers,
                app.session.current_number(),
                app.theme,
            );
            let title = format!(
                "Listening \u{2014} Section {} of {}",
                app.session.unit_index() + 1,
                app.session.unit_count()
            );
            let list =
                QuestionList::new(rendered, app.session.current_number(), &title, app.theme);
            frame.render_widget(list, layout.main);
        }
        Stage::Reading => {
            let (passage_area, questions_area) = AppLayout::split_reading(layout.main);
            let passage = PassageView::new(
                app.session.current_passage(),
                app.session.passage_index(),
                app.passage_scroll,
                app.theme,
            );
            frame.render_widget(passage, passage_area);

            let rendered = reading_lines(
                app.session.current_passage(),
                &app.session.answers,
                app.session.current_number(),
                app.theme,
            );
            let title = format!(
                "Questions \u{2014} Passage {} of {}",
                app.session.unit_index() + 1,
                app.session.unit_count()
            );
            let list =
                QuestionList::new(rendered, app.session.current_number(), &title, app.theme);
            frame.render_widget(list, questions_area);
        }
        Stage::Writing => {
            let tasks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(layout.main);
            let writing = &app.session.doc.writing;
            let task1 = WritingArea::new(
                &writing.task1,
                1,
                &app.session.answers.task1,
                app.writing_cursor[0],
                app.writing_focus == 0,
                app.theme,
            );
            frame.render_widget(task1, tasks[0]);
            let task2 = WritingArea::new(
                &writing.task2,
                2,
                &app.session.answers.task2,
                app.writing_cursor[1],
                app.writing_focus == 1,
                app.theme,
            );
            frame.render_widget(task2, tasks[1]);
        }
    }

    if let Some(nav_area) = layout.nav {
        if app.session.stage() != Stage::Writing {
            let groups = app.session.nav_groups();
            let nav = NavPanel::new(
                &groups,
                &app.session.answers,
                app.session.stage(),
                app.session.current_number(),
                app.theme,
            );
            frame.render_widget(nav, nav_area);
        }
    }

    render_footer(frame, app, layout.footer);

    // The active gap-fill editor renders as a small centered overlay.
    if let Some(editor) = &app.editing {
        let popup = ui::layout::centered_rect(40, 12, area);
        frame.render_widget(ratatui::widgets::Clear, popup);
        let colors = &app.theme.colors;
        let block = Block::bordered()
            .title(format!(" Answer {} ", app.session.current_number()))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let before: String = editor.value().chars().take(editor.cursor()).collect();
        let after: String = editor.value().chars().skip(editor.cursor()).collect();
        let line = Line::from(vec![
            Span::styled(before, Style::default().fg(colors.fg())),
            Span::styled(
                "\u{2588}",
                Style::default().fg(colors.accent()),
            ),
            Span::styled(after, Style::default().fg(colors.fg())),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    let now = Instant::now();
    let stage = app.session.stage();

    let clock_color = if app.session.timer().in_warning_zone(now) {
        colors.error()
    } else {
        colors.header_fg()
    };

    let unit = match stage {
        Stage::Listening => format!(
            " | Section {} of {}",
            app.session.unit_index() + 1,
            app.session.unit_count()
        ),
        Stage::Reading => format!(
            " | Passage {} of {}",
            app.session.unit_index() + 1,
            app.session.unit_count()
        ),
        Stage::Writing => " | Tasks 1 & 2".to_string(),
    };

    let audio = if stage == Stage::Listening {
        match app.session.audio().status(now) {
            AudioStatus::Playing {
                section,
                position,
                total,
            } => format!(
                " | \u{266a} Section {} audio {}:{:02}/{}:{:02}",
                section + 1,
                position.as_secs() / 60,
                position.as_secs() % 60,
                total.as_secs() / 60,
                total.as_secs() % 60,
            ),
            AudioStatus::Gap { next } => format!(" | \u{266a} Section {} audio next", next + 1),
            AudioStatus::Finished => " | \u{266a} audio finished".to_string(),
            AudioStatus::Idle => String::new(),
        }
    } else {
        String::new()
    };

    let title = format!(" {} \u{2014} {} ", app.session.doc.title, stage.title());
    let info = format!(
        "Stage {} of 3{unit}{audio}",
        stage.index() + 1
    );

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
        Span::styled(
            format!("  {} ", app.session.timer().display(now)),
            Style::default()
                .fg(clock_color)
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;

    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => colors.accent(),
            StatusKind::Warning => colors.warning(),
            StatusKind::Error => colors.error(),
        };
        let banner = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", status.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(banner, area);
        return;
    }

    let hints = match app.session.stage() {
        Stage::Listening => {
            " [\u{2191}\u{2193}] Question  [n/b] Section  [Enter] Type answer  [Shift+A-H] Choose  [p] Pause  [f] Finish Listening "
        }
        Stage::Reading => {
            " [\u{2191}\u{2193}] Question  [n/b] Passage  [PgUp/PgDn] Passage text  [Enter] Type answer  [Shift+A-H, T/F/Y/N, G=Not Given] Choose  [f] Finish Reading "
        }
        Stage::Writing => " [Tab] Switch task  [Ctrl+F] Finish Test ",
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(colors.text_dim()),
    )));
    frame.render_widget(footer, area);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    if let Some(result) = &app.last_result {
        let centered = ui::layout::centered_rect(60, 70, area);
        let summary = ResultSummary::new(result, app.notified, app.theme);
        frame.render_widget(summary, centered);
    }
}
