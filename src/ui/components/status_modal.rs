use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalKind {
    Info,
    Warning,
    Error,
}

/// Centered overlay used for stage transitions, the pause screen, the
/// five-minute warning, and submission errors.
pub struct StatusModal<'a> {
    title: String,
    body: Vec<String>,
    hint: String,
    kind: ModalKind,
    theme: &'a Theme,
}

impl<'a> StatusModal<'a> {
    pub fn new(title: &str, body: Vec<String>, hint: &str, kind: ModalKind, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            body,
            hint: hint.to_string(),
            kind,
            theme,
        }
    }
}

impl Widget for StatusModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let accent = match self.kind {
            ModalKind::Info => colors.accent(),
            ModalKind::Warning => colors.warning(),
            ModalKind::Error => colors.error(),
        };

        let popup = centered_rect(50, 30, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(accent))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines: Vec<Line> = vec![Line::from("")];
        for entry in &self.body {
            lines.push(Line::from(Span::styled(
                entry.clone(),
                Style::default().fg(colors.fg()),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            self.hint.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
