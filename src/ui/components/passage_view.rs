use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::exam::model::ReadingPassage;
use crate::ui::theme::Theme;

/// The reading passage pane: title, instructions, then the passage split
/// into paragraphs. Scrolled independently of the question pane.
pub struct PassageView<'a> {
    passage: &'a ReadingPassage,
    index: usize,
    scroll: u16,
    theme: &'a Theme,
}

impl<'a> PassageView<'a> {
    pub fn new(passage: &'a ReadingPassage, index: usize, scroll: u16, theme: &'a Theme) -> Self {
        Self {
            passage,
            index,
            scroll,
            theme,
        }
    }
}

impl Widget for PassageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Passage {} ", self.index + 1))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            self.passage.title.clone(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        ))];
        if !self.passage.instructions.is_empty() {
            lines.push(Line::from(Span::styled(
                self.passage.instructions.clone(),
                Style::default().fg(colors.text_dim()),
            )));
        }
        lines.push(Line::from(""));

        for paragraph in self.passage.paragraphs() {
            lines.push(Line::from(Span::styled(
                paragraph.to_string(),
                Style::default().fg(colors.fg()),
            )));
            lines.push(Line::from(""));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(inner, buf);
    }
}
