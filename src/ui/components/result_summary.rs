use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::scoring::ResultDocument;
use crate::ui::theme::Theme;

/// Post-submission score dashboard.
pub struct ResultSummary<'a> {
    result: &'a ResultDocument,
    notified: bool,
    theme: &'a Theme,
}

impl<'a> ResultSummary<'a> {
    pub fn new(result: &'a ResultDocument, notified: bool, theme: &'a Theme) -> Self {
        Self {
            result,
            notified,
            theme,
        }
    }

    fn score_color(&self, percentage: u32) -> ratatui::style::Color {
        let colors = &self.theme.colors;
        if percentage >= 75 {
            colors.success()
        } else if percentage >= 50 {
            colors.warning()
        } else {
            colors.error()
        }
    }
}

impl Widget for ResultSummary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Test Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            self.result.test_title.clone(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let stage_line = |label: &str, score: u32, total: u32, pct: u32| -> Line<'static> {
            Line::from(vec![
                Span::styled(format!("  {label:<11}"), Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{score}/{total}"),
                    Style::default()
                        .fg(self.score_color(pct))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({pct}%)"),
                    Style::default().fg(colors.text_dim()),
                ),
            ])
        };

        Paragraph::new(stage_line(
            "Listening:",
            self.result.listening.score,
            self.result.listening.total,
            self.result.listening.percentage,
        ))
        .render(layout[1], buf);

        Paragraph::new(stage_line(
            "Reading:",
            self.result.reading.score,
            self.result.reading.total,
            self.result.reading.percentage,
        ))
        .render(layout[2], buf);

        Paragraph::new(stage_line(
            "Overall:",
            self.result.total_score,
            self.result.total_possible,
            self.result.overall_percentage,
        ))
        .render(layout[3], buf);

        let writing_line = Line::from(vec![
            Span::styled("  Writing:   ", Style::default().fg(colors.fg())),
            Span::styled(
                format!(
                    "{} + {} words",
                    self.result.writing.task1_words, self.result.writing.task2_words
                ),
                Style::default().fg(colors.fg()),
            ),
            Span::styled(
                "  (assessed separately)",
                Style::default().fg(colors.text_dim()),
            ),
        ]);
        Paragraph::new(writing_line).render(layout[4], buf);

        let saved_line = Line::from(vec![
            Span::styled("  Saved as:  ", Style::default().fg(colors.fg())),
            Span::styled(
                self.result.result_id.clone(),
                Style::default().fg(colors.accent()),
            ),
            Span::styled(
                if self.notified {
                    "  \u{2022} summary sent"
                } else {
                    ""
                },
                Style::default().fg(colors.text_dim()),
            ),
        ]);
        Paragraph::new(saved_line).render(layout[5], buf);

        let help = Paragraph::new(Line::from(Span::styled(
            "  [q] Quit",
            Style::default().fg(colors.accent()),
        )));
        help.render(layout[7], buf);
    }
}
