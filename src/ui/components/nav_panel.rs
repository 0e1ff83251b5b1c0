use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::exam::{QuestionId, Stage};
use crate::session::answers::AnswerStore;
use crate::ui::theme::Theme;

/// One chip per question number, grouped per section/passage. Chip color is
/// purely a derived view of the answer store: answered chips fill, the
/// current chip is accented, everything else stays neutral.
pub struct NavPanel<'a> {
    groups: &'a [(String, Vec<u16>)],
    answers: &'a AnswerStore,
    stage: Stage,
    current: u16,
    theme: &'a Theme,
}

impl<'a> NavPanel<'a> {
    pub fn new(
        groups: &'a [(String, Vec<u16>)],
        answers: &'a AnswerStore,
        stage: Stage,
        current: u16,
        theme: &'a Theme,
    ) -> Self {
        Self {
            groups,
            answers,
            stage,
            current,
            theme,
        }
    }

    fn chip_style(&self, number: u16) -> Style {
        let colors = &self.theme.colors;
        if number == self.current {
            Style::default()
                .fg(colors.bg())
                .bg(colors.chip_current())
                .add_modifier(Modifier::BOLD)
        } else if self.answers.is_answered(QuestionId {
            stage: self.stage,
            number,
        }) {
            Style::default()
                .fg(colors.chip_answered_fg())
                .bg(colors.chip_answered())
        } else {
            Style::default()
                .fg(colors.chip_empty_fg())
                .bg(colors.chip_empty())
        }
    }

    /// Lines of chips, wrapped to `width` columns.
    fn chip_lines(&self, width: usize) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let mut lines: Vec<Line> = Vec::new();

        for (label, numbers) in self.groups {
            lines.push(Line::from(Span::styled(
                label.clone(),
                Style::default().fg(colors.text_dim()),
            )));

            let mut row: Vec<Span> = Vec::new();
            let mut row_width = 0usize;
            for &number in numbers {
                let chip = format!(" {number:>2} ");
                let chip_width = chip.len() + 1;
                if row_width + chip_width > width && !row.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut row)));
                    row_width = 0;
                }
                row.push(Span::styled(chip, self.chip_style(number)));
                row.push(Span::raw(" "));
                row_width += chip_width;
            }
            if !row.is_empty() {
                lines.push(Line::from(row));
            }
            lines.push(Line::from(""));
        }

        lines
    }
}

impl Widget for NavPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Questions ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.chip_lines(inner.width as usize);
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme {
            name: "test".to_string(),
            colors: Default::default(),
        }
    }

    fn groups() -> Vec<(String, Vec<u16>)> {
        vec![
            ("Section 1".to_string(), (1..=10).collect()),
            ("Section 2".to_string(), (11..=20).collect()),
        ]
    }

    #[test]
    fn test_chip_styles_derive_from_store() {
        let theme = theme();
        let groups = groups();
        let mut answers = AnswerStore::new();
        answers.set(QuestionId::listening(3), "bus");

        let panel = NavPanel::new(&groups, &answers, Stage::Listening, 5, &theme);
        let answered = panel.chip_style(3);
        let current = panel.chip_style(5);
        let empty = panel.chip_style(7);
        assert_eq!(answered.bg, Some(theme.colors.chip_answered()));
        assert_eq!(current.bg, Some(theme.colors.chip_current()));
        assert_eq!(empty.bg, Some(theme.colors.chip_empty()));
    }

    #[test]
    fn test_chip_style_follows_answer_removal() {
        let theme = theme();
        let groups = groups();
        let mut answers = AnswerStore::new();
        answers.set(QuestionId::listening(3), "A");
        answers.clear(QuestionId::listening(3));

        let panel = NavPanel::new(&groups, &answers, Stage::Listening, 1, &theme);
        assert_eq!(panel.chip_style(3).bg, Some(theme.colors.chip_empty()));
    }

    #[test]
    fn test_all_numbers_present() {
        let theme = theme();
        let groups = groups();
        let answers = AnswerStore::new();
        let panel = NavPanel::new(&groups, &answers, Stage::Listening, 1, &theme);
        let text: String = panel
            .chip_lines(28)
            .iter()
            .map(|l| {
                l.spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect::<String>()
                    + "\n"
            })
            .collect();
        for n in 1..=20 {
            assert!(text.contains(&format!(" {n:>2} ")), "missing chip {n}");
        }
        assert!(text.contains("Section 1"));
        assert!(text.contains("Section 2"));
    }

    #[test]
    fn test_chips_wrap_to_width() {
        let theme = theme();
        let groups = vec![("Section 1".to_string(), (1..=10).collect())];
        let answers = AnswerStore::new();
        let panel = NavPanel::new(&groups, &answers, Stage::Listening, 1, &theme);
        // 10 chips at ~6 cols each cannot fit one 20-col line.
        let lines = panel.chip_lines(20);
        let chip_rows = lines
            .iter()
            .filter(|l| l.spans.iter().any(|s| s.content.contains(" 1 ") || s.content.contains(" 9 ")))
            .count();
        assert!(chip_rows >= 2);
    }
}
