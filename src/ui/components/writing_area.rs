use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::exam::model::WritingTask;
use crate::scoring::count_words;
use crate::ui::theme::Theme;

/// Cursor-aware editing helpers for the task text. The cursor is a char
/// index into the string; every mutation keeps it in range.
pub fn insert_char(text: &mut String, cursor: &mut usize, ch: char) {
    let idx = byte_index(text, *cursor);
    text.insert(idx, ch);
    *cursor += 1;
}

pub fn backspace(text: &mut String, cursor: &mut usize) {
    if *cursor > 0 {
        *cursor -= 1;
        let idx = byte_index(text, *cursor);
        text.remove(idx);
    }
}

pub fn move_left(text: &str, cursor: &mut usize) {
    let _ = text;
    *cursor = cursor.saturating_sub(1);
}

pub fn move_right(text: &str, cursor: &mut usize) {
    if *cursor < text.chars().count() {
        *cursor += 1;
    }
}

fn byte_index(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// One writing task: prompt, editable answer text, and the live word count
/// against the task minimum.
pub struct WritingArea<'a> {
    task: &'a WritingTask,
    task_no: usize,
    text: &'a str,
    cursor: usize,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> WritingArea<'a> {
    pub fn new(
        task: &'a WritingTask,
        task_no: usize,
        text: &'a str,
        cursor: usize,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            task,
            task_no,
            text,
            cursor,
            focused,
            theme,
        }
    }
}

impl Widget for WritingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let words = count_words(self.text);

        let count_color = if words >= self.task.min_words {
            colors.success()
        } else {
            colors.warning()
        };
        let border_color = if self.focused {
            colors.border_focused()
        } else {
            colors.border()
        };

        let block = Block::bordered()
            .title(format!(
                " Task {} \u{2014} {words}/{} words ",
                self.task_no, self.task.min_words
            ))
            .title_style(Style::default().fg(count_color))
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            self.task.prompt.clone(),
            Style::default().fg(colors.text_dim()),
        ))];
        if let Some(image_url) = &self.task.image_url {
            lines.push(Line::from(Span::styled(
                format!("(figure: {image_url})"),
                Style::default().fg(colors.accent_dim()),
            )));
        }
        lines.push(Line::from(""));

        lines.extend(text_with_cursor(
            self.text,
            self.focused.then_some(self.cursor),
            self.theme,
        ));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

/// Split the answer into lines, marking the cursor position with a reversed
/// cell when the editor has focus.
fn text_with_cursor(text: &str, cursor: Option<usize>, theme: &Theme) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    let body_style = Style::default().fg(colors.fg());
    let cursor_style = Style::default()
        .fg(colors.bg())
        .bg(colors.fg())
        .add_modifier(Modifier::SLOW_BLINK);

    let Some(cursor) = cursor else {
        return text
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), body_style)))
            .collect();
    };

    let mut lines = Vec::new();
    let mut consumed = 0usize;
    for raw_line in text.split('\n') {
        let line_chars = raw_line.chars().count();
        // Cursor may sit past the last char of the line it belongs to.
        if (consumed..=consumed + line_chars).contains(&cursor) {
            let col = cursor - consumed;
            let before: String = raw_line.chars().take(col).collect();
            let at: String = raw_line
                .chars()
                .nth(col)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after: String = raw_line.chars().skip(col + 1).collect();
            lines.push(Line::from(vec![
                Span::styled(before, body_style),
                Span::styled(at, cursor_style),
                Span::styled(after, body_style),
            ]));
        } else {
            lines.push(Line::from(Span::styled(raw_line.to_string(), body_style)));
        }
        consumed += line_chars + 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace() {
        let mut text = String::new();
        let mut cursor = 0;
        for ch in "essay".chars() {
            insert_char(&mut text, &mut cursor, ch);
        }
        assert_eq!(text, "essay");
        assert_eq!(cursor, 5);

        backspace(&mut text, &mut cursor);
        assert_eq!(text, "essa");
    }

    #[test]
    fn test_insert_mid_text() {
        let mut text = "ho".to_string();
        let mut cursor = 1;
        insert_char(&mut text, &mut cursor, 'w');
        assert_eq!(text, "hwo");
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_newlines_are_plain_chars() {
        let mut text = "ab".to_string();
        let mut cursor = 2;
        insert_char(&mut text, &mut cursor, '\n');
        insert_char(&mut text, &mut cursor, 'c');
        assert_eq!(text, "ab\nc");
    }

    #[test]
    fn test_cursor_motion_clamps() {
        let text = "ab".to_string();
        let mut cursor = 0;
        move_left(&text, &mut cursor);
        assert_eq!(cursor, 0);
        move_right(&text, &mut cursor);
        move_right(&text, &mut cursor);
        move_right(&text, &mut cursor);
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_text_with_cursor_spans_lines() {
        let theme = Theme {
            name: "test".to_string(),
            colors: Default::default(),
        };
        let lines = text_with_cursor("ab\ncd", Some(3), &theme);
        assert_eq!(lines.len(), 2);
        // Cursor on 'c': second line has three spans (before, at, after).
        assert_eq!(lines[1].spans.len(), 3);
        assert_eq!(lines[1].spans[1].content.as_ref(), "c");
    }
}
