use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::exam::model::{
    ContentItem, GroupKind, ListeningFormat, ListeningSection, QuestionGroup, ReadingPassage,
    ReadingQuestion,
};
use crate::exam::{QuestionId, Stage};
use crate::session::answers::AnswerStore;
use crate::ui::theme::Theme;

/// Lines for one section/passage plus, per question number, the line it
/// starts on (used to keep the selected question scrolled into view).
pub struct RenderedQuestions {
    pub lines: Vec<Line<'static>>,
    pub anchors: Vec<(u16, usize)>,
}

impl RenderedQuestions {
    fn push_anchor(&mut self, number: u16) {
        self.anchors.push((number, self.lines.len()));
    }

    pub fn anchor_line(&self, number: u16) -> Option<usize> {
        self.anchors
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, line)| *line)
    }
}

/// Show a saved answer inside its blank, or the empty slot.
fn answer_slot(saved: Option<&str>) -> String {
    match saved {
        Some(v) if !v.trim().is_empty() => format!("[{v}]"),
        _ => "[______]".to_string(),
    }
}

/// Substitute the first authored blank (`...`, `___`, `…`) with the slot.
fn fill_blank(text: &str, slot: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '.' || ch == '_' || ch == '…' {
            let mut j = i;
            while j < chars.len() && chars[j] == ch {
                j += 1;
            }
            let run = j - i;
            if (ch == '…' && run >= 1) || run >= 3 {
                let before: String = chars[..i].iter().collect();
                let after: String = chars[j..].iter().collect();
                return format!("{before}{slot}{after}");
            }
            i = j;
        } else {
            i += 1;
        }
    }
    format!("{text} {slot}")
}

/// Substitute every `___qN___` slot in a table cell with `N: [answer]`.
fn fill_table_cell(cell: &str, stage: Stage, answers: &AnswerStore) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut rest = cell;
    while let Some(start) = rest.find("___q") {
        let tail = &rest[start + 4..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        let after = &tail[digits.len()..];
        if !digits.is_empty() && after.starts_with("___") {
            out.push_str(&rest[..start]);
            let number: u16 = digits.parse().unwrap_or(0);
            let saved = answers.get(QuestionId { stage, number });
            out.push_str(&format!("{number}: {}", answer_slot(saved)));
            rest = &after[3..];
        } else {
            out.push_str(&rest[..start + 4]);
            rest = &rest[start + 4..];
        }
    }
    out.push_str(rest);
    out
}

struct LineBuilder<'a> {
    out: RenderedQuestions,
    answers: &'a AnswerStore,
    stage: Stage,
    current: u16,
    theme: &'a Theme,
}

impl<'a> LineBuilder<'a> {
    fn new(answers: &'a AnswerStore, stage: Stage, current: u16, theme: &'a Theme) -> Self {
        Self {
            out: RenderedQuestions {
                lines: Vec::new(),
                anchors: Vec::new(),
            },
            answers,
            stage,
            current,
            theme,
        }
    }

    fn saved(&self, number: u16) -> Option<&str> {
        self.answers.get(QuestionId {
            stage: self.stage,
            number,
        })
    }

    fn number_style(&self, number: u16) -> Style {
        let colors = &self.theme.colors;
        if number == self.current {
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else if self.answers.is_answered(QuestionId {
            stage: self.stage,
            number,
        }) {
            Style::default().fg(colors.success())
        } else {
            Style::default().fg(colors.fg())
        }
    }

    fn blank(&mut self) {
        self.out.lines.push(Line::from(""));
    }

    fn dim(&mut self, text: impl Into<String>) {
        let style = Style::default().fg(self.theme.colors.text_dim());
        self.out.lines.push(Line::from(Span::styled(text.into(), style)));
    }

    fn heading(&mut self, text: impl Into<String>) {
        let style = Style::default()
            .fg(self.theme.colors.accent())
            .add_modifier(Modifier::BOLD);
        self.out.lines.push(Line::from(Span::styled(text.into(), style)));
    }

    fn plain(&mut self, text: impl Into<String>) {
        let style = Style::default().fg(self.theme.colors.fg());
        self.out.lines.push(Line::from(Span::styled(text.into(), style)));
    }

    fn numbered(&mut self, number: u16, body: String) {
        self.out.push_anchor(number);
        let style = self.number_style(number);
        let marker = if number == self.current { "\u{25b8} " } else { "  " };
        self.out.lines.push(Line::from(vec![
            Span::styled(format!("{marker}{number}. "), style),
            Span::styled(body, Style::default().fg(self.theme.colors.fg())),
        ]));
    }

    fn option_row(&mut self, selected: bool, label: &str, text: &str, multi: bool) {
        let colors = &self.theme.colors;
        let mark = match (multi, selected) {
            (true, true) => "[x]",
            (true, false) => "[ ]",
            (false, true) => "(\u{2022})",
            (false, false) => "( )",
        };
        let style = if selected {
            Style::default().fg(colors.success())
        } else {
            Style::default().fg(colors.text_dim())
        };
        let body = if text.is_empty() {
            label.to_string()
        } else {
            format!("{label}. {text}")
        };
        self.out.lines.push(Line::from(Span::styled(
            format!("      {mark} {body}"),
            style,
        )));
    }

    fn choice_question(
        &mut self,
        number: u16,
        question: &str,
        options: impl Iterator<Item = (String, String)>,
    ) {
        self.numbered(number, question.to_string());
        let saved = self.saved(number).map(str::to_string);
        for (label, text) in options {
            let selected = saved.as_deref() == Some(label.as_str());
            self.option_row(selected, &label, &text, false);
        }
        self.blank();
    }

    fn group(&mut self, group: &QuestionGroup) {
        let theme = self.theme;
        self.heading(group.instructions.clone());
        if !group.text.is_empty() {
            self.plain(group.text.clone());
        }

        match group.kind {
            GroupKind::MultiSelect => {
                let numbers: Vec<u16> = group.members.iter().map(|m| m.number).collect();
                if let (Some(first), Some(last)) = (numbers.first(), numbers.last()) {
                    self.dim(format!("Questions {first}-{last}"));
                }
                let selected: Vec<String> = numbers
                    .iter()
                    .filter_map(|&n| self.saved(n))
                    .map(str::to_string)
                    .collect();
                let cap = group.cap();
                let count_style = if selected.len() == cap {
                    Style::default().fg(theme.colors.success())
                } else {
                    Style::default().fg(theme.colors.accent())
                };
                self.out.lines.push(Line::from(Span::styled(
                    format!("    Selected: {} / {cap}", selected.len()),
                    count_style,
                )));
                if let Some(&first) = numbers.first() {
                    self.out.push_anchor(first);
                }
                for (label, text) in &group.options {
                    let is_selected = selected.iter().any(|s| s == label);
                    self.option_row(is_selected, label, text, true);
                }
            }
            GroupKind::Matching => {
                for (label, text) in &group.options {
                    self.dim(format!("    {label}  {text}"));
                }
                self.blank();
                for member in &group.members {
                    let body = member.text.clone().unwrap_or_default();
                    let slot = answer_slot(self.saved(member.number));
                    self.numbered(member.number, format!("{body}  {slot}"));
                }
            }
        }
        self.blank();
    }

    fn table(
        &mut self,
        title: &str,
        columns: &[String],
        rows: &[std::collections::BTreeMap<String, String>],
        slot_numbers: &[u16],
    ) {
        if !title.is_empty() {
            self.heading(title.to_string());
        }
        self.dim(columns.join(" | "));
        if let Some(&first) = slot_numbers.first() {
            self.out.push_anchor(first);
        }
        let keys: Vec<String> = columns
            .iter()
            .map(|c| crate::exam::model::column_key(c))
            .collect();
        for row in rows {
            let cells: Vec<String> = keys
                .iter()
                .map(|key| {
                    row.get(key)
                        .map(|cell| fill_table_cell(cell, self.stage, self.answers))
                        .unwrap_or_default()
                })
                .collect();
            self.plain(cells.join(" | "));
        }
        self.blank();
    }
}

/// Build the listening section body. Pure over its inputs: the same
/// section, store, and selection always produce the same lines.
pub fn listening_lines(
    section: &ListeningSection,
    section_index: usize,
    answers: &AnswerStore,
    current: u16,
    theme: &Theme,
) -> RenderedQuestions {
    let mut b = LineBuilder::new(answers, Stage::Listening, current, theme);

    b.heading(format!("Section {}: {}", section_index + 1, section.title));
    if let Some(instructions) = &section.instructions {
        if let Some(heading) = &instructions.heading {
            b.plain(heading.clone());
        }
        if let Some(details) = &instructions.details {
            b.dim(details.clone());
        }
    }
    b.blank();

    for item in &section.content {
        match item {
            ContentItem::Text { value } => {
                b.dim(value.clone());
                b.blank();
            }
            ContentItem::Subheading { value } => {
                b.heading(value.clone());
            }
            ContentItem::Question(q) => match &q.format {
                ListeningFormat::GapFill { text, postfix } => {
                    let slot = answer_slot(b.saved(q.number));
                    let body = if postfix.is_empty() {
                        format!("{text} {slot}")
                    } else {
                        format!("{text} {slot} {postfix}")
                    };
                    b.numbered(q.number, body);
                }
                ListeningFormat::MultipleChoice { text, options } => {
                    b.choice_question(
                        q.number,
                        text,
                        options.iter().map(|(k, v)| (k.clone(), v.clone())),
                    );
                }
            },
            ContentItem::Group(group) => b.group(group),
            ContentItem::Table(table) => {
                b.table(&table.title, &table.columns, &table.rows, &table.slot_numbers());
            }
        }
    }

    b.out
}

/// Build the reading question pane for one passage.
pub fn reading_lines(
    passage: &ReadingPassage,
    answers: &AnswerStore,
    current: u16,
    theme: &Theme,
) -> RenderedQuestions {
    let mut b = LineBuilder::new(answers, Stage::Reading, current, theme);
    let mut last_instruction: Option<&str> = None;
    let mut legend_shown = false;

    for question in &passage.questions {
        match question {
            ReadingQuestion::Note {
                title,
                subheading,
                text,
            } => {
                if let Some(title) = title {
                    b.heading(title.clone());
                }
                if let Some(subheading) = subheading {
                    b.plain(subheading.clone());
                }
                if let Some(text) = text {
                    b.dim(text.clone());
                }
                b.blank();
                legend_shown = false;
            }
            ReadingQuestion::GapFill {
                question, number, ..
            } => {
                let slot = answer_slot(b.saved(*number));
                b.numbered(*number, fill_blank(question, &slot));
                legend_shown = false;
            }
            ReadingQuestion::TrueFalseNotGiven {
                question, number, ..
            } => {
                let choices = ["TRUE", "FALSE", "NOT GIVEN"];
                b.choice_question(
                    *number,
                    question,
                    choices.iter().map(|c| (c.to_string(), String::new())),
                );
                legend_shown = false;
            }
            ReadingQuestion::YesNoNotGiven {
                question, number, ..
            } => {
                let choices = ["YES", "NO", "NOT GIVEN"];
                b.choice_question(
                    *number,
                    question,
                    choices.iter().map(|c| (c.to_string(), String::new())),
                );
                legend_shown = false;
            }
            ReadingQuestion::MultipleChoice {
                question,
                options,
                number,
                ..
            } => {
                b.choice_question(
                    *number,
                    question,
                    options.iter().map(|o| (o.label.clone(), o.text.clone())),
                );
                legend_shown = false;
            }
            ReadingQuestion::Matching {
                question,
                options,
                number,
                group_instruction,
                ..
            } => {
                if let Some(instruction) = group_instruction {
                    if last_instruction != Some(instruction.as_str()) {
                        b.heading(instruction.clone());
                        last_instruction = Some(instruction.as_str());
                        legend_shown = false;
                    }
                }
                // Shared options are listed once per run of matching questions.
                if !legend_shown {
                    for option in options {
                        b.dim(format!("    {}  {}", option.label, option.text));
                    }
                    b.blank();
                    legend_shown = true;
                }
                let slot = answer_slot(b.saved(*number));
                b.numbered(*number, format!("{question}  {slot}"));
            }
            ReadingQuestion::MultiSelect {
                text,
                options,
                answers: correct,
                numbers,
            } => {
                let group = QuestionGroup {
                    kind: GroupKind::MultiSelect,
                    instructions: text.clone(),
                    text: String::new(),
                    options: options.clone(),
                    max_selections: Some(correct.len()),
                    members: numbers
                        .iter()
                        .map(|&number| crate::exam::model::GroupMember {
                            number,
                            text: None,
                            answer: crate::exam::model::AnswerKey::One(String::new()),
                        })
                        .collect(),
                };
                b.group(&group);
                legend_shown = false;
            }
            ReadingQuestion::Table {
                title,
                columns,
                rows,
                slot_numbers,
                ..
            } => {
                b.table(title, columns, rows, slot_numbers);
                legend_shown = false;
            }
        }
    }

    b.out
}

/// Scrollable question pane.
pub struct QuestionList<'a> {
    rendered: RenderedQuestions,
    current: u16,
    theme: &'a Theme,
    title: String,
}

impl<'a> QuestionList<'a> {
    pub fn new(rendered: RenderedQuestions, current: u16, title: &str, theme: &'a Theme) -> Self {
        Self {
            rendered,
            current,
            theme,
            title: title.to_string(),
        }
    }
}

impl Widget for QuestionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        // Keep the selected question roughly a third of the way down.
        let scroll = self
            .rendered
            .anchor_line(self.current)
            .map(|line| line.saturating_sub(inner.height as usize / 3))
            .unwrap_or(0);

        let paragraph = Paragraph::new(self.rendered.lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0));
        paragraph.render(inner, buf);
    }
}
