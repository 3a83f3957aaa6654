use ratatui::layout::Alignment;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::theme;

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn key_hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

/// Footer height (borders included) needed to show `text` without clipping.
pub(crate) fn key_hint_height(total_width: u16, text: &str) -> u16 {
    let content_width = total_width.saturating_sub(2).max(1) as usize;
    let lines = wrapped_line_count(text, content_width);
    lines.saturating_add(2).max(3)
}

pub(crate) fn compact_hint<'a>(
    width: u16,
    full: &'a str,
    medium: &'a str,
    compact: &'a str,
) -> &'a str {
    if width >= 120 {
        full
    } else if width >= 84 {
        medium
    } else {
        compact
    }
}

pub(crate) fn focus_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::focus_prompt()))
}

pub(crate) fn secondary_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::secondary_text()))
}

pub(crate) fn label_value_line(
    label: impl Into<String>,
    value: impl Into<String>,
) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label.into()), theme::secondary_text()),
        Span::raw(value.into()),
    ])
}

/// Owned lines of a multi-line message; an empty message still yields one line.
pub(crate) fn text_from_message(message: &str) -> Text<'static> {
    let base = message.trim_end();
    if base.is_empty() {
        return Text::from(Line::from(""));
    }
    Text::from(
        base.lines()
            .map(|line| Line::from(line.to_string()))
            .collect::<Vec<_>>(),
    )
}

fn wrapped_line_count(text: &str, width: usize) -> u16 {
    text.split('\n')
        .map(|line| wrapped_line_count_single(line, width))
        .fold(0u16, u16::saturating_add)
        .max(1)
}

fn wrapped_line_count_single(line: &str, width: usize) -> u16 {
    let cells: usize = line
        .chars()
        .map(|character| if character == '\t' { 4 } else { 1 })
        .sum();
    if cells == 0 {
        return 1;
    }
    u16::try_from(cells.div_ceil(width.max(1))).unwrap_or(u16::MAX)
}
