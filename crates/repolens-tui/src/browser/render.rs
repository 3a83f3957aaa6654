use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, ScrollbarOrientation, Tabs};
use repolens_app::{SessionState, SlotKind};
use repolens_core::analysis::{AnalysisKind, MindMapNode, QualityFinding};
use tui_tree_widget::{Scrollbar as TreeScrollbar, Tree};

use super::lines::segments;
use super::tree_view::tree_items;
use super::{BrowserScreen, Focus, Overlay};
use crate::theme;
use crate::ui::loading::LoadingState;
use crate::ui::modal::{ModalSpec, render_error_modal, render_modal, render_notice_modal};
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, label_value_line,
    secondary_line, text_from_message, wrapped_paragraph,
};

impl BrowserScreen {
    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = self.key_hint(area.width);
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(footer_height),
            ])
            .areas(area);
        let [tree_area, right] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
            .areas(body);
        let [content_area, analysis_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .areas(right);

        self.render_url(frame, header);
        self.render_tree(frame, tree_area);
        self.render_content(frame, content_area);
        self.render_analysis(frame, analysis_area);
        frame.render_widget(key_hint_paragraph(key_text).block(theme::key_block()), footer);

        self.render_overlay(frame);
    }

    fn pane(&self, focus: Focus, title: Line<'static>) -> Block<'static> {
        if self.focus == focus {
            theme::chrome(title).border_style(theme::focused_border())
        } else {
            theme::chrome(title)
        }
    }

    fn title(&self, focus: Focus, label: String) -> Line<'static> {
        if self.focus == focus {
            focus_line(label)
        } else {
            Line::from(label)
        }
    }

    fn with_spinner(&self, label: &str, slot: SlotKind) -> String {
        if self.session.is_loading(slot) {
            format!("{label} {}", self.loading.current_frame())
        } else {
            label.to_string()
        }
    }

    fn render_url(&self, frame: &mut Frame<'_>, area: Rect) {
        let label = match self.session.state().repo() {
            Some(repo) => format!("Repository URL ({repo})"),
            None => "Repository URL".to_string(),
        };
        let title = self.title(Focus::Url, self.with_spinner(&label, SlotKind::RepoTree));
        let width = area.width.saturating_sub(2) as usize;
        let scroll = self.url.visual_scroll(width);
        let input = Paragraph::new(self.url.value())
            .scroll((0, scroll as u16))
            .block(self.pane(Focus::Url, title));
        frame.render_widget(input, area);

        if self.focus == Focus::Url && self.overlay.is_none() && width > 0 {
            let visual = self.url.visual_cursor();
            let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
            frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
        }
    }

    fn render_tree(&self, frame: &mut Frame<'_>, area: Rect) {
        let state = self.session.state();
        let title = self.title(Focus::Tree, self.with_spinner("Files", SlotKind::RepoTree));
        let block = self.pane(Focus::Tree, title);

        let Some(tree) = state.tree().filter(|_| !self.tree_view.is_empty()) else {
            let message = if self.session.is_loading(SlotKind::RepoTree) {
                self.loading.label("Loading repository")
            } else if state.repo().is_some() {
                "This repository has no files.".to_string()
            } else {
                "Enter a GitHub repository URL above.".to_string()
            };
            frame.render_widget(wrapped_paragraph(message).block(block), area);
            return;
        };

        let items = match tree_items(tree) {
            Ok(items) => items,
            Err(error) => {
                frame.render_widget(wrapped_paragraph(error.to_string()).block(block), area);
                return;
            }
        };
        let widget = match Tree::new(&items) {
            Ok(widget) => widget,
            Err(error) => {
                frame.render_widget(wrapped_paragraph(error.to_string()).block(block), area);
                return;
            }
        };
        let widget = widget
            .block(block)
            .experimental_scrollbar(Some(
                TreeScrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(None)
                    .end_symbol(None),
            ))
            .highlight_style(theme::row_highlight(Color::Blue))
            .highlight_symbol(">> ");
        let mut tree_state = self.tree_view.tree_state();
        frame.render_stateful_widget(widget, area, &mut tree_state);
    }

    fn render_content(&self, frame: &mut Frame<'_>, area: Rect) {
        let state = self.session.state();
        let label = match (state.selected(), state.content()) {
            (Some(entry), Some(content)) if content.is_modified() => {
                format!("{} (edited)", entry.path)
            }
            (Some(entry), _) => entry.path.clone(),
            (None, _) => "File".to_string(),
        };
        let title = self.title(
            Focus::Content,
            self.with_spinner(&label, SlotKind::FileContent),
        );
        let block = self.pane(Focus::Content, title);

        let Some(content) = state.content() else {
            let message = if self.session.is_loading(SlotKind::FileContent) {
                self.loading.label("Loading file")
            } else if state.tree().is_some() {
                "Select a file in the tree.".to_string()
            } else {
                String::new()
            };
            frame.render_widget(wrapped_paragraph(message).block(block), area);
            return;
        };

        let height = area.height.saturating_sub(2) as usize;
        let offset = scroll_offset(self.content_cursor, height);
        let marked = self.mark.map(|mark| {
            (
                mark.min(self.content_cursor),
                mark.max(self.content_cursor),
            )
        });
        let lines: Vec<Line<'_>> = segments(&content.edited)
            .into_iter()
            .map(|line| line.body)
            .enumerate()
            .skip(offset)
            .take(height.max(1))
            .map(|(index, line)| {
                let style = if index == self.content_cursor && self.focus == Focus::Content {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else if marked.is_some_and(|(start, end)| (start..=end).contains(&index)) {
                    theme::marked_line()
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:>4} ", index + 1), theme::secondary_text()),
                    Span::styled(line.to_string(), style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_analysis(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = self.title(
            Focus::Analysis,
            self.with_spinner("Analysis", SlotKind::Analysis),
        );
        let block = self.pane(Focus::Analysis, title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [tabs_area, body_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .areas(inner);

        let titles: Vec<Line<'_>> = AnalysisKind::ALL
            .iter()
            .enumerate()
            .map(|(index, kind)| Line::from(format!("{} {}", index + 1, kind.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.tab)
            .highlight_style(theme::row_highlight(Color::Cyan));
        frame.render_widget(tabs, tabs_area);

        let text = analysis_text(self.current_kind(), self.session.state(), &self.loading);
        frame.render_widget(
            wrapped_paragraph(text).scroll((self.analysis_scroll, 0)),
            body_area,
        );
    }

    fn render_overlay(&self, frame: &mut Frame<'_>) {
        match &self.overlay {
            Some(Overlay::Question(input)) => {
                let body_area = render_modal(
                    frame,
                    ModalSpec {
                        title: "Ask about this file",
                        title_style: theme::focus_prompt(),
                        body: Text::from(vec![
                            secondary_line("Leave empty for a general explanation."),
                            Line::from(""),
                            Line::from(input.value().to_string()),
                        ]),
                        key_hint: "Enter: ask    Esc: cancel",
                        width_pct: 72,
                        height_pct: 30,
                    },
                );
                let width = body_area.width.saturating_sub(2) as usize;
                if width > 0 {
                    let relative = input.visual_cursor().min(width.saturating_sub(1));
                    frame.set_cursor_position((
                        body_area.x + 1 + relative as u16,
                        body_area.y + 3,
                    ));
                }
            }
            Some(Overlay::EditLine(input)) => {
                let title = format!("Edit line {}", self.content_cursor + 1);
                let body_area = render_modal(
                    frame,
                    ModalSpec {
                        title: &title,
                        title_style: theme::focus_prompt(),
                        body: Text::from(vec![
                            secondary_line("Changes stay local until saved with s."),
                            Line::from(""),
                            Line::from(input.value().to_string()),
                        ]),
                        key_hint: "Enter: apply    Esc: cancel",
                        width_pct: 72,
                        height_pct: 30,
                    },
                );
                let width = body_area.width.saturating_sub(2) as usize;
                if width > 0 {
                    let relative = input.visual_cursor().min(width.saturating_sub(1));
                    frame.set_cursor_position((
                        body_area.x + 1 + relative as u16,
                        body_area.y + 3,
                    ));
                }
            }
            Some(Overlay::Snippet) => {
                if let Some(snippet) = self.session.state().snippet() {
                    let mut lines = vec![focus_line("Snippet")];
                    lines.extend(text_from_message(&snippet.snippet).lines);
                    lines.push(Line::from(""));
                    lines.push(focus_line("Explanation"));
                    lines.extend(text_from_message(&snippet.explanation).lines);
                    render_notice_modal(
                        frame,
                        "Snippet explanation",
                        Text::from(lines),
                        "Enter/Esc: close",
                    );
                }
            }
            Some(Overlay::Notice(message)) => {
                render_notice_modal(frame, "Saved", text_from_message(message), "Enter/Esc: close");
            }
            None => {
                if let Some((scope, error)) = self.active_error() {
                    let title = format!("{} error", capitalize(scope.label()));
                    render_error_modal(frame, &title, &error.to_string(), "Enter/Esc: dismiss");
                }
            }
        }
    }

    fn key_hint(&self, width: u16) -> &'static str {
        match self.focus {
            Focus::Url => compact_hint(
                width,
                "Enter: load repository    Tab/Shift-Tab: switch pane    Esc: go to files    Ctrl-C: quit",
                "Enter: load    Tab: switch pane    Esc: files    Ctrl-C: quit",
                "Enter load | Tab pane | Ctrl-C quit",
            ),
            Focus::Tree => compact_hint(
                width,
                "Enter: open    Up/Down or j/k: move    Left/Right or h/l: fold    Tab: switch pane    s: save    q: quit",
                "Enter: open    j/k: move    h/l: fold    Tab: pane    q: quit",
                "Enter open | j/k move | q quit",
            ),
            Focus::Content => compact_hint(
                width,
                "Up/Down or j/k: move    e: edit line    v: mark range    x: explain lines    s: save file    Esc: cancel requests    q: quit",
                "j/k: move    e: edit    v: mark    x: explain    s: save    q: quit",
                "v mark | x explain | s save | q quit",
            ),
            Focus::Analysis => compact_hint(
                width,
                "1-5 or h/l: switch tab    g: generate    ?: ask a question    j/k: scroll    s: save file    q: quit",
                "1-5/h/l: tab    g: generate    ?: ask    q: quit",
                "g generate | ? ask | q quit",
            ),
        }
    }
}

/// First visible line so that `cursor` stays inside a window of `height` lines.
fn scroll_offset(cursor: usize, height: usize) -> usize {
    if height == 0 || cursor < height {
        0
    } else {
        cursor + 1 - height
    }
}

fn capitalize(word: &str) -> String {
    let mut characters = word.chars();
    match characters.next() {
        Some(first) => first.to_uppercase().chain(characters).collect(),
        None => String::new(),
    }
}

/// Body of one analysis tab for the current session state.
pub(crate) fn analysis_text(
    kind: AnalysisKind,
    state: &SessionState,
    loading: &LoadingState,
) -> Text<'static> {
    if state.pending_analysis() == Some(kind) {
        return Text::from(loading.label(&format!("Generating {}", kind.title().to_lowercase())));
    }
    if state.content().is_none() {
        return Text::from(secondary_line("Open a file to analyse it."));
    }

    let results = state.analysis();
    let text = match kind {
        AnalysisKind::Explanation => results.explanation.as_deref().map(text_from_message),
        AnalysisKind::MindMap => results.mind_map.as_ref().map(mind_map_text),
        AnalysisKind::Quality => results.quality.as_deref().map(quality_text),
        AnalysisKind::Tests => results.test_code.as_deref().map(text_from_message),
        AnalysisKind::Comment => state
            .content()
            .filter(|content| content.is_modified())
            .map(|_| {
                Text::from(vec![
                    Line::from("The file text now carries generated comments."),
                    secondary_line("Press s to save it."),
                ])
            }),
    };

    text.unwrap_or_else(|| Text::from(secondary_line("Press g to generate.")))
}

fn mind_map_text(root: &MindMapNode) -> Text<'static> {
    let mut lines = Vec::new();
    push_mind_map(root, 0, &mut lines);
    Text::from(lines)
}

fn push_mind_map(node: &MindMapNode, depth: usize, lines: &mut Vec<Line<'static>>) {
    let mut spans = vec![Span::raw(format!("{}- {}", "  ".repeat(depth), node.name))];
    if !node.kind.is_empty() {
        spans.push(Span::styled(format!(" ({})", node.kind), theme::secondary_text()));
    }
    lines.push(Line::from(spans));
    for child in &node.children {
        push_mind_map(child, depth + 1, lines);
    }
}

fn quality_text(findings: &[QualityFinding]) -> Text<'static> {
    if findings.is_empty() {
        return Text::from("No issues found.");
    }
    let mut lines = Vec::new();
    for finding in findings {
        lines.push(Line::from(vec![
            Span::styled(format!("Line {}: ", finding.line), theme::focus_prompt()),
            Span::raw(finding.issue.clone()),
        ]));
        lines.push(label_value_line("  Suggestion", finding.suggestion.clone()));
    }
    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::{capitalize, scroll_offset};

    #[test]
    fn scroll_keeps_cursor_on_last_visible_line() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(25, 10), 16);
        assert_eq!(scroll_offset(5, 0), 0);
    }

    #[test]
    fn capitalize_upper_cases_first_letter() {
        assert_eq!(capitalize("repository"), "Repository");
        assert_eq!(capitalize(""), "");
    }
}
