//! The single-screen repository browser: URL bar, file tree, file text and
//! analysis tabs, driven by one [`Session`].

mod lines;
mod render;
mod tree_view;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode, KeyEvent};
use repolens_app::{ErrorScope, Outcome, Session, SessionError, SlotKind, SlotOutcome};
use repolens_core::analysis::AnalysisKind;
use repolens_core::tree::RowKind;
use tracing::{debug, info};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::keymap;
use crate::ui::loading::LoadingState;
use tree_view::TreeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Url,
    Tree,
    Content,
    Analysis,
}

impl Focus {
    const ORDER: [Focus; 4] = [Self::Url, Self::Tree, Self::Content, Self::Analysis];

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Modal drawn over the panes; it takes every key until closed.
#[derive(Debug)]
pub(crate) enum Overlay {
    Question(Input),
    EditLine(Input),
    Snippet,
    Notice(String),
}

pub(crate) struct BrowserScreen {
    session: Session,
    download_dir: PathBuf,
    url: Input,
    focus: Focus,
    tree_view: TreeView,
    content_cursor: usize,
    mark: Option<usize>,
    tab: usize,
    analysis_scroll: u16,
    overlay: Option<Overlay>,
    loading: LoadingState,
}

impl BrowserScreen {
    pub(crate) fn new(session: Session, download_dir: PathBuf) -> Self {
        Self {
            session,
            download_dir,
            url: Input::default(),
            focus: Focus::Url,
            tree_view: TreeView::default(),
            content_cursor: 0,
            mark: None,
            tab: 0,
            analysis_scroll: 0,
            overlay: None,
            loading: LoadingState::default(),
        }
    }

    pub(crate) fn open_url(&mut self, url: &str) {
        self.url = Input::new(url.to_string());
        self.submit_url();
    }

    fn submit_url(&mut self) {
        let url = self.url.value().trim().to_string();
        self.tree_view = TreeView::default();
        self.reset_content_cursor();
        if note_rejection(self.session.load_repo(&url)) {
            self.focus = Focus::Tree;
        }
    }

    fn reset_content_cursor(&mut self) {
        self.content_cursor = 0;
        self.mark = None;
    }

    fn current_kind(&self) -> AnalysisKind {
        AnalysisKind::ALL[self.tab % AnalysisKind::ALL.len()]
    }

    fn select_tab(&mut self, index: usize) {
        self.tab = index % AnalysisKind::ALL.len();
        self.analysis_scroll = 0;
    }

    /// Applies finished requests and advances the spinner.
    pub(crate) fn on_tick(&mut self) {
        for outcome in self.session.drain() {
            self.apply_outcome(outcome);
        }
        if self.session.any_loading() {
            self.loading.next_frame();
        }
    }

    fn apply_outcome(&mut self, outcome: SlotOutcome) {
        if !matches!(outcome.outcome, Outcome::Applied) {
            return;
        }
        match outcome.slot {
            SlotKind::RepoTree => {
                if let Some(tree) = self.session.state().tree() {
                    self.tree_view = TreeView::new(tree);
                }
            }
            SlotKind::FileContent => {
                self.reset_content_cursor();
                if let Some(entry) = self.session.state().selected() {
                    let path = entry.path.clone();
                    self.tree_view.reveal(&path);
                }
            }
            SlotKind::Analysis => self.analysis_scroll = 0,
            SlotKind::Snippet => {
                if self.overlay.is_none() {
                    self.overlay = Some(Overlay::Snippet);
                }
            }
        }
    }

    fn active_error(&self) -> Option<(ErrorScope, &SessionError)> {
        self.session.state().errors().next()
    }

    /// Handles one key press. Returns true when the user asked to quit.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some(overlay) = self.overlay.take() {
            self.overlay = self.on_overlay_key(overlay, key);
            return Ok(false);
        }

        let error_scope = self.active_error().map(|(scope, _)| scope);
        if let Some(scope) = error_scope {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.session.dismiss_error(scope);
            }
            return Ok(false);
        }

        if keymap::is_next_focus(key) {
            self.focus = self.focus.next();
            return Ok(false);
        }
        if keymap::is_prev_focus(key) {
            self.focus = self.focus.prev();
            return Ok(false);
        }

        if self.focus == Focus::Url {
            self.on_url_key(key);
            return Ok(false);
        }

        if keymap::is_quit(key) {
            return Ok(true);
        }
        if keymap::is_back(key) {
            self.session.cancel_all();
            return Ok(false);
        }
        if key.code == KeyCode::Char('s') {
            self.save_download()?;
            return Ok(false);
        }

        match self.focus {
            Focus::Url => {}
            Focus::Tree => self.on_tree_key(key),
            Focus::Content => self.on_content_key(key),
            Focus::Analysis => self.on_analysis_key(key),
        }
        Ok(false)
    }

    fn on_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) -> Option<Overlay> {
        match overlay {
            Overlay::Question(mut input) => {
                if keymap::is_back(key) {
                    return None;
                }
                if keymap::is_confirm(key) {
                    self.select_tab(0);
                    note_rejection(
                        self.session
                            .request_analysis(AnalysisKind::Explanation, Some(input.value())),
                    );
                    return None;
                }
                input.handle_event(&Event::Key(key));
                Some(Overlay::Question(input))
            }
            Overlay::EditLine(mut input) => {
                if keymap::is_back(key) {
                    return None;
                }
                if keymap::is_confirm(key) {
                    self.replace_cursor_line(input.value());
                    return None;
                }
                input.handle_event(&Event::Key(key));
                Some(Overlay::EditLine(input))
            }
            overlay @ (Overlay::Snippet | Overlay::Notice(_)) => {
                if keymap::is_confirm(key) || keymap::is_back(key) {
                    None
                } else {
                    Some(overlay)
                }
            }
        }
    }

    fn on_url_key(&mut self, key: KeyEvent) {
        if keymap::is_confirm(key) {
            self.submit_url();
        } else if keymap::is_back(key) {
            self.focus = Focus::Tree;
        } else {
            self.url.handle_event(&Event::Key(key));
        }
    }

    fn on_tree_key(&mut self, key: KeyEvent) {
        if keymap::is_up(key) {
            self.tree_view.move_up();
        } else if keymap::is_down(key) {
            self.tree_view.move_down();
        } else if keymap::is_right(key) {
            self.tree_view.expand_current();
        } else if keymap::is_left(key) {
            self.tree_view.collapse_or_parent();
        } else if key.code == KeyCode::Char(' ') {
            self.tree_view.toggle_current();
        } else if keymap::is_confirm(key) {
            self.open_current_row();
        }
    }

    fn open_current_row(&mut self) {
        let Some(row) = self.tree_view.current() else {
            return;
        };
        if row.kind == RowKind::Folder {
            self.tree_view.toggle_current();
            return;
        }

        let path = row.path.clone();
        match self.session.select_path(&path) {
            Ok(true) => {
                self.reset_content_cursor();
                self.focus = Focus::Content;
            }
            Ok(false) => self.focus = Focus::Content,
            Err(error) => debug!(%error, "file selection rejected"),
        }
    }

    fn content_line_count(&self) -> usize {
        self.session
            .state()
            .content()
            .map(|content| lines::segments(&content.edited).len())
            .unwrap_or(0)
    }

    fn on_content_key(&mut self, key: KeyEvent) {
        if keymap::is_up(key) {
            self.content_cursor = self.content_cursor.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.content_cursor + 1 < self.content_line_count() {
                self.content_cursor += 1;
            }
        } else if key.code == KeyCode::Char('v') {
            self.mark = match self.mark {
                Some(_) => None,
                None => Some(self.content_cursor),
            };
        } else if key.code == KeyCode::Char('e')
            && let Some(line) = self.cursor_line()
        {
            self.overlay = Some(Overlay::EditLine(Input::new(line)));
        } else if key.code == KeyCode::Char('x')
            && let Some(snippet) = self.selected_snippet()
        {
            note_rejection(self.session.explain_snippet(&snippet));
            self.mark = None;
        }
    }

    fn cursor_line(&self) -> Option<String> {
        let content = self.session.state().content()?;
        lines::segments(&content.edited)
            .get(self.content_cursor)
            .map(|line| line.body.to_string())
    }

    /// Swaps the body of the cursor line; every line ending stays as it was.
    fn replace_cursor_line(&mut self, replacement: &str) {
        let Some(edited) = self
            .session
            .state()
            .content()
            .and_then(|content| {
                lines::replace_line(&content.edited, self.content_cursor, replacement)
            })
        else {
            return;
        };
        note_rejection(self.session.edit_content(edited));
    }

    /// Lines between the mark and the cursor, or the cursor line alone.
    fn selected_snippet(&self) -> Option<String> {
        let content = self.session.state().content()?;
        let (start, end) = match self.mark {
            Some(mark) => (mark.min(self.content_cursor), mark.max(self.content_cursor)),
            None => (self.content_cursor, self.content_cursor),
        };
        let picked: Vec<&str> = lines::segments(&content.edited)
            .into_iter()
            .skip(start)
            .take(end - start + 1)
            .map(|line| line.body)
            .collect();
        if picked.is_empty() {
            None
        } else {
            Some(picked.join("\n"))
        }
    }

    fn on_analysis_key(&mut self, key: KeyEvent) {
        if let Some(index) = keymap::tab_digit(key) {
            self.select_tab(index);
        } else if keymap::is_left(key) {
            self.select_tab(self.tab + AnalysisKind::ALL.len() - 1);
        } else if keymap::is_right(key) {
            self.select_tab(self.tab + 1);
        } else if keymap::is_up(key) {
            self.analysis_scroll = self.analysis_scroll.saturating_sub(1);
        } else if keymap::is_down(key) {
            self.analysis_scroll = self.analysis_scroll.saturating_add(1);
        } else if key.code == KeyCode::Char('g') {
            note_rejection(self.session.request_analysis(self.current_kind(), None));
        } else if key.code == KeyCode::Char('?') {
            self.overlay = Some(Overlay::Question(Input::default()));
        }
    }

    fn save_download(&mut self) -> Result<()> {
        let Some(download) = self.session.download() else {
            return Ok(());
        };
        let target = self.download_dir.join(&download.file_name);
        fs::write(&target, &download.contents)
            .with_context(|| format!("failed to save {}", target.display()))?;
        info!(path = %target.display(), "saved file text");
        self.overlay = Some(Overlay::Notice(format!("Saved {}", target.display())));
        Ok(())
    }
}

/// Rejected actions are already recorded in the session state and shown from
/// there. Returns true when the action was accepted.
fn note_rejection<T>(result: Result<T, SessionError>) -> bool {
    match result {
        Ok(_) => true,
        Err(error) => {
            debug!(%error, "action rejected");
            false
        }
    }
}
