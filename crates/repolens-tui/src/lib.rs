mod browser;
mod keymap;
mod terminal;
mod theme;
mod ui;

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use repolens_app::App;
use tokio::runtime::Handle;
use tracing::info;

use crate::browser::BrowserScreen;
use crate::terminal::TerminalSession;
use crate::ui::modal::render_error_modal;

const TICK_RATE: Duration = Duration::from_millis(120);

/// Runs the interactive browser until the user quits.
///
/// Requests run on `runtime` while this thread draws and reads keys; finished
/// requests are applied on every tick.
pub fn run_browser(app: &App, runtime: Handle, initial_url: Option<String>) -> Result<()> {
    let session = app.session(runtime)?;
    let download_dir = std::env::current_dir().context("failed to resolve current directory")?;
    let mut screen = BrowserScreen::new(session, download_dir);
    if let Some(url) = initial_url.as_deref() {
        screen.open_url(url);
    }

    let mut terminal = TerminalSession::enter()?;
    let mut global_error: Option<String> = None;
    info!("browser started");

    loop {
        terminal.draw(|frame| {
            screen.render(frame);
            if let Some(message) = global_error.as_deref() {
                render_error_modal(frame, "Error", message, "Enter/Esc: continue");
            }
        })?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            screen.on_tick();
            continue;
        }

        let key = match event::read().context("failed to read terminal event")? {
            Event::Resize(_, _) => {
                terminal.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if keymap::is_ctrl_c(key) {
            break;
        }

        if global_error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                global_error = None;
            }
            continue;
        }

        match screen.on_key(key) {
            Ok(true) => break,
            Ok(false) => {}
            Err(error) => global_error = Some(format!("{error:#}")),
        }
        screen.on_tick();
    }

    info!("browser closed");
    Ok(())
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
