use std::io::{Stdout, stdout};

use anyhow::{Context, Result, anyhow};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Raw-mode alternate screen, restored on drop.
pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let terminal = enter_with_ops(
            || enable_raw_mode().context("failed to enable raw mode"),
            || {
                let mut out = stdout();
                execute!(out, EnterAlternateScreen, Hide)
                    .context("failed to enter alternate screen")
            },
            || {
                let backend = CrosstermBackend::new(stdout());
                Terminal::new(backend).context("failed to create terminal backend")
            },
            || {
                let mut out = stdout();
                execute!(out, Show, LeaveAlternateScreen)
                    .context("failed to restore terminal screen during rollback")
            },
            || disable_raw_mode().context("failed to disable raw mode during rollback"),
        )?;
        Ok(Self { terminal })
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Runs the setup steps in order and undoes the completed ones when a later
/// step fails. Cleanup failures are appended to the setup error.
fn enter_with_ops<T, EnableRawMode, EnterAltScreen, CreateTerminal, LeaveAltScreen, DisableRawMode>(
    mut enable_raw_mode_op: EnableRawMode,
    mut enter_alt_screen_op: EnterAltScreen,
    mut create_terminal_op: CreateTerminal,
    mut leave_alt_screen_op: LeaveAltScreen,
    mut disable_raw_mode_op: DisableRawMode,
) -> Result<T>
where
    EnableRawMode: FnMut() -> Result<()>,
    EnterAltScreen: FnMut() -> Result<()>,
    CreateTerminal: FnMut() -> Result<T>,
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    enable_raw_mode_op()?;

    if let Err(error) = enter_alt_screen_op() {
        let cleanup = [disable_raw_mode_op()];
        return Err(with_cleanup_failures(error, cleanup));
    }

    create_terminal_op().map_err(|error| {
        let cleanup = [leave_alt_screen_op(), disable_raw_mode_op()];
        with_cleanup_failures(error, cleanup)
    })
}

fn with_cleanup_failures<const N: usize>(
    setup_error: anyhow::Error,
    cleanup: [Result<()>; N],
) -> anyhow::Error {
    let failures: Vec<String> = cleanup
        .into_iter()
        .filter_map(Result::err)
        .map(|error| format!("{error:#}"))
        .collect();

    if failures.is_empty() {
        setup_error
    } else {
        anyhow!(
            "{setup_error:#}\nterminal rollback cleanup failed: {}",
            failures.join("\n")
        )
    }
}
