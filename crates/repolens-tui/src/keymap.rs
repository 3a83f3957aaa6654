use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k'))
}

pub(crate) fn is_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j'))
}

pub(crate) fn is_left(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Left | KeyCode::Char('h'))
}

pub(crate) fn is_right(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Right | KeyCode::Char('l'))
}

pub(crate) fn is_next_focus(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Tab)
}

pub(crate) fn is_prev_focus(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::BackTab)
}

pub(crate) fn is_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Tab index selected by the digit keys `1` to `5`.
pub(crate) fn tab_digit(key: KeyEvent) -> Option<usize> {
    match key.code {
        KeyCode::Char(digit @ '1'..='5') => Some(digit as usize - '1' as usize),
        _ => None,
    }
}
