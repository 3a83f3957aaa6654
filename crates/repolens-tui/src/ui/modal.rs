use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Clear;

use crate::centered_rect;
use crate::theme;
use crate::ui::text::{key_hint_height, key_hint_paragraph, text_from_message, wrapped_paragraph};

pub(crate) struct ModalSpec<'a> {
    pub(crate) title: &'a str,
    pub(crate) title_style: Style,
    pub(crate) body: Text<'a>,
    pub(crate) key_hint: &'a str,
    pub(crate) width_pct: u16,
    pub(crate) height_pct: u16,
}

/// Draws a centred box with its key hints just below it (or above when the
/// screen has no room underneath). Returns the body area.
pub(crate) fn render_modal(frame: &mut Frame<'_>, spec: ModalSpec<'_>) -> Rect {
    let area = centered_rect(spec.width_pct, spec.height_pct, frame.area());
    let title = Line::from(Span::styled(spec.title.to_string(), spec.title_style));
    let footer_height = key_hint_height(area.width, spec.key_hint);

    let (body_area, key_area) = match choose_key_area(frame.area(), area, footer_height) {
        Some(key_area) => (area, key_area),
        None => {
            let [body, keys] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
                .areas(area);
            (body, keys)
        }
    };

    frame.render_widget(Clear, body_area);
    frame.render_widget(
        wrapped_paragraph(spec.body).block(theme::chrome(title)),
        body_area,
    );
    frame.render_widget(Clear, key_area);
    frame.render_widget(
        key_hint_paragraph(spec.key_hint).block(theme::key_block()),
        key_area,
    );

    body_area
}

fn choose_key_area(screen: Rect, body: Rect, footer_height: u16) -> Option<Rect> {
    let screen_bottom = screen.y.saturating_add(screen.height);
    let below_y = body.y.saturating_add(body.height);
    if below_y.saturating_add(footer_height) <= screen_bottom {
        return Some(Rect::new(body.x, below_y, body.width, footer_height));
    }

    let above_y = body.y.saturating_sub(footer_height);
    if above_y >= screen.y && body.y >= footer_height {
        return Some(Rect::new(body.x, above_y, body.width, footer_height));
    }

    None
}

pub(crate) fn render_error_modal(frame: &mut Frame<'_>, title: &str, message: &str, footer: &str) {
    render_modal(
        frame,
        ModalSpec {
            title,
            title_style: theme::error_prompt(),
            body: text_from_message(message),
            key_hint: footer,
            width_pct: 72,
            height_pct: 40,
        },
    );
}

pub(crate) fn render_notice_modal(
    frame: &mut Frame<'_>,
    title: &str,
    body: Text<'_>,
    footer: &str,
) {
    render_modal(
        frame,
        ModalSpec {
            title,
            title_style: theme::success_prompt(),
            body,
            key_hint: footer,
            width_pct: 84,
            height_pct: 70,
        },
    );
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;

    use super::choose_key_area;

    #[test]
    fn key_area_goes_below_body_when_room() {
        let screen = Rect::new(0, 0, 80, 40);
        let body = Rect::new(10, 10, 60, 20);
        assert_eq!(
            choose_key_area(screen, body, 3),
            Some(Rect::new(10, 30, 60, 3))
        );
    }

    #[test]
    fn key_area_goes_above_body_respecting_screen_origin() {
        let screen = Rect::new(10, 20, 80, 20);
        let body = Rect::new(15, 28, 60, 12);
        assert_eq!(
            choose_key_area(screen, body, 4),
            Some(Rect::new(15, 24, 60, 4))
        );
    }

    #[test]
    fn key_area_is_none_when_body_fills_screen() {
        let screen = Rect::new(10, 20, 80, 10);
        let body = Rect::new(15, 22, 60, 8);
        assert_eq!(choose_key_area(screen, body, 3), None);
    }
}
