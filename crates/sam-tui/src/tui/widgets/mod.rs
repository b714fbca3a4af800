// TUI widget modules for the shell, each page and the overlays.

pub mod chat;
pub mod confetti;
pub mod header;
pub mod help_bar;
pub mod nav;
pub mod quit_confirm;
pub mod registration;
pub mod toasts;
pub mod upload;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};

/// Bordered block whose border lights up when the area has focus.
pub(crate) fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let (border, title_style) = if focused {
        (
            Style::default().fg(Color::Cyan),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(Color::DarkGray), Style::default())
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {title} "), title_style))
}

/// Text of an input field, with a block cursor when it has focus.
pub(crate) fn with_cursor(value: &str, focused: bool) -> String {
    if focused {
        format!("{value}\u{2588}")
    } else {
        value.to_string()
    }
}
