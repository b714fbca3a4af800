// Toast overlay: transient notifications stacked in the top-right corner.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use sam_core::notify::Notification;

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// Toasts shown at once; older ones are dropped.
pub const MAX_TOASTS: usize = 3;

const TOAST_WIDTH: u16 = 42;
const TOAST_HEIGHT: u16 = 4;

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

/// Draw `toasts` (newest first) from the top-right corner of `area` downwards.
pub fn render(frame: &mut Frame, area: Rect, toasts: &[Toast]) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width - width;

    for (i, toast) in toasts.iter().enumerate() {
        let y = area.y + i as u16 * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.y + area.height {
            break;
        }
        let rect = Rect::new(x, y, width, TOAST_HEIGHT);
        render_toast(frame, rect, &toast.notification);
    }
}

fn render_toast(frame: &mut Frame, area: Rect, notification: &Notification) {
    let color = if notification.is_error() {
        Color::Red
    } else {
        Color::Green
    };

    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", notification.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let paragraph = Paragraph::new(Line::from(notification.description.clone()))
        .wrap(Wrap { trim: true })
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn toast(title: &str, description: &str) -> Toast {
        Toast {
            notification: Notification::error(title, description),
            shown_at: Instant::now(),
        }
    }

    #[test]
    fn render_stacks_newest_on_top() {
        let toasts = vec![
            toast("Upload failed", "Storage full"),
            toast("File too large", "big.pdf exceeds the 5MB limit."),
        ];
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &toasts))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(0).contains("Upload failed"));
        assert!(row(TOAST_HEIGHT).contains("File too large"));
    }

    #[test]
    fn render_small_area_does_not_panic() {
        let toasts = vec![toast("a", "b"), toast("c", "d"), toast("e", "f")];
        let backend = TestBackend::new(12, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &toasts))
            .unwrap();
    }
}
