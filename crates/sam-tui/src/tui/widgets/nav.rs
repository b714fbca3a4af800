// Navigation bar: one entry per page, the active one highlighted.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::Page;

/// Function key that navigates to `page`.
pub fn hotkey(page: Page) -> &'static str {
    match page {
        Page::Create => "F1",
        Page::Chat => "F2",
    }
}

pub fn render(frame: &mut Frame, area: Rect, active: Option<Page>) {
    let mut spans = vec![Span::raw(" ")];
    for (i, page) in Page::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let style = if active == Some(page) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(
            format!(" {} {} ", hotkey(page), page.label()),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn render_lists_both_pages() {
        let backend = TestBackend::new(40, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), Some(Page::Chat)))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..buffer.area.width)
            .map(|x| buffer[(x, 0)].symbol().to_string())
            .collect();
        assert!(row.contains("F1 Create"));
        assert!(row.contains("F2 Chat"));
    }

    #[test]
    fn active_page_is_highlighted() {
        let backend = TestBackend::new(40, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), Some(Page::Create)))
            .unwrap();

        let buffer = terminal.backend().buffer();
        // " " then " F1 Create ": the label starts at column 2.
        assert_eq!(buffer[(2, 0)].bg, Color::Cyan);
    }

    #[test]
    fn render_without_page_does_not_panic() {
        let backend = TestBackend::new(10, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), None)).unwrap();
    }
}
