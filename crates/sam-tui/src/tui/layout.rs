// Screen layout: shell zones and page sub-layouts.
//
// +--------------------------------------------------+
// | Header: title + subtitle (2 rows + separator)     |
// +--------------------------------------------------+
// | Navigation: Create | Chat (1 row)                 |
// +--------------------------------------------------+
// | Page body (fill)                                  |
// |                                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

/// Resolved screen areas for each shell zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    pub header: Rect,
    pub nav: Rect,
    /// The mounted page renders here.
    pub body: Rect,
    /// Bottom row: keyboard shortcut hints for the focused area.
    pub help_bar: Rect,
}

/// Build the shell layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: header(3) | nav(1) | body(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // navigation
            Constraint::Min(8),    // page body
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        header: vertical[0],
        nav: vertical[1],
        body: vertical[2],
        help_bar: vertical[3],
    }
}

/// Areas of the chat page.
#[derive(Debug, Clone)]
pub struct ChatLayout {
    pub markets: Rect,
    pub transcript: Rect,
    pub questions: Rect,
    pub input: Rect,
}

/// Chat page: market list on the left, conversation on the right with the
/// suggested questions and the message box under the transcript.
pub fn chat_layout(body: Rect, question_rows: u16) -> ChatLayout {
    let horizontal = Layout::horizontal([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(body);

    let questions_height = (question_rows + 2).clamp(3, 8);
    let right = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(questions_height),
        Constraint::Length(3),
    ])
    .split(horizontal[1]);

    ChatLayout {
        markets: horizontal[0],
        transcript: right[0],
        questions: right[1],
        input: right[2],
    }
}

/// Areas of the registration form.
#[derive(Debug, Clone)]
pub struct RegistrationLayout {
    pub name: Rect,
    pub prompt: Rect,
    pub temperature: Rect,
    pub files: Rect,
    pub submit: Rect,
}

pub fn registration_layout(body: Rect) -> RegistrationLayout {
    let rows = Layout::vertical([
        Constraint::Length(3), // name
        Constraint::Min(5),    // prompt
        Constraint::Length(3), // temperature
        Constraint::Min(6),    // files
        Constraint::Length(3), // submit
    ])
    .split(body);

    RegistrationLayout {
        name: rows[0],
        prompt: rows[1],
        temperature: rows[2],
        files: rows[3],
        submit: rows[4],
    }
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the rectangle is clamped to the available space.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
