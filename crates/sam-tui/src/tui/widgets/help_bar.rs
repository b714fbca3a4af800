// Help bar: key bindings for the focused area.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use sam_core::registration::RegistrationStatus;
use sam_core::upload::UploadStatus;

use crate::protocol::PageSnapshot;
use crate::tui::{Focus, ViewState};

const GLOBAL: &str = "F1:Create F2:Chat Tab:Next ^Q:Quit";

/// Hints for whatever currently receives key presses.
pub fn hints(state: &ViewState) -> String {
    if state.confirm_quit {
        return " y:Quit | n/Esc:Cancel".to_string();
    }

    let local = match &state.page {
        None => "",
        Some(PageSnapshot::Registration(form)) if form.status == RegistrationStatus::Success => {
            "Enter:Register another"
        }
        Some(PageSnapshot::Upload(upload))
            if matches!(upload.status, UploadStatus::Success | UploadStatus::Error) =>
        {
            "Enter:Start over"
        }
        Some(_) => match state.focus {
            Focus::Markets => "Up/Down:Move Enter:Select",
            Focus::Transcript => "Up/Down/PgUp/PgDn:Scroll End:Latest",
            Focus::Questions => "Up/Down:Move Enter:Ask",
            Focus::Message => "Enter:Send ^U:Clear",
            Focus::Name => "Type name ^S:Register",
            Focus::Prompt => "Enter:Newline ^U:Clear ^S:Register",
            Focus::Temperature => "Left/Right:0.01 PgUp/PgDn:0.1 Home/End:Min/Max",
            Focus::Files => "Enter:Add path Up/Down:Select Del:Remove",
            Focus::Submit => "Enter:Register",
            Focus::FilePath => "Enter:Select file",
            Focus::UploadButton => "Enter:Upload",
        },
    };

    if local.is_empty() {
        format!(" {GLOBAL}")
    } else {
        format!(" {local} | {GLOBAL}")
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        hints(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
