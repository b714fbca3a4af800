// Legacy single-file uploader page.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use sam_core::upload::{UploadState, UploadStatus};

use crate::tui::widgets::{focus_block, with_cursor};
use crate::tui::{Focus, ViewState};

pub fn render(frame: &mut Frame, area: Rect, upload: &UploadState, view: &ViewState) {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(area);

    let path_focused = view.focus == Focus::FilePath;
    let path = Paragraph::new(with_cursor(view.path_input.value(), path_focused))
        .block(focus_block("PDF file path", path_focused));
    frame.render_widget(path, rows[0]);

    let selected = match upload.file() {
        Some(file) => vec![
            Line::from(Span::styled(
                file.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                file.size_label(),
                Style::default().fg(Color::DarkGray),
            )),
        ],
        None => vec![Line::from(Span::styled(
            "No file selected. Paste or drop a PDF.",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(
        Paragraph::new(selected).block(focus_block("Selected file", false)),
        rows[1],
    );

    let (label, style) = match upload.status {
        UploadStatus::Idle if upload.can_upload() => (
            "[ Upload ]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        UploadStatus::Idle => ("[ Upload ]", Style::default().fg(Color::DarkGray)),
        UploadStatus::Uploading => ("Uploading...", Style::default().fg(Color::Yellow)),
        UploadStatus::Success => (
            "Upload complete. [ Upload Another ]",
            Style::default().fg(Color::Green),
        ),
        UploadStatus::Error => (
            "Upload failed. [ Try Again ]",
            Style::default().fg(Color::Red),
        ),
    };
    let button = Paragraph::new(Line::from(Span::styled(label, style)))
        .block(focus_block("Upload", view.focus == Focus::UploadButton));
    frame.render_widget(button, rows[2]);
}
