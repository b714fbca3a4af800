// Market registration form and its success screen.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use sam_core::registration::{RegistrationState, RegistrationStatus};

use crate::tui::layout::{centered_rect, registration_layout};
use crate::tui::widgets::{focus_block, with_cursor};
use crate::tui::{Focus, ViewState};

pub const SUCCESS_TITLE: &str = "Market Successfully Registered!";

pub fn render(frame: &mut Frame, area: Rect, form: &RegistrationState, view: &ViewState) {
    if form.status == RegistrationStatus::Success {
        render_success(frame, area, form);
        return;
    }

    let layout = registration_layout(area);

    let name = Paragraph::new(with_cursor(form.name.value(), view.focus == Focus::Name))
        .block(focus_block("Market name", view.focus == Focus::Name));
    frame.render_widget(name, layout.name);

    let prompt = Paragraph::new(with_cursor(form.prompt.value(), view.focus == Focus::Prompt))
        .wrap(Wrap { trim: false })
        .block(focus_block("Prompt", view.focus == Focus::Prompt));
    frame.render_widget(prompt, layout.prompt);

    let gauge = Gauge::default()
        .block(focus_block("Temperature", view.focus == Focus::Temperature))
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .ratio(form.temperature())
        .label(form.temperature_label());
    frame.render_widget(gauge, layout.temperature);

    render_files(frame, layout.files, form, view);
    render_submit(frame, layout.submit, form, view);
}

fn render_files(frame: &mut Frame, area: Rect, form: &RegistrationState, view: &ViewState) {
    let focused = view.focus == Focus::Files;
    let title = format!("Documents ({})", form.files().len());
    let block = focus_block(&title, focused);

    let picker = if view.path_input.value().is_empty() && !focused {
        Line::from(Span::styled(
            "Paste or drop PDF / text files here",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::Yellow)),
            Span::raw(with_cursor(view.path_input.value(), focused)),
        ])
    };

    let mut items = vec![ListItem::new(picker)];
    let visible = (area.height as usize).saturating_sub(3);
    let offset = view.file_cursor.saturating_sub(visible.saturating_sub(1));
    items.extend(
        form.files()
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, file)| {
                let text = format!("{}  {}", file.name, file.size_label());
                let style = if focused && i == view.file_cursor {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(text, style)))
            }),
    );

    frame.render_widget(List::new(items).block(block), area);
}

fn render_submit(frame: &mut Frame, area: Rect, form: &RegistrationState, view: &ViewState) {
    let focused = view.focus == Focus::Submit;

    let (label, style) = match form.status {
        RegistrationStatus::Registering => (
            "Registering...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        _ if form.can_submit() => (
            "[ Register Market ]".to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        _ => (
            "[ Register Market ]".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let mut spans = vec![Span::styled(label, style)];
    if form.status == RegistrationStatus::Error {
        spans.push(Span::styled(
            "  Registration failed. Adjust the form and try again.",
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(focus_block("Submit", focused));
    frame.render_widget(paragraph, area);
}

fn render_success(frame: &mut Frame, area: Rect, form: &RegistrationState) {
    let dialog = centered_rect(56, 7, area);
    let lines = vec![
        Line::from(Span::styled(
            SUCCESS_TITLE,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            form.name.value().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Enter: Register Another Market",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
    frame.render_widget(paragraph, dialog);
}
