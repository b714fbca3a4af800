// Chat page: market picker, transcript, suggested questions and message box.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use ratatui::Frame;

use sam_core::chat::{ChatMessage, ChatState, Role};

use crate::tui::layout::chat_layout;
use crate::tui::widgets::{focus_block, with_cursor};
use crate::tui::{Focus, ViewState};

/// Render the chat page into the body area.
pub fn render(frame: &mut Frame, area: Rect, chat: &ChatState, view: &ViewState) {
    let layout = chat_layout(area, chat.entry_questions.len() as u16);

    render_markets(frame, layout.markets, chat, view);
    render_transcript(frame, layout.transcript, chat, view);
    render_questions(frame, layout.questions, chat, view);
    render_input(frame, layout.input, chat, view);
}

// ---------------------------------------------------------------------------
// Market picker
// ---------------------------------------------------------------------------

fn render_markets(frame: &mut Frame, area: Rect, chat: &ChatState, view: &ViewState) {
    let focused = view.focus == Focus::Markets;
    let block = focus_block("Markets", focused);

    if chat.markets.is_empty() {
        let paragraph = Paragraph::new("  No markets available.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let offset = window_start(view.market_cursor, visible_rows, chat.markets.len());

    let items: Vec<ListItem> = chat
        .markets
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(i, market)| {
            let selected = chat.selected_market.as_deref() == Some(market.as_str());
            let marker = if selected { "● " } else { "  " };
            let mut style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            if focused && i == view.market_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(Span::styled(format!("{marker}{market}"), style)))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

fn render_transcript(frame: &mut Frame, area: Rect, chat: &ChatState, view: &ViewState) {
    let focused = view.focus == Focus::Transcript;
    let title = match &chat.selected_market {
        Some(market) => format!("Chat: {market}"),
        None => "Chat".to_string(),
    };
    let block = focus_block(&title, focused);

    let lines = transcript_lines(chat);
    if lines.is_empty() {
        let hint = if chat.selected_market.is_some() {
            "  Ask a question to get started."
        } else {
            "  Select a market to start chatting."
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2);
    let visible_rows = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let max_offset = total.saturating_sub(visible_rows);
    let offset = max_offset.saturating_sub(view.transcript_back);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);

    if max_offset > 0 {
        let mut scrollbar_state =
            ScrollbarState::new(max_offset as usize).position(offset as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// One header line per message followed by its content lines and a blank
/// spacer. A pending reply adds a typing indicator.
fn transcript_lines(chat: &ChatState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in chat.messages() {
        lines.push(message_header(message));
        for text in message.content.lines() {
            lines.push(Line::from(text.to_string()));
        }
        lines.push(Line::default());
    }
    if chat.loading {
        lines.push(Line::from(Span::styled(
            "Assistant is typing...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn message_header(message: &ChatMessage) -> Line<'static> {
    let (who, color) = match message.role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant => ("Assistant", Color::Magenta),
    };
    Line::from(vec![
        Span::styled(
            who,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", message.sent_at.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

// ---------------------------------------------------------------------------
// Suggested questions
// ---------------------------------------------------------------------------

fn render_questions(frame: &mut Frame, area: Rect, chat: &ChatState, view: &ViewState) {
    let focused = view.focus == Focus::Questions;
    let block = focus_block("Suggested questions", focused);

    if chat.entry_questions.is_empty() {
        frame.render_widget(block, area);
        return;
    }

    let style = if chat.input_enabled() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let offset = window_start(view.question_cursor, visible_rows, chat.entry_questions.len());

    let items: Vec<ListItem> = chat
        .entry_questions
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(i, question)| {
            let item_style = if focused && i == view.question_cursor {
                style.add_modifier(Modifier::REVERSED)
            } else {
                style
            };
            ListItem::new(Line::from(Span::styled(format!("? {question}"), item_style)))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ---------------------------------------------------------------------------
// Message box
// ---------------------------------------------------------------------------

fn render_input(frame: &mut Frame, area: Rect, chat: &ChatState, view: &ViewState) {
    let focused = view.focus == Focus::Message;
    let block = focus_block("Message", focused);

    let paragraph = if chat.selected_market.is_none() {
        Paragraph::new("Select a market first").style(Style::default().fg(Color::DarkGray))
    } else if chat.loading {
        Paragraph::new(chat.input.value().to_string())
            .style(Style::default().fg(Color::DarkGray))
    } else if chat.input.value().is_empty() && !focused {
        Paragraph::new("Type your message...").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(with_cursor(chat.input.value(), focused))
    };

    frame.render_widget(paragraph.block(block), area);
}

/// First row to show so that `cursor` stays inside a window of `rows`.
fn window_start(cursor: usize, rows: usize, len: usize) -> usize {
    if cursor < rows {
        0
    } else {
        (cursor + 1 - rows).min(len.saturating_sub(rows))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
