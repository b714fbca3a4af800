// Keyboard and paste handling.
//
// Translates crossterm events into UserCommand messages sent to the app
// orchestrator, or into local ViewState mutations (focus, cursors, scroll,
// the path picker line).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use sam_core::chat::ChatState;
use sam_core::files::parse_dropped_paths;
use sam_core::registration::{RegistrationState, RegistrationStatus};
use sam_core::text::TextEdit;
use sam_core::upload::{UploadState, UploadStatus};

use super::{Focus, ViewState};
use crate::protocol::{
    ChatCommand, Page, PageSnapshot, RegistrationCommand, UploadCommand, UserCommand,
};

/// Transcript rows moved by PageUp/PageDown.
const TRANSCRIPT_PAGE: u16 = 10;
/// Temperature change for Left/Right.
const TEMPERATURE_FINE: f64 = 0.01;
/// Temperature change for PageUp/PageDown.
const TEMPERATURE_COARSE: f64 = 0.1;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally by
/// mutating `ViewState` or had no effect.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if is_ctrl(&key_event, 'c') {
        return Some(UserCommand::Quit);
    }

    // Quit confirmation mode: only y/q confirm, n/Esc cancel, everything else blocked
    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    // Shell keys work on every page
    match key_event.code {
        KeyCode::F(1) => return Some(UserCommand::Navigate(Page::Create)),
        KeyCode::F(2) => return Some(UserCommand::Navigate(Page::Chat)),
        KeyCode::Tab => {
            view_state.cycle_focus(true);
            return None;
        }
        KeyCode::BackTab => {
            view_state.cycle_focus(false);
            return None;
        }
        KeyCode::Esc => {
            view_state.toasts.clear();
            return None;
        }
        _ => {}
    }
    if is_ctrl(&key_event, 'q') {
        view_state.confirm_quit = true;
        return None;
    }

    // The snapshot is cloned out so page handlers can mutate the view freely.
    match view_state.page.clone() {
        Some(PageSnapshot::Chat(chat)) => handle_chat_key(key_event, &chat, view_state),
        Some(PageSnapshot::Registration(form)) => {
            handle_registration_key(key_event, &form, view_state)
        }
        Some(PageSnapshot::Upload(upload)) => handle_upload_key(key_event, &upload, view_state),
        None => None,
    }
}

/// Handle text pasted into the terminal (including files dragged onto it).
///
/// Text fields receive the paste as-is. Anywhere else on the Create page the
/// text is read as a list of dropped file paths.
pub fn handle_paste(text: &str, view_state: &mut ViewState) -> Option<UserCommand> {
    if view_state.confirm_quit {
        return None;
    }

    match view_state.page.as_ref()? {
        PageSnapshot::Chat(_) => {
            view_state.focus = Focus::Message;
            Some(UserCommand::Chat(ChatCommand::Edit(TextEdit::Paste(
                single_line(text),
            ))))
        }
        PageSnapshot::Registration(form) => {
            if form.status == RegistrationStatus::Success {
                return None;
            }
            match view_state.focus {
                Focus::Name => Some(UserCommand::Registration(RegistrationCommand::EditName(
                    TextEdit::Paste(single_line(text)),
                ))),
                Focus::Prompt => Some(UserCommand::Registration(
                    RegistrationCommand::EditPrompt(TextEdit::Paste(text.to_string())),
                )),
                _ => {
                    let paths = parse_dropped_paths(text);
                    if paths.is_empty() {
                        return None;
                    }
                    view_state.focus = Focus::Files;
                    Some(UserCommand::Registration(RegistrationCommand::AddPaths(
                        paths,
                    )))
                }
            }
        }
        PageSnapshot::Upload(upload) => {
            if upload.status == UploadStatus::Uploading {
                return None;
            }
            let path = parse_dropped_paths(text).into_iter().next()?;
            view_state.path_input.clear();
            Some(UserCommand::Upload(UploadCommand::SelectPath(path)))
        }
    }
}

/// Handle key events while in quit confirmation mode.
///
/// - `y` or `q` confirms quit (sends UserCommand::Quit)
/// - `n` or `Esc` cancels (returns to normal mode)
/// - All other keys are blocked (no-op)
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None, // Block all other input
    }
}

// ---------------------------------------------------------------------------
// Chat page
// ---------------------------------------------------------------------------

fn handle_chat_key(
    key_event: KeyEvent,
    chat: &ChatState,
    view_state: &mut ViewState,
) -> Option<UserCommand> {
    match view_state.focus {
        Focus::Markets => match key_event.code {
            KeyCode::Up => {
                view_state.market_cursor = view_state.market_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                view_state.market_cursor = step_down(view_state.market_cursor, chat.markets.len());
                None
            }
            KeyCode::Enter => chat
                .markets
                .get(view_state.market_cursor)
                .map(|market| UserCommand::Chat(ChatCommand::SelectMarket(market.clone()))),
            _ => None,
        },
        Focus::Transcript => {
            let back = &mut view_state.transcript_back;
            match key_event.code {
                KeyCode::Up => *back = back.saturating_add(1),
                KeyCode::Down => *back = back.saturating_sub(1),
                KeyCode::PageUp => *back = back.saturating_add(TRANSCRIPT_PAGE),
                KeyCode::PageDown => *back = back.saturating_sub(TRANSCRIPT_PAGE),
                KeyCode::End => *back = 0,
                _ => {}
            }
            None
        }
        Focus::Questions => match key_event.code {
            KeyCode::Up => {
                view_state.question_cursor = view_state.question_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                view_state.question_cursor =
                    step_down(view_state.question_cursor, chat.entry_questions.len());
                None
            }
            KeyCode::Enter if view_state.question_cursor < chat.entry_questions.len() => Some(
                UserCommand::Chat(ChatCommand::AskQuestion(view_state.question_cursor)),
            ),
            _ => None,
        },
        Focus::Message => {
            if key_event.code == KeyCode::Enter {
                return Some(UserCommand::Chat(ChatCommand::SubmitInput));
            }
            text_edit(&key_event).map(|edit| UserCommand::Chat(ChatCommand::Edit(edit)))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Create page: registration form
// ---------------------------------------------------------------------------

fn handle_registration_key(
    key_event: KeyEvent,
    form: &RegistrationState,
    view_state: &mut ViewState,
) -> Option<UserCommand> {
    if form.status == RegistrationStatus::Success {
        return match key_event.code {
            KeyCode::Enter => Some(UserCommand::Registration(RegistrationCommand::Reset)),
            _ => None,
        };
    }

    if is_ctrl(&key_event, 's') {
        return Some(UserCommand::Registration(RegistrationCommand::Submit));
    }

    match view_state.focus {
        Focus::Name => {
            if key_event.code == KeyCode::Enter {
                view_state.cycle_focus(true);
                return None;
            }
            text_edit(&key_event)
                .map(|edit| UserCommand::Registration(RegistrationCommand::EditName(edit)))
        }
        Focus::Prompt => {
            let edit = match key_event.code {
                KeyCode::Enter => Some(TextEdit::Insert('\n')),
                _ => text_edit(&key_event),
            };
            edit.map(|edit| UserCommand::Registration(RegistrationCommand::EditPrompt(edit)))
        }
        Focus::Temperature => {
            let command = match key_event.code {
                KeyCode::Left => RegistrationCommand::NudgeTemperature(-TEMPERATURE_FINE),
                KeyCode::Right => RegistrationCommand::NudgeTemperature(TEMPERATURE_FINE),
                KeyCode::PageDown => RegistrationCommand::NudgeTemperature(-TEMPERATURE_COARSE),
                KeyCode::PageUp => RegistrationCommand::NudgeTemperature(TEMPERATURE_COARSE),
                KeyCode::Home => RegistrationCommand::SetTemperature(0.0),
                KeyCode::End => RegistrationCommand::SetTemperature(1.0),
                _ => return None,
            };
            Some(UserCommand::Registration(command))
        }
        Focus::Files => match key_event.code {
            KeyCode::Up => {
                view_state.file_cursor = view_state.file_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                view_state.file_cursor = step_down(view_state.file_cursor, form.files().len());
                None
            }
            KeyCode::Delete if !form.files().is_empty() => Some(UserCommand::Registration(
                RegistrationCommand::RemoveFile(view_state.file_cursor),
            )),
            KeyCode::Enter => {
                let paths = parse_dropped_paths(&view_state.path_input.take());
                if paths.is_empty() {
                    None
                } else {
                    Some(UserCommand::Registration(RegistrationCommand::AddPaths(
                        paths,
                    )))
                }
            }
            _ => {
                if let Some(edit) = text_edit(&key_event) {
                    view_state.path_input.apply(edit);
                }
                None
            }
        },
        Focus::Submit => match key_event.code {
            KeyCode::Enter => Some(UserCommand::Registration(RegistrationCommand::Submit)),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Create page: single-file uploader
// ---------------------------------------------------------------------------

fn handle_upload_key(
    key_event: KeyEvent,
    upload: &UploadState,
    view_state: &mut ViewState,
) -> Option<UserCommand> {
    if matches!(upload.status, UploadStatus::Success | UploadStatus::Error) {
        return match key_event.code {
            KeyCode::Enter => {
                view_state.path_input.clear();
                view_state.focus = Focus::FilePath;
                Some(UserCommand::Upload(UploadCommand::Reset))
            }
            _ => None,
        };
    }

    match view_state.focus {
        Focus::FilePath => match key_event.code {
            KeyCode::Enter => {
                let path = parse_dropped_paths(view_state.path_input.value())
                    .into_iter()
                    .next()?;
                view_state.path_input.clear();
                Some(UserCommand::Upload(UploadCommand::SelectPath(path)))
            }
            _ => {
                if let Some(edit) = text_edit(&key_event) {
                    view_state.path_input.apply(edit);
                }
                None
            }
        },
        Focus::UploadButton => match key_event.code {
            KeyCode::Enter => Some(UserCommand::Upload(UploadCommand::Submit)),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_ctrl(key_event: &KeyEvent, c: char) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char(c)
}

/// The text edit a key press makes in a focused text field, if any.
fn text_edit(key_event: &KeyEvent) -> Option<TextEdit> {
    if is_ctrl(key_event, 'u') {
        return Some(TextEdit::Clear);
    }
    match key_event.code {
        KeyCode::Backspace => Some(TextEdit::Backspace),
        KeyCode::Char(c)
            if !key_event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(TextEdit::Insert(c))
        }
        _ => None,
    }
}

fn step_down(cursor: usize, len: usize) -> usize {
    if cursor + 1 < len {
        cursor + 1
    } else {
        cursor
    }
}

fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
