// TUI shell: header, navigation, the mounted page, and overlays.
//
// The TUI owns a `ViewState` holding the latest page snapshot pushed by the
// app orchestrator plus view-local state (focus, cursors, toasts). It applies
// `UiUpdate` messages as they arrive and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::{Duration, Instant};

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream};
use futures_util::StreamExt;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::warn;

use sam_core::notify::Notification;
use sam_core::text::TextInput;

use crate::protocol::{Page, PageSnapshot, UiUpdate, UserCommand};

use layout::build_layout;
use widgets::confetti::Celebration;
use widgets::toasts::{Toast, MAX_TOASTS, TOAST_TTL};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

/// Which form backs the screen, as far as input handling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Chat,
    Registration,
    Upload,
}

impl PageKind {
    fn of(snapshot: &PageSnapshot) -> Self {
        match snapshot {
            PageSnapshot::Chat(_) => PageKind::Chat,
            PageSnapshot::Registration(_) => PageKind::Registration,
            PageSnapshot::Upload(_) => PageKind::Upload,
        }
    }
}

/// The area receiving key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    // Chat
    Markets,
    Transcript,
    Questions,
    Message,
    // Registration
    Name,
    Prompt,
    Temperature,
    Files,
    Submit,
    // Uploader
    FilePath,
    UploadButton,
}

const CHAT_FOCUS: &[Focus] = &[
    Focus::Markets,
    Focus::Transcript,
    Focus::Questions,
    Focus::Message,
];
const REGISTRATION_FOCUS: &[Focus] = &[
    Focus::Name,
    Focus::Prompt,
    Focus::Temperature,
    Focus::Files,
    Focus::Submit,
];
const UPLOAD_FOCUS: &[Focus] = &[Focus::FilePath, Focus::UploadButton];

impl Focus {
    /// Tab order for a page.
    pub fn cycle(kind: PageKind) -> &'static [Focus] {
        match kind {
            PageKind::Chat => CHAT_FOCUS,
            PageKind::Registration => REGISTRATION_FOCUS,
            PageKind::Upload => UPLOAD_FOCUS,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering.
pub struct ViewState {
    /// Latest snapshot of the mounted page; `None` until the app mounts one.
    pub page: Option<PageSnapshot>,
    pub focus: Focus,
    /// Highlighted entry of the market list.
    pub market_cursor: usize,
    /// Highlighted suggested question.
    pub question_cursor: usize,
    /// Highlighted queued file.
    pub file_cursor: usize,
    /// Transcript lines scrolled up from the bottom. Zero follows the newest
    /// message.
    pub transcript_back: u16,
    /// Transcript length at the last update, used to detect new messages.
    seen_messages: usize,
    /// The manual file picker line on the Create page.
    pub path_input: TextInput,
    /// Active notifications, newest first.
    pub toasts: Vec<Toast>,
    pub celebration: Option<Celebration>,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            page: None,
            focus: Focus::Markets,
            market_cursor: 0,
            question_cursor: 0,
            file_cursor: 0,
            transcript_back: 0,
            seen_messages: 0,
            path_input: TextInput::new(),
            toasts: Vec::new(),
            celebration: None,
            confirm_quit: false,
        }
    }
}

impl ViewState {
    pub fn page_kind(&self) -> Option<PageKind> {
        self.page.as_ref().map(PageKind::of)
    }

    /// Navigation entry of the mounted page.
    pub fn active_page(&self) -> Option<Page> {
        self.page.as_ref().map(PageSnapshot::page)
    }

    /// Move focus forward (`true`) or backward through the page's tab order.
    pub fn cycle_focus(&mut self, forward: bool) {
        let Some(kind) = self.page_kind() else {
            return;
        };
        let order = Focus::cycle(kind);
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Show a notification on top of the stack.
    pub fn push_toast(&mut self, notification: Notification, now: Instant) {
        self.toasts.insert(
            0,
            Toast {
                notification,
                shown_at: now,
            },
        );
        self.toasts.truncate(MAX_TOASTS);
    }

    /// Drop expired toasts and a finished celebration.
    pub fn prune(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_TTL);
        if self.celebration.as_ref().is_some_and(|c| c.is_over(now)) {
            self.celebration = None;
        }
    }

    fn on_mounted(&mut self, snapshot: PageSnapshot) {
        let kind = PageKind::of(&snapshot);
        self.focus = Focus::cycle(kind)[0];
        self.market_cursor = 0;
        self.question_cursor = 0;
        self.file_cursor = 0;
        self.transcript_back = 0;
        self.seen_messages = 0;
        self.path_input.clear();
        self.celebration = None;
        self.on_snapshot(snapshot);
    }

    fn on_snapshot(&mut self, snapshot: PageSnapshot) {
        match &snapshot {
            PageSnapshot::Chat(chat) => {
                let count = chat.messages().len();
                if count != self.seen_messages {
                    self.seen_messages = count;
                    self.transcript_back = 0;
                }
                self.market_cursor = clamp_cursor(self.market_cursor, chat.markets.len());
                self.question_cursor =
                    clamp_cursor(self.question_cursor, chat.entry_questions.len());
            }
            PageSnapshot::Registration(form) => {
                self.file_cursor = clamp_cursor(self.file_cursor, form.files().len());
            }
            PageSnapshot::Upload(_) => {}
        }
        self.page = Some(snapshot);
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Mounted(snapshot) => state.on_mounted(snapshot),
        UiUpdate::Page(snapshot) => state.on_snapshot(snapshot),
        UiUpdate::Notify(notification) => state.push_toast(notification, Instant::now()),
        UiUpdate::Celebrate => state.celebration = Some(Celebration::new(Instant::now())),
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame: shell, mounted page, then overlays.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::header::render(frame, layout.header);
    widgets::nav::render(frame, layout.nav, state.active_page());

    match &state.page {
        Some(PageSnapshot::Chat(chat)) => widgets::chat::render(frame, layout.body, chat, state),
        Some(PageSnapshot::Registration(form)) => {
            widgets::registration::render(frame, layout.body, form, state)
        }
        Some(PageSnapshot::Upload(upload)) => {
            widgets::upload::render(frame, layout.body, upload, state)
        }
        None => {
            let loading = Paragraph::new("Loading...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, layout.body);
        }
    }

    widgets::help_bar::render(frame, layout.help_bar, state);

    if let Some(celebration) = &state.celebration {
        widgets::confetti::render(frame, layout.body, celebration);
    }
    widgets::toasts::render(frame, layout.body, &state.toasts);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (raw mode, alternate screen, bracketed paste).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, terminal input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal. Pasted text (and dropped files) arrive as a
    //    single paste event rather than a burst of key presses.
    let mut terminal = ratatui::init();
    if let Err(e) = crossterm::execute!(std::io::stdout(), EnableBracketedPaste) {
        warn!("Failed to enable bracketed paste: {}", e);
    }

    // 2. Set panic hook to restore terminal on crash.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(std::io::stdout(), DisableBracketedPaste);
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // 3. Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Terminal input
            maybe_event = event_stream.next() => {
                let command = match maybe_event {
                    Some(Ok(Event::Key(key_event))) => input::handle_key(key_event, &mut view_state),
                    Some(Ok(Event::Paste(text))) => input::handle_paste(&text, &mut view_state),
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                };
                if let Some(command) = command {
                    let quit = command == UserCommand::Quit;
                    let _ = cmd_tx.send(command).await;
                    if quit {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                view_state.prune(Instant::now());
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 4. Restore terminal
    let _ = crossterm::execute!(std::io::stdout(), DisableBracketedPaste);
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sam_core::chat::ChatState;
    use sam_core::registration::RegistrationState;
    use sam_core::text::TextEdit;
    use sam_core::upload::UploadState;

    fn chat_with_markets(markets: &[&str]) -> ChatState {
        let mut chat = ChatState::new();
        chat.set_markets(markets.iter().map(|m| m.to_string()).collect());
        chat
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.page.is_none());
        assert!(state.page_kind().is_none());
        assert!(state.toasts.is_empty());
        assert!(state.celebration.is_none());
        assert!(!state.confirm_quit);
        assert_eq!(state.transcript_back, 0);
    }

    #[test]
    fn mount_resets_focus_to_first_area() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Mounted(PageSnapshot::Registration(Box::new(RegistrationState::new()))),
        );
        assert_eq!(state.focus, Focus::Name);
        assert_eq!(state.active_page(), Some(Page::Create));

        state.path_input.apply(TextEdit::Paste("/tmp/a.pdf".into()));
        apply_ui_update(
            &mut state,
            UiUpdate::Mounted(PageSnapshot::Chat(Box::new(ChatState::new()))),
        );
        assert_eq!(state.focus, Focus::Markets);
        assert_eq!(state.active_page(), Some(Page::Chat));
        assert!(state.path_input.value().is_empty());
    }

    #[test]
    fn page_update_keeps_focus() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Mounted(PageSnapshot::Upload(Box::new(UploadState::new()))),
        );
        state.focus = Focus::UploadButton;
        apply_ui_update(
            &mut state,
            UiUpdate::Page(PageSnapshot::Upload(Box::new(UploadState::new()))),
        );
        assert_eq!(state.focus, Focus::UploadButton);
    }

    #[test]
    fn focus_cycles_both_ways() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Mounted(PageSnapshot::Chat(Box::new(ChatState::new()))),
        );
        state.cycle_focus(true);
        assert_eq!(state.focus, Focus::Transcript);
        state.cycle_focus(false);
        state.cycle_focus(false);
        assert_eq!(state.focus, Focus::Message);
    }

    #[test]
    fn new_message_resumes_following() {
        let mut chat = chat_with_markets(&["A"]);
        chat.select_market("A");
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Mounted(PageSnapshot::Chat(Box::new(chat.clone()))));

        state.transcript_back = 4;
        apply_ui_update(&mut state, UiUpdate::Page(PageSnapshot::Chat(Box::new(chat.clone()))));
        assert_eq!(state.transcript_back, 4, "no new message, keep position");

        chat.submit("hello");
        apply_ui_update(&mut state, UiUpdate::Page(PageSnapshot::Chat(Box::new(chat))));
        assert_eq!(state.transcript_back, 0);
    }

    #[test]
    fn cursors_clamped_to_shrunk_lists() {
        let mut state = ViewState::default();
        state.market_cursor = 5;
        apply_ui_update(
            &mut state,
            UiUpdate::Page(PageSnapshot::Chat(Box::new(chat_with_markets(&["A", "B"])))),
        );
        assert_eq!(state.market_cursor, 1);
    }

    #[test]
    fn toasts_newest_first_and_capped() {
        let mut state = ViewState::default();
        let now = Instant::now();
        for i in 0..5 {
            state.push_toast(Notification::info(format!("t{i}"), ""), now);
        }
        assert_eq!(state.toasts.len(), MAX_TOASTS);
        assert_eq!(state.toasts[0].notification.title, "t4");
    }

    #[test]
    fn toasts_expire() {
        let mut state = ViewState::default();
        let start = Instant::now();
        state.push_toast(Notification::error("old", ""), start);
        state.push_toast(Notification::info("new", ""), start + Duration::from_secs(3));

        state.prune(start + TOAST_TTL + Duration::from_millis(1));
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.toasts[0].notification.title, "new");
    }

    #[test]
    fn celebration_ends() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Celebrate);
        assert!(state.celebration.is_some());
        state.prune(Instant::now() + Duration::from_secs(10));
        assert!(state.celebration.is_none());
    }

    #[test]
    fn render_frame_every_page_does_not_panic() {
        let snapshots = [
            None,
            Some(PageSnapshot::Chat(Box::new(chat_with_markets(&["A", "B"])))),
            Some(PageSnapshot::Registration(Box::new(RegistrationState::new()))),
            Some(PageSnapshot::Upload(Box::new(UploadState::new()))),
        ];
        for snapshot in snapshots {
            let mut state = ViewState::default();
            if let Some(snapshot) = snapshot {
                apply_ui_update(&mut state, UiUpdate::Mounted(snapshot));
            }
            apply_ui_update(&mut state, UiUpdate::Celebrate);
            apply_ui_update(
                &mut state,
                UiUpdate::Notify(Notification::error("File too large", "x.pdf exceeds the 5MB limit.")),
            );
            state.confirm_quit = true;

            let backend = ratatui::backend::TestBackend::new(100, 30);
            let mut terminal = ratatui::Terminal::new(backend).unwrap();
            terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        }
    }

    #[test]
    fn render_frame_tiny_terminal_does_not_panic() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Mounted(PageSnapshot::Registration(Box::new(RegistrationState::new()))),
        );
        let backend = ratatui::backend::TestBackend::new(20, 8);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
    }
}
