// Chat workflow: market selection, entry questions and the session transcript.
//
// Sending is optimistic: the user's message is appended before the request is
// issued, and the assistant reply (if any) is appended when the request
// settles. Only one turn is in flight at a time.

use chrono::{DateTime, Local};
use tracing::debug;
use uuid::Uuid;

use crate::text::{TextEdit, TextInput};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Local>,
}

impl ChatMessage {
    fn new(role: Role, content: String) -> Self {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            sent_at: Local::now(),
        }
    }
}

/// A chat turn ready to be posted to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub chat_id: String,
    pub message: String,
    pub market: String,
}

/// State of the chat page for one mount.
#[derive(Debug, Clone)]
pub struct ChatState {
    /// Session identifier sent with every turn. Fixed for the lifetime of
    /// this state.
    session_id: String,
    messages: Vec<ChatMessage>,
    pub markets: Vec<String>,
    pub selected_market: Option<String>,
    pub entry_questions: Vec<String>,
    pub input: TextInput,
    /// A chat turn is in flight.
    pub loading: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        ChatState {
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            markets: Vec::new(),
            selected_market: None,
            entry_questions: Vec::new(),
            input: TextInput::new(),
            loading: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The transcript in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Replace the selectable market list with the catalog response.
    pub fn set_markets(&mut self, markets: Vec<String>) {
        self.markets = markets;
    }

    /// Change the selected market.
    ///
    /// Returns the market whose entry questions should be fetched, or `None`
    /// when the selection did not change. The previous market's questions
    /// are dropped immediately so they are never shown alongside the new
    /// market's.
    pub fn select_market(&mut self, market: &str) -> Option<String> {
        if self.selected_market.as_deref() == Some(market) {
            return None;
        }
        debug!(market, "market selected");
        self.selected_market = Some(market.to_string());
        self.entry_questions.clear();
        Some(market.to_string())
    }

    /// Replace the entry questions with a response for `market`.
    ///
    /// Responses for a market that is no longer selected are ignored.
    /// Returns whether the list was applied.
    pub fn apply_entry_questions(&mut self, market: &str, questions: Vec<String>) -> bool {
        if self.selected_market.as_deref() != Some(market) {
            debug!(market, "ignoring entry questions for deselected market");
            return false;
        }
        self.entry_questions = questions;
        true
    }

    /// Input controls accept text and sends only with a market selected and
    /// no turn in flight.
    pub fn input_enabled(&self) -> bool {
        !self.loading && self.selected_market.is_some()
    }

    pub fn edit_input(&mut self, edit: TextEdit) {
        if self.input_enabled() {
            self.input.apply(edit);
        }
    }

    /// Start a chat turn with `text`.
    ///
    /// No-op when the trimmed text is empty, no market is selected, or a turn
    /// is already in flight. Otherwise the user message is appended, the
    /// input is cleared, the loading flag is set and the request to post is
    /// returned.
    pub fn submit(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || self.loading {
            return None;
        }
        let market = self.selected_market.clone()?;

        let message = ChatMessage::new(Role::User, text.to_string());
        let request = ChatRequest {
            chat_id: self.session_id.clone(),
            message: message.content.clone(),
            market,
        };
        self.messages.push(message);
        self.input.clear();
        self.loading = true;
        Some(request)
    }

    /// Submit whatever is in the input box.
    pub fn submit_input(&mut self) -> Option<ChatRequest> {
        let text = self.input.value().to_string();
        self.submit(&text)
    }

    /// Submit the entry question at `index`.
    pub fn ask_question(&mut self, index: usize) -> Option<ChatRequest> {
        let question = self.entry_questions.get(index)?.clone();
        self.submit(&question)
    }

    /// Settle the in-flight turn. A reply is appended verbatim as an
    /// assistant message; a failure appends nothing. Loading is cleared
    /// either way.
    pub fn complete_turn<E>(&mut self, outcome: Result<String, E>) {
        if let Ok(reply) = outcome {
            self.messages.push(ChatMessage::new(Role::Assistant, reply));
        }
        self.loading = false;
    }
}
