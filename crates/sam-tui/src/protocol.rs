// Message types exchanged between the TUI, the application loop and the
// request tasks it spawns.

use std::path::PathBuf;

use serde::Deserialize;

use sam_core::chat::ChatState;
use sam_core::notify::Notification;
use sam_core::registration::RegistrationState;
use sam_core::text::TextEdit;
use sam_core::upload::UploadState;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Top-level navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Create,
    Chat,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Create, Page::Chat];

    pub fn label(self) -> &'static str {
        match self {
            Page::Create => "Create",
            Page::Chat => "Chat",
        }
    }
}

/// Which form backs the Create page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatePage {
    /// Market registration with prompt, temperature and documents.
    #[default]
    Registrator,
    /// Legacy single-file uploader.
    Uploader,
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the application loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Navigate(Page),
    Chat(ChatCommand),
    Registration(RegistrationCommand),
    Upload(UploadCommand),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    SelectMarket(String),
    Edit(TextEdit),
    SubmitInput,
    AskQuestion(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationCommand {
    EditName(TextEdit),
    EditPrompt(TextEdit),
    SetTemperature(f64),
    NudgeTemperature(f64),
    /// Paths picked or dropped by the user, not yet inspected.
    AddPaths(Vec<PathBuf>),
    RemoveFile(usize),
    Submit,
    /// "Register Another Market".
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadCommand {
    SelectPath(PathBuf),
    Submit,
    /// "Upload Another" / "Try Again".
    Reset,
}

// ---------------------------------------------------------------------------
// Request tasks -> app
// ---------------------------------------------------------------------------

/// Outcome of a spawned request, tagged with the page mount generation that
/// issued it. Errors are already rendered to text.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    MarketsLoaded {
        generation: u64,
        result: Result<Vec<String>, String>,
    },
    EntryQuestionsLoaded {
        generation: u64,
        market: String,
        result: Result<Vec<String>, String>,
    },
    ChatReply {
        generation: u64,
        result: Result<String, String>,
    },
    RegistrationFinished {
        generation: u64,
        result: Result<(), String>,
    },
    /// The post-success reset delay elapsed.
    RegistrationResetDue { generation: u64 },
    UploadFinished {
        generation: u64,
        result: Result<Option<String>, String>,
    },
}

impl AppEvent {
    pub fn generation(&self) -> u64 {
        match self {
            AppEvent::MarketsLoaded { generation, .. }
            | AppEvent::EntryQuestionsLoaded { generation, .. }
            | AppEvent::ChatReply { generation, .. }
            | AppEvent::RegistrationFinished { generation, .. }
            | AppEvent::RegistrationResetDue { generation }
            | AppEvent::UploadFinished { generation, .. } => *generation,
        }
    }
}

// ---------------------------------------------------------------------------
// App -> TUI
// ---------------------------------------------------------------------------

/// Copy of the mounted page's workflow state, rendered as-is by the TUI.
#[derive(Debug, Clone)]
pub enum PageSnapshot {
    Chat(Box<ChatState>),
    Registration(Box<RegistrationState>),
    Upload(Box<UploadState>),
}

impl PageSnapshot {
    /// The navigation entry this page belongs to.
    pub fn page(&self) -> Page {
        match self {
            PageSnapshot::Chat(_) => Page::Chat,
            PageSnapshot::Registration(_) | PageSnapshot::Upload(_) => Page::Create,
        }
    }
}

/// Updates pushed from the application loop to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// A page was freshly mounted; view-local state should start over.
    Mounted(PageSnapshot),
    /// The mounted page's state changed.
    Page(PageSnapshot),
    Notify(Notification),
    /// A market was registered.
    Celebrate,
}
