// Application state and orchestration logic.
//
// The central event loop owns the mounted page's workflow state. It applies
// user commands from the TUI, spawns one task per backend request, applies
// the events those tasks post back, and pushes snapshots to the TUI.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sam_backend::MarketBackend;
use sam_core::chat::{ChatRequest, ChatState};
use sam_core::files::LocalFile;
use sam_core::notify::Notification;
use sam_core::registration::{
    rejection_notice, RegistrationRequest, RegistrationState, RegistrationStatus,
    SUCCESS_RESET_DELAY,
};
use sam_core::upload::UploadState;

use crate::config::Config;
use crate::protocol::{
    AppEvent, ChatCommand, CreatePage, Page, PageSnapshot, RegistrationCommand, UiUpdate,
    UploadCommand, UserCommand,
};

// ---------------------------------------------------------------------------
// Mounted page
// ---------------------------------------------------------------------------

/// Workflow state of the page currently on screen.
#[derive(Debug, Clone)]
pub enum ActivePage {
    Chat(ChatState),
    Registration(RegistrationState),
    Upload(UploadState),
}

impl ActivePage {
    fn fresh(page: Page, create_page: CreatePage) -> Self {
        match (page, create_page) {
            (Page::Chat, _) => ActivePage::Chat(ChatState::new()),
            (Page::Create, CreatePage::Registrator) => {
                ActivePage::Registration(RegistrationState::new())
            }
            (Page::Create, CreatePage::Uploader) => ActivePage::Upload(UploadState::new()),
        }
    }

    pub fn page(&self) -> Page {
        match self {
            ActivePage::Chat(_) => Page::Chat,
            ActivePage::Registration(_) | ActivePage::Upload(_) => Page::Create,
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        match self {
            ActivePage::Chat(s) => PageSnapshot::Chat(Box::new(s.clone())),
            ActivePage::Registration(s) => PageSnapshot::Registration(Box::new(s.clone())),
            ActivePage::Upload(s) => PageSnapshot::Upload(Box::new(s.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything the event loop owns.
pub struct AppState {
    backend: Arc<dyn MarketBackend>,
    /// Cloned into every spawned request task.
    event_tx: mpsc::Sender<AppEvent>,
    create_page: CreatePage,
    start_page: Page,
    pub page: ActivePage,
    /// Incremented on every mount. Events carrying an older generation were
    /// issued by a page that has since been unmounted and are discarded.
    pub generation: u64,
    /// Pending post-registration reset, aborted on unmount or manual reset.
    pub reset_timer: Option<JoinHandle<()>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        backend: Arc<dyn MarketBackend>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let create_page = config.ui.create_page;
        let start_page = config.ui.start_page;
        AppState {
            backend,
            event_tx,
            create_page,
            start_page,
            page: ActivePage::fresh(start_page, create_page),
            generation: 0,
            reset_timer: None,
        }
    }

    /// Discard the current page and mount a fresh `page`, issuing its
    /// on-mount requests.
    pub fn mount(&mut self, page: Page) {
        self.cancel_reset();
        self.generation += 1;
        self.page = ActivePage::fresh(page, self.create_page);
        info!(?page, generation = self.generation, "page mounted");

        if matches!(self.page, ActivePage::Chat(_)) {
            self.spawn_market_names();
        }
    }

    fn cancel_reset(&mut self) {
        if let Some(handle) = self.reset_timer.take() {
            handle.abort();
        }
    }

    /// Run `request` on its own task and post its event back to the loop.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = request.await;
            let _ = tx.send(event).await;
        });
    }

    fn spawn_market_names(&self) {
        let backend = Arc::clone(&self.backend);
        let generation = self.generation;
        self.spawn_request(async move {
            AppEvent::MarketsLoaded {
                generation,
                result: backend.market_names().await.map_err(|e| e.to_string()),
            }
        });
    }

    fn spawn_entry_questions(&self, market: String) {
        let backend = Arc::clone(&self.backend);
        let generation = self.generation;
        self.spawn_request(async move {
            let result = backend
                .entry_questions(&market)
                .await
                .map_err(|e| e.to_string());
            AppEvent::EntryQuestionsLoaded {
                generation,
                market,
                result,
            }
        });
    }

    fn spawn_chat(&self, request: ChatRequest) {
        let backend = Arc::clone(&self.backend);
        let generation = self.generation;
        self.spawn_request(async move {
            AppEvent::ChatReply {
                generation,
                result: backend.send_chat(&request).await.map_err(|e| e.to_string()),
            }
        });
    }

    fn spawn_registration(&self, request: RegistrationRequest) {
        let backend = Arc::clone(&self.backend);
        let generation = self.generation;
        self.spawn_request(async move {
            let result = backend
                .register_market(&request)
                .await
                .map(|reply| debug!(message = %reply.message, "market registered"))
                .map_err(|e| {
                    warn!(market = %request.market, error = %e, "registration failed");
                    e.user_message("Registration failed")
                });
            AppEvent::RegistrationFinished { generation, result }
        });
    }

    fn spawn_upload(&self, file: LocalFile) {
        let backend = Arc::clone(&self.backend);
        let generation = self.generation;
        self.spawn_request(async move {
            let result = backend
                .upload_file(&file)
                .await
                .map(|reply| reply.file_url)
                .map_err(|e| {
                    warn!(file = %file.name, error = %e, "upload failed");
                    e.user_message("Upload failed")
                });
            AppEvent::UploadFinished { generation, result }
        });
    }

    /// Start the post-success countdown that returns the form to its
    /// initial values.
    fn schedule_reset(&mut self) {
        self.cancel_reset();
        let tx = self.event_tx.clone();
        let generation = self.generation;
        self.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(SUCCESS_RESET_DELAY).await;
            let _ = tx.send(AppEvent::RegistrationResetDue { generation }).await;
        }));
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Mounts the configured start page, then listens with `tokio::select!` on:
/// 1. Events posted by spawned request tasks
/// 2. User commands from the TUI
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut event_rx: mpsc::Receiver<AppEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    state.mount(state.start_page);
    let _ = ui_tx.send(UiUpdate::Mounted(state.page.snapshot())).await;

    loop {
        tokio::select! {
            // --- Request outcomes ---
            event = event_rx.recv() => {
                match event {
                    Some(event) => handle_app_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("Event channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    state.cancel_reset();
    Ok(())
}

// ---------------------------------------------------------------------------
// User commands
// ---------------------------------------------------------------------------

/// Apply a command from the TUI to the mounted page.
///
/// Commands addressed to a page that is not mounted are ignored.
pub async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let mut notices = Vec::new();

    match cmd {
        UserCommand::Navigate(page) => {
            if state.page.page() == page {
                return;
            }
            state.mount(page);
            let _ = ui_tx.send(UiUpdate::Mounted(state.page.snapshot())).await;
            return;
        }
        UserCommand::Chat(cmd) => {
            let ActivePage::Chat(chat) = &mut state.page else {
                debug!(?cmd, "chat command with chat page unmounted");
                return;
            };
            match cmd {
                ChatCommand::SelectMarket(market) => {
                    if let Some(market) = chat.select_market(&market) {
                        state.spawn_entry_questions(market);
                    }
                }
                ChatCommand::Edit(edit) => chat.edit_input(edit),
                ChatCommand::SubmitInput => {
                    if let Some(request) = chat.submit_input() {
                        state.spawn_chat(request);
                    }
                }
                ChatCommand::AskQuestion(index) => {
                    if let Some(request) = chat.ask_question(index) {
                        state.spawn_chat(request);
                    }
                }
            }
        }
        UserCommand::Registration(cmd) => {
            let ActivePage::Registration(form) = &mut state.page else {
                debug!(?cmd, "registration command with registrator unmounted");
                return;
            };
            match cmd {
                RegistrationCommand::EditName(edit) => form.edit_name(edit),
                RegistrationCommand::EditPrompt(edit) => form.edit_prompt(edit),
                RegistrationCommand::SetTemperature(value) => form.set_temperature(value),
                RegistrationCommand::NudgeTemperature(delta) => form.nudge_temperature(delta),
                RegistrationCommand::AddPaths(paths) => {
                    let (candidates, unreadable) = inspect_paths(paths);
                    notices.extend(unreadable);
                    notices.extend(form.add_files(candidates));
                }
                RegistrationCommand::RemoveFile(index) => {
                    form.remove_file(index);
                }
                RegistrationCommand::Submit => {
                    if let Some(request) = form.begin_submit() {
                        info!(market = %request.market, files = request.files.len(), "submitting registration");
                        state.spawn_registration(request);
                    }
                }
                RegistrationCommand::Reset => {
                    form.reset();
                    state.cancel_reset();
                }
            }
        }
        UserCommand::Upload(cmd) => {
            let ActivePage::Upload(upload) = &mut state.page else {
                debug!(?cmd, "upload command with uploader unmounted");
                return;
            };
            match cmd {
                UploadCommand::SelectPath(path) => match LocalFile::from_path(&path) {
                    Ok(candidate) => notices.extend(upload.select(candidate)),
                    Err(rejection) => notices.push(UploadState::unreadable(&rejection)),
                },
                UploadCommand::Submit => {
                    if let Some(file) = upload.begin_upload() {
                        info!(file = %file.name, "uploading file");
                        state.spawn_upload(file);
                    }
                }
                UploadCommand::Reset => upload.reset(),
            }
        }
        UserCommand::Quit => {}
    }

    for notice in notices {
        let _ = ui_tx.send(UiUpdate::Notify(notice)).await;
    }
    let _ = ui_tx.send(UiUpdate::Page(state.page.snapshot())).await;
}

/// Stat each path, splitting readable candidates from unreadable ones.
fn inspect_paths(paths: Vec<PathBuf>) -> (Vec<LocalFile>, Vec<Notification>) {
    let mut candidates = Vec::new();
    let mut notices = Vec::new();
    for path in paths {
        match LocalFile::from_path(&path) {
            Ok(file) => candidates.push(file),
            Err(rejection) => {
                warn!(path = %path.display(), %rejection, "cannot inspect file");
                notices.push(rejection_notice(&rejection));
            }
        }
    }
    (candidates, notices)
}

// ---------------------------------------------------------------------------
// Request outcomes
// ---------------------------------------------------------------------------

/// Apply an event posted by a request task.
///
/// **Generation check**: events issued by a page mount other than the
/// current one are discarded, so a late response never touches a page the
/// user has navigated away from.
pub async fn handle_app_event(
    state: &mut AppState,
    event: AppEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if event.generation() != state.generation {
        debug!(
            "Discarding stale event (event gen: {}, current gen: {})",
            event.generation(),
            state.generation
        );
        return;
    }

    let mut registered = false;

    match (&mut state.page, event) {
        (ActivePage::Chat(chat), AppEvent::MarketsLoaded { result, .. }) => match result {
            Ok(markets) => {
                info!(count = markets.len(), "markets loaded");
                chat.set_markets(markets);
            }
            Err(e) => warn!("Failed to fetch markets: {}", e),
        },
        (ActivePage::Chat(chat), AppEvent::EntryQuestionsLoaded { market, result, .. }) => {
            match result {
                Ok(questions) => {
                    chat.apply_entry_questions(&market, questions);
                }
                Err(e) => warn!(%market, "Failed to fetch entry questions: {}", e),
            }
        }
        (ActivePage::Chat(chat), AppEvent::ChatReply { result, .. }) => {
            if let Err(e) = &result {
                warn!("Chat request failed: {}", e);
            }
            chat.complete_turn(result);
        }
        (ActivePage::Registration(form), AppEvent::RegistrationFinished { result, .. }) => {
            registered = result.is_ok();
            match form.finish(result) {
                Some(notice) => {
                    let _ = ui_tx.send(UiUpdate::Notify(notice)).await;
                }
                None => info!(market = %form.name.value(), "market registration succeeded"),
            }
        }
        (ActivePage::Registration(form), AppEvent::RegistrationResetDue { .. }) => {
            state.reset_timer = None;
            if form.status == RegistrationStatus::Success {
                debug!("resetting registration form");
                form.reset();
            }
        }
        (ActivePage::Upload(upload), AppEvent::UploadFinished { result, .. }) => {
            let notice = upload.finish(result);
            let _ = ui_tx.send(UiUpdate::Notify(notice)).await;
        }
        (page, event) => {
            debug!(page = ?page.page(), ?event, "event does not apply to mounted page");
            return;
        }
    }

    if registered {
        let _ = ui_tx.send(UiUpdate::Celebrate).await;
        state.schedule_reset();
    }
    let _ = ui_tx.send(UiUpdate::Page(state.page.snapshot())).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
