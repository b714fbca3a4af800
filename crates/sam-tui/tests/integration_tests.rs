// End-to-end tests: the app event loop talking to a mock market service
// through the real HTTP backend.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sam_backend::HttpBackend;
use sam_core::chat::Role;
use sam_core::registration::RegistrationStatus;
use sam_core::text::TextEdit;
use sam_core::upload::UploadStatus;
use sam_tui::app::{self, AppState};
use sam_tui::config::{BackendConfig, Config, UiConfig};
use sam_tui::protocol::{
    ChatCommand, CreatePage, Page, PageSnapshot, RegistrationCommand, UiUpdate, UploadCommand,
    UserCommand,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Mock market service
// ---------------------------------------------------------------------------

/// Canned response for one request.
struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn json(value: serde_json::Value) -> Self {
        Reply {
            status: "200 OK",
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    fn text(status: &'static str, body: &str) -> Self {
        Reply {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

/// Serves any number of connections, one request each, answering with the
/// reply `route` picks for the request line. Every raw request is recorded.
struct MockService {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockService {
    async fn start<F>(route: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let request = read_request(&mut socket).await;
                let request_line = request.lines().next().unwrap_or_default().to_string();
                let reply = route(&request_line);
                log.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reply.content_type,
                    reply.body.len(),
                    reply.body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            }
        });

        MockService {
            base: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    fn request_lines(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.lines().next().unwrap_or_default().to_string())
            .collect()
    }

    fn request_containing(&self, needle: &str) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.contains(needle))
            .cloned()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body_len = buf.len() - header_end;
        let done = match content_length {
            Some(len) => body_len >= len,
            None if chunked => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if done {
            break;
        }
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Routes shared by the tests: two markets, entry questions per market.
fn market_routes(chat: fn() -> Reply) -> impl Fn(&str) -> Reply + Send + Sync + 'static {
    move |line: &str| {
        if line.starts_with("GET /markets/names ") {
            Reply::json(json!(["A", "B"]))
        } else if line.starts_with("GET /markets/B/entry-questions ") {
            Reply::json(json!(["What is fresh?", "When do you open?"]))
        } else if line.starts_with("GET /markets/") {
            Reply::json(json!([]))
        } else if line.starts_with("POST /chat ") {
            chat()
        } else if line.starts_with("POST /markets/register ") {
            Reply::json(json!({ "success": true, "message": "Market registered" }))
        } else if line.starts_with("POST /upload ") {
            Reply::json(json!({
                "success": true,
                "message": "stored",
                "fileUrl": "http://files.local/doc.pdf"
            }))
        } else {
            Reply::text("404 Not Found", "no route")
        }
    }
}

// ---------------------------------------------------------------------------
// App harness
// ---------------------------------------------------------------------------

struct Running {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    app: JoinHandle<anyhow::Result<()>>,
}

fn config(base: &str, start_page: Page, create_page: CreatePage) -> Config {
    Config {
        backend: BackendConfig {
            base_url: base.to_string(),
            upload_url: format!("{base}/upload"),
        },
        ui: UiConfig {
            create_page,
            start_page,
        },
    }
}

fn start_app(config: Config) -> Running {
    let backend = Arc::new(HttpBackend::new(
        config.backend.base_url.clone(),
        config.backend.upload_url.clone(),
    ));
    let (event_tx, event_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let state = AppState::new(&config, backend, event_tx);
    let app = tokio::spawn(app::run(event_rx, cmd_rx, ui_tx, state));
    Running { cmd_tx, ui_rx, app }
}

impl Running {
    async fn send(&self, command: UserCommand) {
        self.cmd_tx.send(command).await.unwrap();
    }

    /// Read updates until one satisfies `pred`, panicking after a few seconds.
    async fn wait_for<F>(&mut self, what: &str, mut pred: F) -> UiUpdate
    where
        F: FnMut(&UiUpdate) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let update = tokio::time::timeout_at(deadline, self.ui_rx.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
                .unwrap_or_else(|| panic!("app stopped while waiting for {what}"));
            if pred(&update) {
                return update;
            }
        }
    }

    async fn shutdown(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), self.app)
            .await
            .expect("app loop did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}

fn chat_of(update: &UiUpdate) -> Option<&sam_core::chat::ChatState> {
    match update {
        UiUpdate::Mounted(PageSnapshot::Chat(chat)) | UiUpdate::Page(PageSnapshot::Chat(chat)) => {
            Some(chat)
        }
        _ => None,
    }
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_round_trip_against_http_backend() {
    let service =
        MockService::start(market_routes(|| Reply::text("200 OK", "Fresh beans today"))).await;
    let mut app = start_app(config(&service.base, Page::Chat, CreatePage::Registrator));

    app.wait_for("market list", |u| {
        chat_of(u).is_some_and(|c| c.markets == vec!["A", "B"])
    })
    .await;

    app.send(UserCommand::Chat(ChatCommand::SelectMarket("B".into())))
        .await;
    app.wait_for("entry questions", |u| {
        chat_of(u).is_some_and(|c| c.entry_questions.len() == 2)
    })
    .await;

    app.send(UserCommand::Chat(ChatCommand::AskQuestion(0))).await;
    let update = app
        .wait_for("assistant reply", |u| {
            chat_of(u).is_some_and(|c| !c.loading && c.messages().len() == 2)
        })
        .await;

    let chat = chat_of(&update).unwrap();
    assert_eq!(chat.messages()[0].role, Role::User);
    assert_eq!(chat.messages()[0].content, "What is fresh?");
    assert_eq!(chat.messages()[1].role, Role::Assistant);
    assert_eq!(chat.messages()[1].content, "Fresh beans today");

    let lines = service.request_lines();
    assert!(lines.iter().any(|l| l.starts_with("GET /markets/B/entry-questions ")));
    let chat_request = service
        .request_containing("POST /chat ")
        .expect("chat turn posted");
    assert!(chat_request.contains("name=\"market\""));
    assert!(chat_request.contains("What is fresh?"));
    assert!(chat_request.contains(chat.session_id()));

    app.shutdown().await;
}

#[tokio::test]
async fn chat_server_error_keeps_only_user_message() {
    let service =
        MockService::start(market_routes(|| Reply::text("500 Internal Server Error", "boom")))
            .await;
    let mut app = start_app(config(&service.base, Page::Chat, CreatePage::Registrator));

    app.wait_for("market list", |u| chat_of(u).is_some_and(|c| !c.markets.is_empty()))
        .await;
    app.send(UserCommand::Chat(ChatCommand::SelectMarket("A".into())))
        .await;
    app.send(UserCommand::Chat(ChatCommand::Edit(TextEdit::Paste(
        "Anything left?".into(),
    ))))
    .await;
    app.send(UserCommand::Chat(ChatCommand::SubmitInput)).await;

    app.wait_for("request in flight", |u| chat_of(u).is_some_and(|c| c.loading))
        .await;
    let update = app
        .wait_for("failed turn settled", |u| chat_of(u).is_some_and(|c| !c.loading))
        .await;

    let chat = chat_of(&update).unwrap();
    assert_eq!(chat.messages().len(), 1);
    assert_eq!(chat.messages()[0].content, "Anything left?");
    assert!(chat.input_enabled());

    app.shutdown().await;
}

// ---------------------------------------------------------------------------
// Create page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registration_success_celebrates() {
    let service = MockService::start(market_routes(|| Reply::text("200 OK", ""))).await;
    let dir = tempfile::tempdir().unwrap();
    let menu = write_file(dir.path(), "menu.pdf", b"%PDF-1.4 menu");

    let mut app = start_app(config(&service.base, Page::Create, CreatePage::Registrator));
    app.wait_for("registration form", |u| {
        matches!(u, UiUpdate::Mounted(PageSnapshot::Registration(_)))
    })
    .await;

    app.send(UserCommand::Registration(RegistrationCommand::EditName(
        TextEdit::Paste("Coffee".into()),
    )))
    .await;
    app.send(UserCommand::Registration(RegistrationCommand::EditPrompt(
        TextEdit::Paste("Answer like a barista".into()),
    )))
    .await;
    app.send(UserCommand::Registration(RegistrationCommand::SetTemperature(0.7)))
        .await;
    app.send(UserCommand::Registration(RegistrationCommand::AddPaths(vec![menu])))
        .await;
    app.send(UserCommand::Registration(RegistrationCommand::Submit))
        .await;

    app.wait_for("celebration", |u| matches!(u, UiUpdate::Celebrate))
        .await;
    let update = app
        .wait_for("success screen", |u| {
            matches!(u, UiUpdate::Page(PageSnapshot::Registration(form))
                if form.status == RegistrationStatus::Success)
        })
        .await;
    if let UiUpdate::Page(PageSnapshot::Registration(form)) = update {
        assert_eq!(form.name.value(), "Coffee");
    }

    let request = service
        .request_containing("POST /markets/register ")
        .expect("registration posted");
    assert!(request.contains("name=\"market\""));
    assert!(request.contains("Coffee"));
    assert!(request.contains("Answer like a barista"));
    assert!(request.contains("0.7"));
    assert!(request.contains("filename=\"menu.pdf\""));
    assert!(request.contains("%PDF-1.4 menu"));

    app.shutdown().await;
}

#[tokio::test]
async fn legacy_upload_success() {
    let service = MockService::start(market_routes(|| Reply::text("200 OK", ""))).await;
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(dir.path(), "doc.pdf", b"%PDF-1.4 doc");

    let mut app = start_app(config(&service.base, Page::Create, CreatePage::Uploader));
    app.wait_for("uploader", |u| {
        matches!(u, UiUpdate::Mounted(PageSnapshot::Upload(_)))
    })
    .await;

    app.send(UserCommand::Upload(UploadCommand::SelectPath(doc)))
        .await;
    app.send(UserCommand::Upload(UploadCommand::Submit)).await;

    let notice = app
        .wait_for("upload notice", |u| matches!(u, UiUpdate::Notify(_)))
        .await;
    if let UiUpdate::Notify(notification) = notice {
        assert!(!notification.is_error());
        assert_eq!(notification.title, "Upload successful");
    }
    app.wait_for("upload finished", |u| {
        matches!(u, UiUpdate::Page(PageSnapshot::Upload(upload))
            if upload.status == UploadStatus::Success)
    })
    .await;

    let request = service
        .request_containing("POST /upload ")
        .expect("file posted");
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"doc.pdf\""));

    app.shutdown().await;
}

#[tokio::test]
async fn navigation_remounts_pages() {
    let service = MockService::start(market_routes(|| Reply::text("200 OK", ""))).await;
    let mut app = start_app(config(&service.base, Page::Chat, CreatePage::Registrator));
    app.wait_for("first market list", |u| {
        chat_of(u).is_some_and(|c| c.markets.len() == 2)
    })
    .await;

    app.send(UserCommand::Navigate(Page::Create)).await;
    app.wait_for("create page", |u| {
        matches!(u, UiUpdate::Mounted(PageSnapshot::Registration(_)))
    })
    .await;

    app.send(UserCommand::Navigate(Page::Chat)).await;
    app.wait_for("fresh chat page with markets", |u| {
        chat_of(u).is_some_and(|c| c.markets.len() == 2 && c.messages().is_empty())
    })
    .await;

    let fetches = service
        .request_lines()
        .iter()
        .filter(|l| l.starts_with("GET /markets/names "))
        .count();
    assert_eq!(fetches, 2, "each chat mount fetches the catalog");

    app.shutdown().await;
}
