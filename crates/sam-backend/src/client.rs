// REST client for the market service.
//
// Reads return JSON string arrays, the chat endpoint returns the reply as the
// raw response body, and the two upload endpoints answer with a JSON
// `{ success, message }` envelope. All writes are multipart forms.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use sam_core::chat::ChatRequest;
use sam_core::files::LocalFile;
use sam_core::registration::RegistrationRequest;

use crate::error::BackendError;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Server acknowledgement of a registered market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReply {
    pub message: String,
}

/// Server acknowledgement of a legacy upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReply {
    pub message: String,
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegistrationResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(rename = "fileUrl", default)]
    file_url: Option<String>,
}

// ---------------------------------------------------------------------------
// MarketBackend
// ---------------------------------------------------------------------------

/// Operations the playground performs against the market service.
#[async_trait]
pub trait MarketBackend: Send + Sync {
    /// `GET /markets/names`
    async fn market_names(&self) -> Result<Vec<String>, BackendError>;

    /// `GET /markets/{market}/entry-questions`
    async fn entry_questions(&self, market: &str) -> Result<Vec<String>, BackendError>;

    /// `POST /chat`, returning the assistant reply text.
    async fn send_chat(&self, request: &ChatRequest) -> Result<String, BackendError>;

    /// `POST /markets/register`
    async fn register_market(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReply, BackendError>;

    /// `POST` a single file to the legacy upload endpoint.
    async fn upload_file(&self, file: &LocalFile) -> Result<UploadReply, BackendError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// reqwest-backed [`MarketBackend`].
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    upload_url: String,
}

impl HttpBackend {
    /// `base_url` is the service root (no trailing slash); `upload_url` is
    /// the full address of the legacy upload endpoint.
    pub fn new(base_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_url: upload_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_text(&self, req: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "backend request failed");
            return Err(BackendError::Status { status, body });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl MarketBackend for HttpBackend {
    async fn market_names(&self) -> Result<Vec<String>, BackendError> {
        let body = self.send_text(self.http.get(self.url("/markets/names"))).await?;
        parse_string_list(&body)
    }

    async fn entry_questions(&self, market: &str) -> Result<Vec<String>, BackendError> {
        let path = format!("/markets/{}/entry-questions", urlencoding::encode(market));
        let body = self.send_text(self.http.get(self.url(&path))).await?;
        parse_string_list(&body)
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let form = Form::new()
            .text("chatId", request.chat_id.clone())
            .text("message", request.message.clone())
            .text("market", request.market.clone());
        debug!(market = %request.market, "posting chat turn");
        self.send_text(self.http.post(self.url("/chat")).multipart(form))
            .await
    }

    async fn register_market(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReply, BackendError> {
        let mut form = Form::new()
            .text("market", request.market.clone())
            .text("prompt", request.prompt.clone())
            .text("temperature", format_temperature(request.temperature));
        for file in &request.files {
            form = form.part("files", file_part(file).await?);
        }
        debug!(
            market = %request.market,
            files = request.files.len(),
            "registering market"
        );

        let body = self
            .send_text(self.http.post(self.url("/markets/register")).multipart(form))
            .await?;
        parse_registration_response(&body)
    }

    async fn upload_file(&self, file: &LocalFile) -> Result<UploadReply, BackendError> {
        let form = Form::new().part("file", file_part(file).await?);
        debug!(file = %file.name, url = %self.upload_url, "uploading file");
        let body = self
            .send_text(self.http.post(&self.upload_url).multipart(form))
            .await?;
        parse_upload_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a file from disk into a multipart part carrying its name and type.
async fn file_part(file: &LocalFile) -> Result<Part, BackendError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| BackendError::Io {
            path: file.path.clone(),
            source,
        })?;
    Part::bytes(bytes)
        .file_name(file.name.clone())
        .mime_str(&file.mime)
        .map_err(|_| BackendError::InvalidMime {
            name: file.name.clone(),
            mime: file.mime.clone(),
        })
}

/// Shortest decimal form of the temperature: `0.5`, `0.73`, `1`.
pub(crate) fn format_temperature(temperature: f64) -> String {
    temperature.to_string()
}

/// Parse a JSON array into strings. Non-string scalars are kept in their JSON
/// text form.
pub(crate) fn parse_string_list(body: &str) -> Result<Vec<String>, BackendError> {
    let values: Vec<Value> =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

pub(crate) fn parse_registration_response(body: &str) -> Result<RegistrationReply, BackendError> {
    let resp: RegistrationResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    if resp.success {
        Ok(RegistrationReply {
            message: resp.message,
        })
    } else {
        Err(BackendError::Rejected {
            message: resp.message,
        })
    }
}

pub(crate) fn parse_upload_response(body: &str) -> Result<UploadReply, BackendError> {
    let resp: UploadResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    if resp.success {
        Ok(UploadReply {
            message: resp.message,
            file_url: resp.file_url,
        })
    } else {
        Err(BackendError::Rejected {
            message: resp.message,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_of_strings() {
        let list = parse_string_list(r#"["Coffee", "Tea"]"#).unwrap();
        assert_eq!(list, vec!["Coffee", "Tea"]);
    }

    #[test]
    fn string_list_keeps_order_and_stringifies_scalars() {
        let list = parse_string_list(r#"["b", 2, true, "a"]"#).unwrap();
        assert_eq!(list, vec!["b", "2", "true", "a"]);
    }

    #[test]
    fn string_list_empty() {
        assert!(parse_string_list("[]").unwrap().is_empty());
    }

    #[test]
    fn string_list_rejects_non_array() {
        let err = parse_string_list(r#"{"markets": []}"#).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        assert!(matches!(parse_string_list("oops"), Err(BackendError::Decode(_))));
    }

    #[test]
    fn registration_success() {
        let reply =
            parse_registration_response(r#"{"success": true, "message": "registered"}"#).unwrap();
        assert_eq!(reply.message, "registered");
    }

    #[test]
    fn registration_rejected_carries_message() {
        let err = parse_registration_response(r#"{"success": false, "message": "duplicate"}"#)
            .unwrap_err();
        match err {
            BackendError::Rejected { message } => assert_eq!(message, "duplicate"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn registration_missing_message_defaults_to_empty() {
        let err = parse_registration_response(r#"{"success": false}"#).unwrap_err();
        assert_eq!(err.user_message("Registration failed"), "");
    }

    #[test]
    fn registration_invalid_json() {
        assert!(matches!(
            parse_registration_response("<html>"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn upload_success_with_file_url() {
        let reply = parse_upload_response(
            r#"{"success": true, "message": "ok", "fileUrl": "http://files/a.pdf"}"#,
        )
        .unwrap();
        assert_eq!(reply.file_url.as_deref(), Some("http://files/a.pdf"));
    }

    #[test]
    fn upload_success_without_file_url() {
        let reply = parse_upload_response(r#"{"success": true, "message": "ok"}"#).unwrap();
        assert!(reply.file_url.is_none());
    }

    #[test]
    fn upload_rejected() {
        let err = parse_upload_response(r#"{"success": false, "message": "too big"}"#).unwrap_err();
        assert_eq!(err.user_message("Upload failed"), "too big");
    }

    #[test]
    fn temperature_formatting() {
        assert_eq!(format_temperature(0.5), "0.5");
        assert_eq!(format_temperature(0.73), "0.73");
        assert_eq!(format_temperature(1.0), "1");
        assert_eq!(format_temperature(0.0), "0");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/", "http://localhost:8080/upload");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/chat"), "http://localhost:8000/chat");
    }

    #[tokio::test]
    async fn file_part_missing_file_is_io_error() {
        let file = LocalFile::new("/definitely/not/here.pdf", 10);
        let result = file_part(&file).await;
        assert!(matches!(result, Err(BackendError::Io { .. })));
    }
}
