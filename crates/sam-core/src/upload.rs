// Single-file uploader: one PDF or text document posted on its own.

use tracing::info;

use crate::files::{FileRejection, LocalFile};
use crate::notify::Notification;

const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct UploadState {
    file: Option<LocalFile>,
    pub status: UploadStatus,
}

impl Default for UploadState {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadState {
    pub fn new() -> Self {
        UploadState {
            file: None,
            status: UploadStatus::Idle,
        }
    }

    pub fn file(&self) -> Option<&LocalFile> {
        self.file.as_ref()
    }

    /// Choose the file to upload, replacing any previous choice.
    ///
    /// The type is checked before the size. A rejected candidate leaves the
    /// current choice untouched.
    pub fn select(&mut self, candidate: LocalFile) -> Option<Notification> {
        if !candidate.is_accepted_type() {
            return Some(Notification::error(
                "Invalid file type",
                "Please upload a PDF file.",
            ));
        }
        if candidate.exceeds_size_limit() {
            return Some(Notification::error(
                "File too large",
                "The maximum file size is 5MB.",
            ));
        }
        self.file = Some(candidate);
        None
    }

    /// Notification for a file that could not be inspected at all.
    pub fn unreadable(rejection: &FileRejection) -> Notification {
        Notification::error("File not readable", rejection.to_string())
    }

    pub fn can_upload(&self) -> bool {
        self.file.is_some() && self.status == UploadStatus::Idle
    }

    pub fn begin_upload(&mut self) -> Option<LocalFile> {
        if !self.can_upload() {
            return None;
        }
        self.status = UploadStatus::Uploading;
        self.file.clone()
    }

    /// Settle the upload. `Ok` carries the stored file URL when the server
    /// returns one.
    pub fn finish(&mut self, outcome: Result<Option<String>, String>) -> Notification {
        match outcome {
            Ok(file_url) => {
                if let Some(url) = file_url {
                    info!(%url, "file uploaded");
                }
                self.status = UploadStatus::Success;
                Notification::info("Upload successful", "Your PDF has been uploaded.")
            }
            Err(message) => {
                self.status = UploadStatus::Error;
                let description = if message.trim().is_empty() {
                    UNKNOWN_ERROR.to_string()
                } else {
                    message
                };
                Notification::error("Upload failed", description)
            }
        }
    }

    /// Clear the file and return to idle ("Upload Another" / "Try Again").
    pub fn reset(&mut self) {
        self.file = None;
        self.status = UploadStatus::Idle;
    }
}
