// Market registration workflow: a name, a generation prompt, a sampling
// temperature and a queue of reference documents, submitted together.

use std::time::Duration;

use tracing::debug;

use crate::files::{FileRejection, LocalFile};
use crate::notify::Notification;
use crate::text::{TextEdit, TextInput};

pub const DEFAULT_TEMPERATURE: f64 = 0.5;

/// Slider granularity.
pub const TEMPERATURE_STEP: f64 = 0.01;
const STEPS_PER_UNIT: f64 = 100.0;

/// How long the success screen stays up before the form resets itself.
pub const SUCCESS_RESET_DELAY: Duration = Duration::from_secs(5);

const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Idle,
    Registering,
    Success,
    Error,
}

/// Everything the registration endpoint receives.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub market: String,
    pub prompt: String,
    pub temperature: f64,
    pub files: Vec<LocalFile>,
}

/// State of the registration form for one mount.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub name: TextInput,
    pub prompt: TextInput,
    temperature: f64,
    files: Vec<LocalFile>,
    pub status: RegistrationStatus,
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationState {
    pub fn new() -> Self {
        RegistrationState {
            name: TextInput::new(),
            prompt: TextInput::new(),
            temperature: DEFAULT_TEMPERATURE,
            files: Vec::new(),
            status: RegistrationStatus::Idle,
        }
    }

    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Temperature as shown next to the slider, e.g. `"0.50"`.
    pub fn temperature_label(&self) -> String {
        format!("{:.2}", self.temperature)
    }

    pub fn edit_name(&mut self, edit: TextEdit) {
        self.name.apply(edit);
    }

    pub fn edit_prompt(&mut self, edit: TextEdit) {
        self.prompt.apply(edit);
    }

    /// Set the temperature, clamped to [0, 1] and snapped to the slider step.
    pub fn set_temperature(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        // Dividing keeps the value the nearest double to k/100, so it prints
        // as 0.57 rather than 0.5700000000000001.
        let steps = (value.clamp(0.0, 1.0) / TEMPERATURE_STEP).round();
        self.temperature = (steps / STEPS_PER_UNIT).clamp(0.0, 1.0);
    }

    pub fn nudge_temperature(&mut self, delta: f64) {
        self.set_temperature(self.temperature + delta);
    }

    /// Validate and enqueue candidate files.
    ///
    /// Each candidate is checked on its own: oversized files and files that
    /// are neither PDF nor plain text are rejected with a notification and
    /// never enter the queue. Accepted files are appended in order;
    /// duplicates are kept.
    pub fn add_files(&mut self, candidates: Vec<LocalFile>) -> Vec<Notification> {
        let mut notices = Vec::new();
        for candidate in candidates {
            match validate(&candidate) {
                Ok(()) => {
                    debug!(file = %candidate.name, size = candidate.size, "file queued");
                    self.files.push(candidate);
                }
                Err(rejection) => notices.push(rejection_notice(&rejection)),
            }
        }
        notices
    }

    /// Remove the queued file at `index`. Out-of-range indexes are ignored.
    pub fn remove_file(&mut self, index: usize) -> Option<LocalFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    /// Submission requires a name, a prompt and at least one file, and no
    /// registration already in flight.
    pub fn can_submit(&self) -> bool {
        self.status != RegistrationStatus::Registering
            && !self.name.is_blank()
            && !self.prompt.is_blank()
            && !self.files.is_empty()
    }

    /// Enter the in-flight state and return the payload to post.
    pub fn begin_submit(&mut self) -> Option<RegistrationRequest> {
        if !self.can_submit() {
            return None;
        }
        self.status = RegistrationStatus::Registering;
        Some(RegistrationRequest {
            market: self.name.value().to_string(),
            prompt: self.prompt.value().to_string(),
            temperature: self.temperature,
            files: self.files.clone(),
        })
    }

    /// Settle the in-flight registration.
    ///
    /// On failure the form is kept for correction and a notification carrying
    /// the server's message (or a generic one) is returned.
    pub fn finish(&mut self, outcome: Result<(), String>) -> Option<Notification> {
        match outcome {
            Ok(()) => {
                self.status = RegistrationStatus::Success;
                None
            }
            Err(message) => {
                self.status = RegistrationStatus::Error;
                let description = if message.trim().is_empty() {
                    UNKNOWN_ERROR.to_string()
                } else {
                    message
                };
                Some(Notification::error("Registration failed", description))
            }
        }
    }

    /// Back to the initial form.
    pub fn reset(&mut self) {
        *self = RegistrationState::new();
    }
}

fn validate(file: &LocalFile) -> Result<(), FileRejection> {
    if file.exceeds_size_limit() {
        return Err(FileRejection::TooLarge {
            name: file.name.clone(),
            size: file.size,
        });
    }
    if !file.is_accepted_type() {
        return Err(FileRejection::InvalidType {
            name: file.name.clone(),
            mime: file.mime.clone(),
        });
    }
    Ok(())
}

/// Notification for a rejected file.
pub fn rejection_notice(rejection: &FileRejection) -> Notification {
    let title = match rejection {
        FileRejection::TooLarge { .. } => "File too large",
        FileRejection::InvalidType { .. } => "Invalid file type",
        FileRejection::Unreadable { .. } => "File not readable",
    };
    Notification::error(title, rejection.to_string())
}
