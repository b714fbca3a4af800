// HTTP access to the market service: catalog, entry questions, chat turns,
// market registration and the legacy single-file upload.

pub mod client;
pub mod error;

pub use client::{HttpBackend, MarketBackend, RegistrationReply, UploadReply};
pub use error::BackendError;
