// Workflow state for the market playground: chat, market registration and
// the legacy single-file uploader, plus the file validation and text input
// primitives they share. Nothing here performs I/O against the backend;
// operations return the request to issue and the caller executes it.

pub mod chat;
pub mod files;
pub mod notify;
pub mod registration;
pub mod text;
pub mod upload;
