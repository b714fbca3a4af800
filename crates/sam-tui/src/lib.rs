// Library root: re-exports all modules so integration tests can drive the
// app loop and widgets directly.

pub mod app;
pub mod config;
pub mod protocol;
pub mod tui;
