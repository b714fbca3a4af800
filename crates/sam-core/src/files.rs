// Local reference documents: metadata, type/size validation and parsing of
// dropped (pasted) file paths.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Per-file upload cap (5 MiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

const MIME_FALLBACK: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("{name} exceeds the 5MB limit.")]
    TooLarge { name: String, size: u64 },

    #[error("{name} is not a PDF or text file.")]
    InvalidType { name: String, mime: String },

    #[error("{} could not be read: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// A file on the local disk, described by the metadata the backend needs.
/// Contents are read only when the file is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// File name without directories, used as the multipart file name.
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl LocalFile {
    /// Describe a file from its path and size. The MIME type is derived from
    /// the extension.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let mime = guess_mime(&path);
        LocalFile {
            path,
            name,
            size,
            mime,
        }
    }

    /// Stat a file on disk.
    pub fn from_path(path: &Path) -> Result<Self, FileRejection> {
        let metadata = std::fs::metadata(path).map_err(|e| FileRejection::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(FileRejection::Unreadable {
                path: path.to_path_buf(),
                message: "not a regular file".to_string(),
            });
        }
        Ok(LocalFile::new(path, metadata.len()))
    }

    pub fn is_accepted_type(&self) -> bool {
        self.mime == MIME_PDF || self.mime == MIME_TEXT
    }

    pub fn exceeds_size_limit(&self) -> bool {
        self.size > MAX_FILE_SIZE
    }

    /// Size in megabytes with two decimals, e.g. `"4.00 MB"`.
    pub fn size_label(&self) -> String {
        format_size_mb(self.size)
    }
}

/// MIME type from the file extension. PDF and plain-text extensions are
/// resolved explicitly so `.text` files are accepted like `.txt`.
pub fn guess_mime(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => MIME_PDF.to_string(),
        Some("txt") | Some("text") => MIME_TEXT.to_string(),
        _ => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(MIME_FALLBACK)
            .to_string(),
    }
}

pub fn format_size_mb(size: u64) -> String {
    format!("{:.2} MB", size as f64 / 1024.0 / 1024.0)
}

/// Parse text pasted into the terminal as a list of file paths.
///
/// Terminals deliver dragged files as pasted text: one or more paths,
/// possibly single/double-quoted, backslash-escaped, or as `file://` URIs.
/// Paths are separated by whitespace or newlines.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    text.lines()
        .flat_map(split_words)
        .filter(|w| !w.is_empty())
        .map(|w| decode_file_uri(&w).unwrap_or(w))
        .map(PathBuf::from)
        .collect()
}

fn split_words(line: &str) -> Vec<String> {
    let escapes = !cfg!(windows);
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' && escapes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' if escapes => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        in_word = true;
                    }
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

fn decode_file_uri(word: &str) -> Option<String> {
    let rest = word.strip_prefix("file://")?;
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    urlencoding::decode(rest).ok().map(|s| s.into_owned())
}
