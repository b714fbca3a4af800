// Single-buffer text input used by the chat box and the registration form.

/// An edit applied to a [`TextInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Backspace,
    Clear,
    /// Pasted text, appended as-is.
    Paste(String),
}

/// Append-only text buffer with backspace. The cursor always sits at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the buffer is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn apply(&mut self, edit: TextEdit) {
        match edit {
            TextEdit::Insert(c) => self.value.push(c),
            TextEdit::Backspace => {
                self.value.pop();
            }
            TextEdit::Clear => self.value.clear(),
            TextEdit::Paste(text) => self.value.push_str(&text),
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Take the current value, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        TextInput {
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace() {
        let mut input = TextInput::new();
        input.apply(TextEdit::Insert('h'));
        input.apply(TextEdit::Insert('i'));
        assert_eq!(input.value(), "hi");
        input.apply(TextEdit::Backspace);
        assert_eq!(input.value(), "h");
    }

    #[test]
    fn backspace_on_empty_is_noop() {
        let mut input = TextInput::new();
        input.apply(TextEdit::Backspace);
        assert_eq!(input.value(), "");
    }

    #[test]
    fn backspace_removes_whole_multibyte_char() {
        let mut input = TextInput::from("سم");
        input.apply(TextEdit::Backspace);
        assert_eq!(input.value(), "س");
    }

    #[test]
    fn paste_appends_text() {
        let mut input = TextInput::from("a ");
        input.apply(TextEdit::Paste("b c".to_string()));
        assert_eq!(input.value(), "a b c");
    }

    #[test]
    fn blank_detection() {
        assert!(TextInput::new().is_blank());
        assert!(TextInput::from("  \t\n").is_blank());
        assert!(!TextInput::from(" x ").is_blank());
    }

    #[test]
    fn take_empties_buffer() {
        let mut input = TextInput::from("hello");
        assert_eq!(input.take(), "hello");
        assert_eq!(input.value(), "");
    }
}
