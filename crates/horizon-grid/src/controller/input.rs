//! The new-row text input.

use serde::Serialize;

/// A key delivered to the new-row input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Enter,
    Escape,
    Backspace,
    Char(char),
}

/// Text and focus of the input used to name new rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewRowInput {
    text: String,
    focused: bool,
}

impl NewRowInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Take the text for submission, leaving the input empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Handle a key press. Returns the text to submit when Enter is pressed
    /// while focused; the input is cleared whether or not it is blank.
    ///
    /// Keys are ignored while the input is not focused.
    pub fn handle_key(&mut self, key: InputKey) -> Option<String> {
        if !self.focused {
            return None;
        }
        match key {
            InputKey::Enter => Some(self.take()),
            InputKey::Escape => {
                self.text.clear();
                None
            }
            InputKey::Backspace => {
                self.text.pop();
                None
            }
            InputKey::Char(c) => {
                self.text.push(c);
                None
            }
        }
    }
}
