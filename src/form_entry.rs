//! Form Entry Controls
//!
//! Platform-neutral state for the password-toggle text entry and the
//! label + entry + button form cell. Renderers apply the returned outcomes;
//! the owning screen invokes the commands directly.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Return key behaviour of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnType {
    Go,
    Next,
    Search,
    Send,
    #[default]
    Done,
}

impl ReturnType {
    /// Label shown on the keyboard action key
    pub fn action_label(&self) -> &'static str {
        match self {
            ReturnType::Go => "Go",
            ReturnType::Next => "Next",
            ReturnType::Search => "Search",
            ReturnType::Send => "Send",
            ReturnType::Done => "Done",
        }
    }
}

/// Text selection as a character range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

/// What the renderer must do after a password toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub masked: bool,
    pub selection: Selection,
    pub request_focus: bool,
    pub show_keyboard: bool,
}

/// Result of the editor's return action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedAction {
    /// Move focus to the next field in the form
    FocusNext,
    Unfocus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    text: String,
    is_password: bool,
    toggled: bool,
    selection: Selection,
    pub return_type: ReturnType,
    pub max_length: Option<usize>,
    pub has_border: bool,
    pub monospace: bool,
    pub focused: bool,
}

impl EntryState {
    pub fn new(is_password: bool) -> Self {
        Self {
            text: String::new(),
            is_password,
            toggled: false,
            selection: Selection::default(),
            return_type: ReturnType::default(),
            max_length: None,
            has_border: false,
            monospace: false,
            focused: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_password(&self) -> bool {
        self.is_password
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let len = self.char_len();
        self.selection = Selection {
            start: selection.start.min(len),
            end: selection.end.min(len),
        };
    }

    /// Replace the current selection with `input`, honouring `max_length`.
    ///
    /// Returns the number of characters actually inserted.
    pub fn insert_text(&mut self, input: &str) -> usize {
        let (start, end) = (
            self.selection.start.min(self.selection.end),
            self.selection.start.max(self.selection.end),
        );
        let chars: Vec<char> = self.text.chars().collect();
        let remaining = self
            .max_length
            .map(|max| max.saturating_sub(chars.len() - (end - start)))
            .unwrap_or(usize::MAX);
        let inserted: Vec<char> = input.chars().take(remaining).collect();
        let count = inserted.len();

        self.text = chars[..start]
            .iter()
            .chain(inserted.iter())
            .chain(chars[end..].iter())
            .collect();
        self.selection = Selection::caret(start + count);
        count
    }

    /// Flip between masked and plain text.
    ///
    /// The first toggle puts the caret at the end of the text; later toggles
    /// keep the selection the user had.
    pub fn toggle_is_password(&mut self) -> ToggleOutcome {
        if !self.toggled {
            self.selection = Selection::caret(self.char_len());
        }
        self.is_password = !self.is_password;
        self.toggled = true;
        self.focused = true;
        debug!("Entry masking toggled, masked={}", self.is_password);

        ToggleOutcome {
            masked: self.is_password,
            selection: self.selection,
            request_focus: true,
            show_keyboard: true,
        }
    }

    /// The editor's return key was pressed
    pub fn complete(&mut self) -> CompletedAction {
        if self.return_type == ReturnType::Next {
            CompletedAction::FocusNext
        } else {
            self.focused = false;
            CompletedAction::Unfocus
        }
    }
}

/// A form row: optional label, the entry, and optional image and button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntryCell {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub entry: EntryState,
    pub image_source: Option<String>,
    pub has_button: bool,
    next_field: Option<String>,
}

impl FormEntryCell {
    pub fn new(label_text: &str, is_password: bool) -> Self {
        Self {
            label: Some(label_text.to_string()),
            placeholder: None,
            entry: EntryState::new(is_password),
            image_source: None,
            has_button: false,
            next_field: None,
        }
    }

    /// Show the label text inside the entry instead of above it
    pub fn with_label_as_placeholder(mut self) -> Self {
        self.placeholder = self.label.take();
        self
    }

    pub fn with_image(mut self, source: &str) -> Self {
        self.image_source = Some(source.to_string());
        self
    }

    pub fn with_button(mut self) -> Self {
        self.has_button = true;
        self
    }

    /// Chain return-key focus to another field
    pub fn with_next_field(mut self, field_id: &str) -> Self {
        self.next_field = Some(field_id.to_string());
        self.entry.return_type = ReturnType::Next;
        self
    }

    pub fn next_field(&self) -> Option<&str> {
        self.next_field.as_deref()
    }

    pub fn tap(&mut self) {
        self.entry.focused = true;
    }

    pub fn image_tapped(&mut self) {
        if self.image_source.is_some() {
            self.entry.focused = true;
        }
    }

    /// Return key on the entry; yields the field to focus next, if any
    pub fn complete(&mut self) -> Option<&str> {
        match self.entry.complete() {
            CompletedAction::FocusNext => {
                self.entry.focused = false;
                self.next_field.as_deref()
            }
            CompletedAction::Unfocus => None,
        }
    }
}
