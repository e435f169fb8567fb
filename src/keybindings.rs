//! Customizable keybindings.
//!
//! Navigation, class cycling and new-box are bound to configurable character
//! keys. Backspace, Escape, Enter and the digit keys have fixed meanings.

use crate::editor::EditorKey;

/// A key press as reported by a frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Escape,
    Enter,
}

/// Configurable editor commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    PreviousImage,
    NextImage,
    PreviousClass,
    NextClass,
    NewBox,
}

impl BoundAction {
    pub fn all() -> &'static [BoundAction] {
        &[
            BoundAction::PreviousImage,
            BoundAction::NextImage,
            BoundAction::PreviousClass,
            BoundAction::NextClass,
            BoundAction::NewBox,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BoundAction::PreviousImage => "Previous image",
            BoundAction::NextImage => "Next image",
            BoundAction::PreviousClass => "Previous class",
            BoundAction::NextClass => "Next class",
            BoundAction::NewBox => "New box",
        }
    }

    fn editor_key(&self) -> EditorKey {
        match self {
            BoundAction::PreviousImage => EditorKey::PreviousImage,
            BoundAction::NextImage => EditorKey::NextImage,
            BoundAction::PreviousClass => EditorKey::PreviousClass,
            BoundAction::NextClass => EditorKey::NextClass,
            BoundAction::NewBox => EditorKey::NewBox,
        }
    }
}

/// Keybinding configuration for the editor.
///
/// Every action may have several keys. Letters match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub previous_image: Vec<char>,
    pub next_image: Vec<char>,
    pub previous_class: Vec<char>,
    pub next_class: Vec<char>,
    pub new_box: Vec<char>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            previous_image: vec!['o', 'b'],
            next_image: vec!['p', 'm'],
            previous_class: vec!['k'],
            next_class: vec!['l'],
            new_box: vec!['n'],
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys bound to an action.
    pub fn keys_for(&self, action: BoundAction) -> &[char] {
        match action {
            BoundAction::PreviousImage => &self.previous_image,
            BoundAction::NextImage => &self.next_image,
            BoundAction::PreviousClass => &self.previous_class,
            BoundAction::NextClass => &self.next_class,
            BoundAction::NewBox => &self.new_box,
        }
    }

    /// Get the action bound to a character, if any.
    pub fn action_for_char(&self, c: char) -> Option<BoundAction> {
        let c = c.to_ascii_lowercase();
        BoundAction::all().iter().copied().find(|action| {
            self.keys_for(*action)
                .iter()
                .any(|k| k.to_ascii_lowercase() == c)
        })
    }

    /// Translate a key press into an editor command.
    ///
    /// Bound characters take precedence over digits.
    pub fn editor_key(&self, input: KeyInput) -> Option<EditorKey> {
        match input {
            KeyInput::Backspace => Some(EditorKey::DeleteSelected),
            KeyInput::Escape => Some(EditorKey::Cancel),
            KeyInput::Enter => Some(EditorKey::Confirm),
            KeyInput::Char(c) => {
                if let Some(action) = self.action_for_char(c) {
                    return Some(action.editor_key());
                }
                c.to_digit(10)
                    .and_then(|d| u8::try_from(d).ok())
                    .map(EditorKey::Digit)
            }
        }
    }

    /// Characters bound to more than one action.
    pub fn conflicts(&self) -> Vec<(char, BoundAction, BoundAction)> {
        let mut conflicts = Vec::new();
        let actions = BoundAction::all();
        for (i, first) in actions.iter().enumerate() {
            for second in &actions[i + 1..] {
                for c in self.keys_for(*first) {
                    let lower = c.to_ascii_lowercase();
                    if self
                        .keys_for(*second)
                        .iter()
                        .any(|k| k.to_ascii_lowercase() == lower)
                    {
                        conflicts.push((lower, *first, *second));
                    }
                }
            }
        }
        conflicts
    }

    /// One line per action, e.g. `Next image: p, m`.
    pub fn help_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = BoundAction::all()
            .iter()
            .map(|action| {
                let keys: Vec<String> = self.keys_for(*action).iter().map(|c| c.to_string()).collect();
                format!("{}: {}", action.name(), optional_keys_to_string(&keys))
            })
            .collect();
        lines.push("Delete selected: Backspace".to_string());
        lines.push("Quit: Escape".to_string());
        lines.push("Class id: right-click selected box, type digits, Enter".to_string());
        lines
    }
}

fn optional_keys_to_string(keys: &[String]) -> String {
    if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(", ")
    }
}
