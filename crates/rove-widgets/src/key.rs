//! Key binding definitions and the navigation key map.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A key binding that maps one or more key combinations to a described action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The set of key combinations that trigger this binding.
    pub keys: Vec<KeyCombination>,
    /// A human-readable description of the action this binding performs.
    pub description: String,
    /// Whether this binding is currently active. Disabled bindings never match.
    pub enabled: bool,
}

/// A single key press with optional modifier keys (Ctrl, Alt, Shift).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    /// The base key code (e.g. a character, arrow key, or function key).
    pub code: KeyCode,
    /// Modifier keys that must be held alongside the base key.
    pub modifiers: KeyModifiers,
}

impl Binding {
    /// Create a new binding for a single key combination with the given description.
    pub fn new(key: KeyCombination, description: impl Into<String>) -> Self {
        Self::with_keys(vec![key], description)
    }

    /// Create a new binding for multiple key combinations with the given description.
    pub fn with_keys(keys: Vec<KeyCombination>, description: impl Into<String>) -> Self {
        Self {
            keys,
            description: description.into(),
            enabled: true,
        }
    }

    /// Return whether the given key event matches any of this binding's key
    /// combinations.  Extra modifiers held by the user do not prevent a match.
    /// Always returns `false` when the binding is disabled.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if !self.enabled {
            return false;
        }
        self.keys
            .iter()
            .any(|k| k.code == event.code && event.modifiers.contains(k.modifiers))
    }

    /// Set whether this binding is enabled. Disabled bindings never match key events.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Short label for help output, e.g. `↓/→`.
    pub fn label(&self) -> String {
        self.keys
            .iter()
            .map(KeyCombination::label)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl KeyCombination {
    /// Create a key combination with no modifier keys.
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Create a key combination with the Ctrl modifier.
    pub fn ctrl(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::CONTROL)
    }

    /// Create a key combination with the Shift modifier.
    pub fn shift(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::SHIFT)
    }

    /// Create a key combination with an explicit set of modifier keys.
    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Char(' ') => "space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}").to_lowercase(),
        };
        let mut parts = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("alt".to_string());
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("shift".to_string());
        }
        parts.push(key);
        parts.join("+")
    }
}

/// Trait for types that define key bindings, so a view can render help.
pub trait KeyMap {
    /// Return a flat list of the most important bindings for the short help line.
    fn short_help(&self) -> Vec<&Binding>;
    /// Return bindings grouped by category for the full help overlay.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}

/// Keys recognised by a focus navigator.
///
/// The defaults are the arrow-key conventions for composite widgets:
/// Down/Right move forward, Up/Left move back, Home/End jump to the ends,
/// Enter/Space activate, Esc cancels.  Override fields to customise:
///
/// ```ignore
/// use rove_widgets::key::{Binding, KeyCombination, NavigationKeys};
/// use crossterm::event::KeyCode;
///
/// let mut keys = NavigationKeys::default();
/// keys.next = Binding::new(KeyCombination::new(KeyCode::Char('j')), "Next");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationKeys {
    /// Move focus forward. Default: Down, Right
    pub next: Binding,
    /// Move focus back. Default: Up, Left
    pub prev: Binding,
    /// Focus the first candidate. Default: Home
    pub first: Binding,
    /// Focus the last candidate. Default: End
    pub last: Binding,
    /// Activate the focused candidate. Default: Enter, Space
    pub activate: Binding,
    /// Cancel. Default: Esc
    pub cancel: Binding,
}

impl Default for NavigationKeys {
    fn default() -> Self {
        Self {
            next: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Down),
                    KeyCombination::new(KeyCode::Right),
                ],
                "Next",
            ),
            prev: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Up),
                    KeyCombination::new(KeyCode::Left),
                ],
                "Previous",
            ),
            first: Binding::new(KeyCombination::new(KeyCode::Home), "First"),
            last: Binding::new(KeyCombination::new(KeyCode::End), "Last"),
            activate: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Enter),
                    KeyCombination::new(KeyCode::Char(' ')),
                ],
                "Select",
            ),
            cancel: Binding::new(KeyCombination::new(KeyCode::Esc), "Close"),
        }
    }
}

impl KeyMap for NavigationKeys {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.next, &self.prev, &self.activate, &self.cancel]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![&self.next, &self.prev, &self.first, &self.last],
            vec![&self.activate, &self.cancel],
        ]
    }
}
