use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};

/// Terminal events produced by the runtime's event loop.
///
/// Each variant wraps the corresponding [`crossterm::event::Event`] payload.
/// Key events are turned into [`KeyboardEvent`]s and dispatched into the
/// application's [`Document`](crate::Document); the other variants only
/// trigger a redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Terminal window gained focus.
    FocusGained,
    /// Terminal window lost focus.
    FocusLost,
    /// Bracketed paste content.
    Paste(String),
}

impl From<crossterm::event::Event> for TerminalEvent {
    fn from(event: crossterm::event::Event) -> Self {
        match event {
            crossterm::event::Event::Key(k) => TerminalEvent::Key(k),
            crossterm::event::Event::Mouse(m) => TerminalEvent::Mouse(m),
            crossterm::event::Event::Resize(w, h) => TerminalEvent::Resize(w, h),
            crossterm::event::Event::FocusGained => TerminalEvent::FocusGained,
            crossterm::event::Event::FocusLost => TerminalEvent::FocusLost,
            crossterm::event::Event::Paste(s) => TerminalEvent::Paste(s),
        }
    }
}

/// A key event travelling through the document.
///
/// Listeners may suppress the default action of the key with
/// [`prevent_default`](KeyboardEvent::prevent_default) and stop the event
/// from reaching ancestors with
/// [`stop_propagation`](KeyboardEvent::stop_propagation).  Both flags are
/// reported back to the dispatcher in a
/// [`DispatchOutcome`](crate::dom::DispatchOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    key: KeyEvent,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl KeyboardEvent {
    pub fn new(key: KeyEvent) -> Self {
        Self {
            key,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A key-down event for `code` with no modifiers.
    pub fn keydown(code: KeyCode) -> Self {
        Self::new(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn key(&self) -> &KeyEvent {
        &self.key
    }

    /// Presses and auto-repeats are key-downs; releases are not.
    pub fn is_keydown(&self) -> bool {
        self.key.kind != KeyEventKind::Release
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl From<KeyEvent> for KeyboardEvent {
    fn from(key: KeyEvent) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    #[test]
    fn fresh_event_has_no_flags() {
        let event = KeyboardEvent::keydown(KeyCode::Down);
        assert!(event.is_keydown());
        assert!(!event.default_prevented());
        assert!(!event.propagation_stopped());
    }

    #[test]
    fn release_is_not_a_keydown() {
        let key = KeyEvent {
            code: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(!KeyboardEvent::from(key).is_keydown());
    }

    #[test]
    fn flags_stick() {
        let mut event = KeyboardEvent::keydown(KeyCode::Enter);
        event.prevent_default();
        event.stop_propagation();
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[test]
    fn converts_crossterm_events() {
        let event = crossterm::event::Event::Resize(80, 24);
        assert_eq!(TerminalEvent::from(event), TerminalEvent::Resize(80, 24));
    }
}
