use crate::dom::{DispatchOutcome, Document, NodeId};
use crate::listener::ListenerError;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};

/// A headless harness for exercising a [`Document`] without a terminal.
///
/// `TestDocument` lets you press keys, inspect focus, and render views in a
/// plain `#[test]` function -- no tokio runtime or TTY required.  Keys are
/// dispatched at the focused element exactly as the runtime does.
///
/// # Example
///
/// ```rust,ignore
/// use rove_core::testing::TestDocument;
/// use crossterm::event::KeyCode;
///
/// let mut t = TestDocument::new();
/// let (menu, items) = t.list(&["Paris", "Rome"]);
/// let _nav = attach(t.document_mut(), Some(menu), NavigationConfig::new("li.item"))?;
/// t.document_mut().focus(items[0]);
/// t.press(KeyCode::Down);
/// assert_eq!(t.focused_text(), Some("Rome"));
/// ```
pub struct TestDocument {
    document: Document,
}

impl Default for TestDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDocument {
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Build `<ul>` under the root with one `<li class="item">` per label.
    pub fn list(&mut self, labels: &[&str]) -> (NodeId, Vec<NodeId>) {
        use crate::dom::Element;
        let root = self.document.root();
        let ul = self
            .document
            .append(root, Element::new("ul"))
            .expect("root is attached");
        let items = labels
            .iter()
            .map(|label| {
                self.document
                    .append(ul, Element::new("li").class("item").text(*label))
                    .expect("list is attached")
            })
            .collect();
        (ul, items)
    }

    /// Press `code` with no modifiers.  Panics if a listener fails; use
    /// [`try_press`](TestDocument::try_press) to observe errors.
    pub fn press(&mut self, code: KeyCode) -> DispatchOutcome {
        self.try_press(KeyEvent::new(code, KeyModifiers::NONE))
            .expect("listener failed")
    }

    /// Press `code` `times` times, returning the last outcome.
    pub fn press_n(&mut self, code: KeyCode, times: usize) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for _ in 0..times {
            outcome = self.press(code);
        }
        outcome
    }

    /// Release `code`: a key-up event, which is not a keydown.
    pub fn release(&mut self, code: KeyCode) -> DispatchOutcome {
        let key = KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        self.try_press(key).expect("listener failed")
    }

    /// Dispatch a key event at the focused element.
    pub fn try_press(&mut self, key: KeyEvent) -> Result<DispatchOutcome, ListenerError> {
        self.document.dispatch_to_focused(key)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.document.active_element()
    }

    /// Text of the focused element.
    pub fn focused_text(&self) -> Option<&str> {
        self.document
            .active_element()
            .and_then(|node| self.document.text(node))
    }

    /// Render `view` into a [`Buffer`] of the given dimensions.
    pub fn render(
        &self,
        width: u16,
        height: u16,
        view: impl FnOnce(&Document, &mut Frame),
    ) -> Buffer {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| view(&self.document, frame))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    /// Render `view` and return the visible content as a plain string, one
    /// line per row.
    pub fn render_string(
        &self,
        width: u16,
        height: u16,
        view: impl FnOnce(&Document, &mut Frame),
    ) -> String {
        let buf = self.render(width, height, view);
        let area = Rect::new(0, 0, width, height);
        let mut output = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let cell = &buf[(x, y)];
                output.push_str(cell.symbol());
            }
            if y < area.bottom() - 1 {
                output.push('\n');
            }
        }
        output
    }
}
