use crate::dom::{DispatchOutcome, Document};
use crate::listener::ListenerError;
use crossterm::event::KeyEvent;
use ratatui::Frame;

/// Whether the event loop should keep running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Exit,
}

/// A terminal application built around one [`Document`].
///
/// The runtime owns the loop: every key press is dispatched into the
/// document at the focused element (listeners such as focus navigators
/// react there), then [`after_key`](App::after_key) sees the outcome, then
/// the app is redrawn with [`view`](App::view).
///
/// # Example
///
/// ```rust,ignore
/// use rove_core::{App, Document, Flow, DispatchOutcome};
/// use crossterm::event::{KeyCode, KeyEvent};
/// use ratatui::Frame;
///
/// struct Menu { document: Document }
///
/// impl App for Menu {
///     fn document(&self) -> &Document { &self.document }
///     fn document_mut(&mut self) -> &mut Document { &mut self.document }
///
///     fn view(&self, frame: &mut Frame) {
///         // draw from self.document ...
///     }
///
///     fn after_key(&mut self, key: &KeyEvent, outcome: &DispatchOutcome) -> Flow {
///         if key.code == KeyCode::Char('q') && !outcome.default_prevented {
///             Flow::Exit
///         } else {
///             Flow::Continue
///         }
///     }
/// }
/// ```
pub trait App: Send + 'static {
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Called once before the first render.  This is where an app attaches
    /// its listeners; an error here aborts the program before the terminal
    /// is touched.
    fn mounted(&mut self) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Render the current state.
    fn view(&self, frame: &mut Frame);

    /// Inspect a key after the document has dispatched it.
    ///
    /// The default implementation keeps running.
    fn after_key(&mut self, key: &KeyEvent, outcome: &DispatchOutcome) -> Flow {
        let _ = (key, outcome);
        Flow::Continue
    }
}
