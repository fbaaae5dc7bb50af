//! Core platform for the **rove** keyboard-navigation toolkit.
//!
//! `rove-core` models the small slice of a UI platform that roving keyboard
//! focus depends on, and drives it from a real terminal:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Document`] | Element tree with document order, a focus slot, and key listeners |
//! | [`Selector`] | CSS selector subset used to query candidate elements |
//! | [`KeyboardEvent`] | A key event with default-action and propagation flags |
//! | [`ListenerGuard`] | Scoped listener registration, released on drop |
//! | [`FocusHost`] / [`ElementQuery`] | Injected capabilities for code that moves focus |
//! | [`App`] / [`Program`] | Wires a document-backed app to a terminal |
//! | [`TestDocument`](testing::TestDocument) | Headless harness for unit tests |
//!
//! # Event flow
//!
//! 1. **mount** -- [`App::mounted`] attaches listeners to nodes of the
//!    document.
//! 2. **view** -- the runtime calls [`App::view`] to draw the current state.
//! 3. **dispatch** -- each key press is dispatched at the focused element
//!    and bubbles to the root, running every listener on the way.
//! 4. **react** -- [`App::after_key`] sees the dispatch outcome and may
//!    exit.
//! 5. **repeat** -- steps 2-4 repeat until the app exits.

pub mod app;
pub mod dom;
pub mod event;
pub mod host;
pub mod listener;
pub mod runtime;
pub mod selector;
pub mod testing;

pub use app::{App, Flow};
pub use dom::{DispatchOutcome, Document, DomError, Element, Node, NodeId};
pub use event::{KeyboardEvent, TerminalEvent};
pub use host::{ElementQuery, FocusHost, NavigationHost};
pub use listener::{KeyListener, ListenerError, ListenerGuard, ListenerId};
pub use runtime::{init_logging, OutputTarget, Program, ProgramError, ProgramOptions};
pub use selector::{Selector, SelectorError};

/// Run an app with default options.
pub async fn run<A: App>(app: A) -> Result<A, ProgramError> {
    Program::new(app).run().await
}

/// Run with custom options.
pub async fn run_with<A: App>(app: A, options: ProgramOptions) -> Result<A, ProgramError> {
    Program::with_options(app, options).run().await
}
