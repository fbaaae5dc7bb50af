//! Roving keyboard focus over the candidates inside a container.
//!
//! A navigator listens for key-downs on a container node and moves input
//! focus among the container's descendants that match a selector:
//!
//! | Key | Effect |
//! |-----|--------|
//! | Down / Right | next candidate (wraps to the first when looping) |
//! | Up / Left | previous candidate (wraps to the last when looping) |
//! | Home / End | first / last candidate |
//! | Enter / Space | `on_enter` with the focused candidate |
//! | Esc | `on_escape` |
//!
//! The candidate list is queried fresh from the live document for every
//! event, so items added or removed between key presses are always seen.
//! The focus cursor is never stored: it is the position of the document's
//! active element in that list.
//!
//! [`attach`] installs one listener and returns a [`NavigationHandle`] that
//! removes it when released or dropped.  [`FocusNavigator`] wraps that in
//! the mount/update/unmount lifecycle of a view: it re-attaches only when
//! its dependencies change, always releasing the old listener first.

use crate::key::NavigationKeys;
use rove_core::dom::{Document, NodeId};
use rove_core::event::KeyboardEvent;
use rove_core::host::NavigationHost;
use rove_core::listener::ListenerGuard;
use rove_core::selector::SelectorError;
use std::fmt;
use std::sync::Arc;

/// Called with the focused candidate when an activation key is pressed.
pub type EnterCallback = Arc<dyn Fn(NodeId) + Send + Sync>;

/// Called when the cancel key is pressed.
pub type EscapeCallback = Arc<dyn Fn() + Send + Sync>;

/// Configuration for one navigator.
///
/// ```ignore
/// let config = NavigationConfig::new("li.tour:not([aria-disabled])")
///     .on_enter(|node| println!("picked {node}"))
///     .loop_focus(false)
///     .initial_focus(true);
/// ```
#[derive(Clone)]
pub struct NavigationConfig {
    /// Selector for candidates below the container.
    pub selector: String,
    pub on_enter: Option<EnterCallback>,
    pub on_escape: Option<EscapeCallback>,
    /// Wrap past the first and last candidate. Default: true.
    pub loop_focus: bool,
    /// Focus the first candidate when attaching. Default: false.
    pub initial_focus: bool,
    pub keys: NavigationKeys,
}

impl NavigationConfig {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            on_enter: None,
            on_escape: None,
            loop_focus: true,
            initial_focus: false,
            keys: NavigationKeys::default(),
        }
    }

    pub fn on_enter(self, callback: impl Fn(NodeId) + Send + Sync + 'static) -> Self {
        self.on_enter_shared(Arc::new(callback))
    }

    /// Use an existing callback.  Passing the same `Arc` on every update keeps
    /// [`FocusNavigator::sync`] from re-attaching.
    pub fn on_enter_shared(mut self, callback: EnterCallback) -> Self {
        self.on_enter = Some(callback);
        self
    }

    pub fn on_escape(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_escape_shared(Arc::new(callback))
    }

    pub fn on_escape_shared(mut self, callback: EscapeCallback) -> Self {
        self.on_escape = Some(callback);
        self
    }

    pub fn loop_focus(mut self, loop_focus: bool) -> Self {
        self.loop_focus = loop_focus;
        self
    }

    pub fn initial_focus(mut self, initial_focus: bool) -> Self {
        self.initial_focus = initial_focus;
        self
    }

    pub fn keys(mut self, keys: NavigationKeys) -> Self {
        self.keys = keys;
        self
    }
}

impl fmt::Debug for NavigationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationConfig")
            .field("selector", &self.selector)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_escape", &self.on_escape.is_some())
            .field("loop_focus", &self.loop_focus)
            .field("initial_focus", &self.initial_focus)
            .finish_non_exhaustive()
    }
}

/// What a navigator did with one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a navigation key, no candidates, or no callback for it.  The
    /// default action was left alone.
    Ignored,
    /// Focus moved to candidate `to`.  `from` is `None` when focus was
    /// outside the candidate list.
    Moved { from: Option<usize>, to: usize },
    /// A boundary was reached without looping.  The default action was
    /// still suppressed.
    Held,
    /// `on_enter` ran for this candidate.
    Activated(NodeId),
    /// `on_escape` ran.
    Cancelled,
}

/// Handle one key event for the region rooted at `container`.
///
/// This is the whole navigation algorithm; the listener installed by
/// [`attach`] just calls it.  Query errors propagate unmodified.
pub fn handle_key<H: NavigationHost + ?Sized>(
    host: &mut H,
    container: NodeId,
    config: &NavigationConfig,
    event: &mut KeyboardEvent,
) -> Result<KeyOutcome, SelectorError> {
    if !event.is_keydown() {
        return Ok(KeyOutcome::Ignored);
    }

    let candidates = host.query_selector_all(container, &config.selector)?;
    let Some(last) = candidates.len().checked_sub(1) else {
        return Ok(KeyOutcome::Ignored);
    };
    let focused = host
        .active_element()
        .and_then(|active| candidates.iter().position(|c| *c == active));

    let key = *event.key();
    let keys = &config.keys;

    if keys.next.matches(&key) {
        event.prevent_default();
        let to = match focused {
            Some(i) if i < last => Some(i + 1),
            _ if config.loop_focus => Some(0),
            _ => None,
        };
        return Ok(move_focus(host, &candidates, focused, to));
    }

    if keys.prev.matches(&key) {
        event.prevent_default();
        let to = match focused {
            Some(i) if i > 0 => Some(i - 1),
            _ if config.loop_focus => Some(last),
            _ => None,
        };
        return Ok(move_focus(host, &candidates, focused, to));
    }

    if keys.first.matches(&key) {
        event.prevent_default();
        return Ok(move_focus(host, &candidates, focused, Some(0)));
    }

    if keys.last.matches(&key) {
        event.prevent_default();
        return Ok(move_focus(host, &candidates, focused, Some(last)));
    }

    if keys.activate.matches(&key) {
        if let (Some(i), Some(on_enter)) = (focused, &config.on_enter) {
            event.prevent_default();
            tracing::debug!(message = "nav.activate", index = i, node = %candidates[i]);
            on_enter(candidates[i]);
            return Ok(KeyOutcome::Activated(candidates[i]));
        }
        return Ok(KeyOutcome::Ignored);
    }

    if keys.cancel.matches(&key) {
        if let Some(on_escape) = &config.on_escape {
            event.prevent_default();
            tracing::debug!(message = "nav.cancel");
            on_escape();
            return Ok(KeyOutcome::Cancelled);
        }
    }

    Ok(KeyOutcome::Ignored)
}

fn move_focus<H: NavigationHost + ?Sized>(
    host: &mut H,
    candidates: &[NodeId],
    from: Option<usize>,
    to: Option<usize>,
) -> KeyOutcome {
    match to {
        Some(to) => {
            host.focus(candidates[to]);
            tracing::debug!(message = "nav.move", from = ?from, to, count = candidates.len());
            KeyOutcome::Moved { from, to }
        }
        None => {
            tracing::trace!(message = "nav.held", at = ?from);
            KeyOutcome::Held
        }
    }
}

/// An attached (or inert) navigator.  Dropping it removes the listener.
#[derive(Debug)]
#[must_use = "dropping the handle immediately detaches the navigator"]
pub struct NavigationHandle {
    guard: Option<ListenerGuard>,
}

impl NavigationHandle {
    fn inert() -> Self {
        Self { guard: None }
    }

    /// Whether a listener is installed.
    pub fn is_attached(&self) -> bool {
        self.guard.is_some()
    }

    /// The container the listener is installed on.
    pub fn container(&self) -> Option<NodeId> {
        self.guard.as_ref().map(ListenerGuard::target)
    }

    /// Remove the listener.  Events dispatched afterwards are not seen.
    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(guard) = self.guard.take() {
            tracing::debug!(message = "nav.detach", container = %guard.target());
            guard.release();
        }
    }
}

impl Drop for NavigationHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Install a navigator on `container`.
///
/// With no container this is a no-op and the returned handle is inert.
/// Otherwise exactly one key listener is registered on the container and,
/// if `initial_focus` is set, the first candidate is focused right away
/// (nothing happens, and nothing is retried, when there are no candidates
/// yet).  A query error during initial focus is returned and the listener
/// is removed again.
pub fn attach(
    document: &mut Document,
    container: Option<NodeId>,
    config: NavigationConfig,
) -> Result<NavigationHandle, SelectorError> {
    let Some(container) = container else {
        tracing::debug!(message = "nav.attach.skipped", reason = "no container");
        return Ok(NavigationHandle::inert());
    };

    let config = Arc::new(config);
    let listener_config = Arc::clone(&config);
    let guard = document.add_key_listener(container, move |event, doc| {
        handle_key(doc, container, &listener_config, event)?;
        Ok(())
    });
    let handle = NavigationHandle { guard: Some(guard) };
    tracing::debug!(
        message = "nav.attach",
        container = %container,
        selector = %config.selector,
        loop_focus = config.loop_focus,
    );

    if config.initial_focus {
        let candidates = document.query_selector_all(container, &config.selector)?;
        if let Some(first) = candidates.first() {
            document.focus(*first);
        }
    }

    Ok(handle)
}

/// What a navigator was attached with; a change means re-attaching.
#[derive(Clone)]
struct Dependencies {
    container: Option<NodeId>,
    selector: String,
    on_enter: Option<EnterCallback>,
    on_escape: Option<EscapeCallback>,
    loop_focus: bool,
    keys: NavigationKeys,
}

impl Dependencies {
    fn of(container: Option<NodeId>, config: &NavigationConfig) -> Self {
        Self {
            container,
            selector: config.selector.clone(),
            on_enter: config.on_enter.clone(),
            on_escape: config.on_escape.clone(),
            loop_focus: config.loop_focus,
            keys: config.keys.clone(),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        self.container == other.container
            && self.selector == other.selector
            && same_callback(&self.on_enter, &other.on_enter)
            && same_callback(&self.on_escape, &other.on_escape)
            && self.loop_focus == other.loop_focus
            && self.keys == other.keys
    }
}

fn same_callback<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

/// Lifecycle wrapper for a navigator owned by a view.
///
/// Call [`sync`](FocusNavigator::sync) whenever the view (re)renders with its
/// current container and configuration; the navigator re-attaches only if
/// the container, selector, callbacks (by identity), looping flag, or key
/// bindings changed.  `initial_focus` is read only when attaching.  Call
/// [`release`](FocusNavigator::release) when the view goes away; dropping
/// the navigator does the same.
#[derive(Default)]
pub struct FocusNavigator {
    handle: Option<NavigationHandle>,
    deps: Option<Dependencies>,
}

impl FocusNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the navigator in line with `container` and `config`.  Returns
    /// whether it re-attached.
    pub fn sync(
        &mut self,
        document: &mut Document,
        container: Option<NodeId>,
        config: &NavigationConfig,
    ) -> Result<bool, SelectorError> {
        let deps = Dependencies::of(container, config);
        if self.deps.as_ref().is_some_and(|current| current.same_as(&deps)) {
            return Ok(false);
        }

        self.release();
        self.handle = Some(attach(document, container, config.clone())?);
        self.deps = Some(deps);
        Ok(true)
    }

    /// Detach and forget the current dependencies.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        self.deps = None;
    }

    pub fn is_attached(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(NavigationHandle::is_attached)
    }

    pub fn container(&self) -> Option<NodeId> {
        self.handle.as_ref().and_then(NavigationHandle::container)
    }
}

impl fmt::Debug for FocusNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusNavigator")
            .field("attached", &self.is_attached())
            .field("container", &self.container())
            .finish()
    }
}
