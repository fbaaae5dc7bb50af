//! An in-process element tree with a focus slot and keyboard dispatch.
//!
//! [`Document`] stands in for the part of a browser DOM that keyboard
//! navigation needs: nodes in document order, selector queries, a single
//! active (focused) element, and key listeners that receive events bubbling
//! from a target up to the root.

use crate::event::KeyboardEvent;
use crate::host::{ElementQuery, FocusHost};
use crate::listener::{KeyListener, ListenerError, ListenerGuard, ListenerRegistry};
use crate::selector::{Selector, SelectorError};
use crossterm::event::KeyEvent;
use std::fmt;
use std::sync::Arc;

/// Handle to a node in one [`Document`].
///
/// Handles stay valid after the node is removed; the node is then reported
/// as detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Errors from structural changes to a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("{0} does not belong to this document")]
    UnknownNode(NodeId),
    #[error("{0} is detached from the document")]
    Detached(NodeId),
    #[error("the root element cannot be removed")]
    RootRemoval,
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}

/// Description of an element to insert.
///
/// ```
/// use rove_core::dom::Element;
///
/// let item = Element::new("li")
///     .class("tour")
///     .attr("data-tour", "lisbon")
///     .text("Lisbon old town");
/// assert_eq!(item.tag(), "li");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl Element {
    /// Tag names are ASCII case-insensitive and stored lowercase.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append a class to the `class` attribute.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        match self.attributes.iter_mut().find(|(name, _)| name == "class") {
            Some((_, value)) if !value.is_empty() => {
                value.push(' ');
                value.push_str(&class);
            }
            Some((_, value)) => *value = class,
            None => self.attributes.push(("class".into(), class)),
        }
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_attribute(&mut self.attributes, name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

fn set_attribute(attributes: &mut Vec<(String, String)>, name: String, value: String) {
    let name = name.to_ascii_lowercase();
    match attributes.iter_mut().find(|(n, _)| *n == name) {
        Some((_, v)) => *v = value,
        None => attributes.push((name, value)),
    }
}

/// A node stored in the document.
#[derive(Debug, Clone)]
pub struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

impl Node {
    pub fn tag(&self) -> &str {
        &self.element.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.element
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.element
            .attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn text(&self) -> &str {
        &self.element.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Result of dispatching one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Some listener suppressed the key's default action.
    pub default_prevented: bool,
    /// Some listener stopped the event before it reached the root.
    pub propagation_stopped: bool,
    /// How many listeners ran.
    pub listeners_invoked: usize,
}

/// An element tree with a focus slot and keyboard listeners.
pub struct Document {
    nodes: Vec<Node>,
    active: Option<NodeId>,
    listeners: ListenerRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create a document whose root is an empty `body` element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                element: Element::new("body"),
                parent: None,
                children: Vec::new(),
                attached: true,
            }],
            active: None,
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(Node::text)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_attached)
    }

    // --- Tree construction ---

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Result<NodeId, DomError> {
        self.check_attached(parent)?;
        let id = self.push_node(parent, element);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Insert `element` under `parent` directly before the child `before`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        element: Element,
        before: NodeId,
    ) -> Result<NodeId, DomError> {
        self.check_attached(parent)?;
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == before)
            .ok_or(DomError::NotAChild {
                parent,
                child: before,
            })?;
        let id = self.push_node(parent, element);
        self.nodes[parent.0].children.insert(position, id);
        Ok(id)
    }

    /// Detach `node` and its whole subtree.  Clears focus if the active
    /// element was inside it.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root() {
            return Err(DomError::RootRemoval);
        }
        self.check_attached(node)?;

        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
        let removed: Vec<NodeId> = std::iter::once(node).chain(self.descendants(node)).collect();
        for id in &removed {
            self.nodes[id.0].attached = false;
        }
        if self.active.is_some_and(|active| removed.contains(&active)) {
            tracing::debug!(message = "focus.lost", node = %node);
            self.active = None;
        }
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let data = self.node_mut(node)?;
        set_attribute(&mut data.element.attributes, name.into(), value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let data = self.node_mut(node)?;
        data.element
            .attributes
            .retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        self.node_mut(node)?.element.text = text.into();
        Ok(())
    }

    fn push_node(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            element,
            parent: Some(parent),
            children: Vec::new(),
            attached: true,
        });
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn check_attached(&self, id: NodeId) -> Result<(), DomError> {
        match self.node(id) {
            None => Err(DomError::UnknownNode(id)),
            Some(node) if !node.attached => Err(DomError::Detached(id)),
            Some(_) => Ok(()),
        }
    }

    // --- Queries ---

    /// Every node below `scope` in document (pre-)order, `scope` excluded.
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(scope).to_vec();
        stack.reverse();
        Descendants {
            document: self,
            stack,
        }
    }

    /// All descendants of `scope` matching `selector`, in document order.
    ///
    /// Ancestors named by the selector may lie outside `scope`.  An invalid
    /// selector is returned as an error; nothing is matched in that case.
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .filter(|node| selector.matches(self, *node))
            .collect())
    }

    /// The first descendant of `scope` matching `selector`.
    pub fn query_selector(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .find(|node| selector.matches(self, *node)))
    }

    // --- Focus ---

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Move focus to `node`.  Unknown or detached nodes cannot take focus;
    /// the request is ignored.
    pub fn focus(&mut self, node: NodeId) {
        if !self.is_attached(node) {
            tracing::trace!(message = "focus.ignored", node = %node);
            return;
        }
        if self.active != Some(node) {
            tracing::trace!(message = "focus.set", node = %node);
            self.active = Some(node);
        }
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    // --- Events ---

    /// Register a key listener on `target`.  It stays registered until the
    /// returned guard is released or dropped.
    pub fn add_key_listener(
        &mut self,
        target: NodeId,
        listener: impl Fn(&mut KeyboardEvent, &mut Document) -> Result<(), ListenerError>
            + Send
            + Sync
            + 'static,
    ) -> ListenerGuard {
        let listener: KeyListener = Arc::new(listener);
        self.listeners.add(target, listener)
    }

    /// Number of listeners currently registered on `target`.
    pub fn listener_count(&self, target: NodeId) -> usize {
        self.listeners.count(target)
    }

    /// Dispatch `key` at `target`, bubbling through every ancestor.
    ///
    /// On each node the listeners registered when the event reaches it run
    /// in registration order; one that is released before its turn is
    /// skipped.  `stop_propagation` lets the current node finish and then
    /// stops.  The first listener error aborts the dispatch.
    pub fn dispatch_key(
        &mut self,
        target: NodeId,
        key: KeyEvent,
    ) -> Result<DispatchOutcome, ListenerError> {
        let span = tracing::trace_span!("dispatch_key", node = %target, code = ?key.code);
        let _enter = span.enter();

        // The propagation path and its listeners are fixed before the first
        // listener runs; listeners added from here on wait for the next dispatch.
        let mut path = Vec::new();
        let mut current = self.node(target).map(|_| target);
        while let Some(node) = current {
            path.push(self.listeners.snapshot(node));
            current = self.parent(node);
        }

        let mut event = KeyboardEvent::new(key);
        let mut invoked = 0;
        for listeners in path {
            for (id, listener) in listeners {
                if !self.listeners.contains(id) {
                    continue;
                }
                listener(&mut event, self)?;
                invoked += 1;
            }
            if event.propagation_stopped() {
                break;
            }
        }

        Ok(DispatchOutcome {
            default_prevented: event.default_prevented(),
            propagation_stopped: event.propagation_stopped(),
            listeners_invoked: invoked,
        })
    }

    /// Dispatch `key` at the active element, or at the root when nothing
    /// has focus.
    pub fn dispatch_to_focused(&mut self, key: KeyEvent) -> Result<DispatchOutcome, ListenerError> {
        let target = self.active.unwrap_or_else(|| self.root());
        self.dispatch_key(target, key)
    }
}

impl FocusHost for Document {
    fn active_element(&self) -> Option<NodeId> {
        Document::active_element(self)
    }

    fn focus(&mut self, node: NodeId) {
        Document::focus(self, node)
    }
}

impl ElementQuery for Document {
    fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        Document::query_selector_all(self, scope, selector)
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.document.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn list(doc: &mut Document, labels: &[&str]) -> (NodeId, Vec<NodeId>) {
        let ul = doc.append(doc.root(), Element::new("ul")).unwrap();
        let items = labels
            .iter()
            .map(|label| {
                doc.append(ul, Element::new("li").class("item").text(*label))
                    .unwrap()
            })
            .collect();
        (ul, items)
    }

    #[test]
    fn new_document_has_body_root() {
        let doc = Document::new();
        assert_eq!(doc.node(doc.root()).unwrap().tag(), "body");
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn element_builder_merges_classes() {
        let mut doc = Document::new();
        let id = doc
            .append(doc.root(), Element::new("DIV").class("a").class("b").id("x"))
            .unwrap();
        let node = doc.node(id).unwrap();
        assert_eq!(node.tag(), "div");
        assert_eq!(node.classes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(node.id(), Some("x"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::new();
        let a = doc.append(doc.root(), Element::new("a")).unwrap();
        let a1 = doc.append(a, Element::new("a1")).unwrap();
        let a2 = doc.append(a, Element::new("a2")).unwrap();
        let b = doc.append(doc.root(), Element::new("b")).unwrap();
        let a1x = doc.append(a1, Element::new("a1x")).unwrap();
        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![a, a1, a1x, a2, b]);
    }

    #[test]
    fn insert_before_keeps_order() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a", "c"]);
        let b = doc
            .insert_before(ul, Element::new("li").class("item").text("b"), items[1])
            .unwrap();
        assert_eq!(doc.children(ul), &[items[0], b, items[1]]);
        assert_eq!(
            doc.insert_before(ul, Element::new("li"), doc.root()),
            Err(DomError::NotAChild {
                parent: ul,
                child: doc.root()
            })
        );
    }

    #[test]
    fn query_excludes_scope_and_respects_order() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a", "b", "c"]);
        assert_eq!(doc.query_selector_all(ul, ".item").unwrap(), items);
        assert!(doc.query_selector_all(ul, "ul").unwrap().is_empty());
        assert_eq!(doc.query_selector(ul, "li").unwrap(), Some(items[0]));
    }

    #[test]
    fn query_ancestors_may_be_outside_scope() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a"]);
        assert_eq!(doc.query_selector_all(ul, "body li").unwrap(), items);
    }

    #[test]
    fn query_propagates_selector_errors() {
        let mut doc = Document::new();
        let (ul, _) = list(&mut doc, &["a"]);
        assert!(doc.query_selector_all(ul, "li[").is_err());
    }

    #[test]
    fn remove_detaches_subtree_and_clears_focus() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a", "b"]);
        doc.focus(items[1]);
        doc.remove(ul).unwrap();
        assert!(!doc.is_attached(ul));
        assert!(!doc.is_attached(items[0]));
        assert_eq!(doc.active_element(), None);
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.remove(ul), Err(DomError::Detached(ul)));
        assert_eq!(doc.remove(doc.root()), Err(DomError::RootRemoval));
    }

    #[test]
    fn removing_unfocused_subtree_keeps_focus() {
        let mut doc = Document::new();
        let (_, items) = list(&mut doc, &["a", "b"]);
        doc.focus(items[0]);
        doc.remove(items[1]).unwrap();
        assert_eq!(doc.active_element(), Some(items[0]));
    }

    #[test]
    fn focus_ignores_detached_nodes() {
        let mut doc = Document::new();
        let (_, items) = list(&mut doc, &["a", "b"]);
        doc.remove(items[0]).unwrap();
        doc.focus(items[0]);
        assert_eq!(doc.active_element(), None);
        doc.focus(items[1]);
        assert_eq!(doc.active_element(), Some(items[1]));
        doc.blur();
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn attributes_can_change() {
        let mut doc = Document::new();
        let (_, items) = list(&mut doc, &["a"]);
        doc.set_attribute(items[0], "aria-disabled", "true").unwrap();
        assert_eq!(doc.node(items[0]).unwrap().attribute("aria-disabled"), Some("true"));
        doc.remove_attribute(items[0], "aria-disabled").unwrap();
        assert_eq!(doc.node(items[0]).unwrap().attribute("aria-disabled"), None);
        doc.set_text(items[0], "renamed").unwrap();
        assert_eq!(doc.text(items[0]), Some("renamed"));
    }

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a"]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        let _on_item = doc.add_key_listener(items[0], move |_, _| {
            log.lock().unwrap().push("item");
            Ok(())
        });
        let log = Arc::clone(&seen);
        let _on_list = doc.add_key_listener(ul, move |_, _| {
            log.lock().unwrap().push("list");
            Ok(())
        });
        let log = Arc::clone(&seen);
        let _on_root = doc.add_key_listener(doc.root(), move |_, _| {
            log.lock().unwrap().push("root");
            Ok(())
        });

        let outcome = doc.dispatch_key(items[0], key(KeyCode::Down)).unwrap();
        assert_eq!(outcome.listeners_invoked, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["item", "list", "root"]);
    }

    #[test]
    fn stop_propagation_finishes_current_node() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let _stopper = doc.add_key_listener(items[0], |event, _| {
            event.stop_propagation();
            Ok(())
        });
        let counter = Arc::clone(&calls);
        let _sibling = doc.add_key_listener(items[0], move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let counter = Arc::clone(&calls);
        let _parent = doc.add_key_listener(ul, move |_, _| {
            counter.fetch_add(100, Ordering::SeqCst);
            Ok(())
        });

        let outcome = doc.dispatch_key(items[0], key(KeyCode::Enter)).unwrap();
        assert!(outcome.propagation_stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn released_listener_is_not_invoked() {
        let mut doc = Document::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guard = doc.add_key_listener(doc.root(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(doc.listener_count(doc.root()), 1);
        guard.release();
        assert_eq!(doc.listener_count(doc.root()), 0);
        let outcome = doc.dispatch_to_focused(key(KeyCode::Esc)).unwrap();
        assert_eq!(outcome.listeners_invoked, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_released_mid_dispatch_is_skipped() {
        let mut doc = Document::new();
        let (ul, _) = list(&mut doc, &["a"]);
        let later: Arc<Mutex<Option<ListenerGuard>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&later);
        let _first = doc.add_key_listener(ul, move |_, _| {
            slot.lock().unwrap().take();
            Ok(())
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        *later.lock().unwrap() = Some(doc.add_key_listener(ul, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let outcome = doc.dispatch_key(ul, key(KeyCode::Down)).unwrap();
        assert_eq!(outcome.listeners_invoked, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(doc.listener_count(ul), 1);
    }

    #[test]
    fn listener_added_mid_dispatch_waits_for_next_dispatch() {
        let mut doc = Document::new();
        let (ul, _) = list(&mut doc, &["a"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let added: Arc<Mutex<Vec<ListenerGuard>>> = Arc::new(Mutex::new(Vec::new()));
        let keep = Arc::clone(&added);
        let counter = Arc::clone(&calls);
        let _adder = doc.add_key_listener(ul, move |_, doc| {
            let mut kept = keep.lock().unwrap();
            if kept.is_empty() {
                let counter = Arc::clone(&counter);
                let root = doc.root();
                kept.push(doc.add_key_listener(root, move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }));
            }
            Ok(())
        });

        let outcome = doc.dispatch_key(ul, key(KeyCode::Down)).unwrap();
        assert_eq!(outcome.listeners_invoked, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let outcome = doc.dispatch_key(ul, key(KeyCode::Down)).unwrap();
        assert_eq!(outcome.listeners_invoked, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_errors_abort_dispatch() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a"]);
        let reached_root = Arc::new(AtomicUsize::new(0));
        let _bad = doc.add_key_listener(ul, |_, doc| {
            doc.query_selector_all(doc.root(), "::")?;
            Ok(())
        });
        let counter = Arc::clone(&reached_root);
        let _root = doc.add_key_listener(doc.root(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let err = doc.dispatch_key(items[0], key(KeyCode::Down)).unwrap_err();
        assert!(matches!(err, ListenerError::Query(_)));
        assert_eq!(reached_root.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_can_move_focus() {
        let mut doc = Document::new();
        let (ul, items) = list(&mut doc, &["a", "b"]);
        let second = items[1];
        let _guard = doc.add_key_listener(ul, move |event, doc| {
            event.prevent_default();
            doc.focus(second);
            Ok(())
        });
        doc.focus(items[0]);
        let outcome = doc.dispatch_to_focused(key(KeyCode::Down)).unwrap();
        assert!(outcome.default_prevented);
        assert_eq!(doc.active_element(), Some(second));
    }

    #[test]
    fn dispatch_to_focused_targets_root_without_focus() {
        let mut doc = Document::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _guard = doc.add_key_listener(doc.root(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        doc.dispatch_to_focused(key(KeyCode::Tab)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
