//! Capabilities a navigator needs from its platform.
//!
//! Focus is a single shared slot owned by the platform.  Code that moves
//! focus takes these traits instead of reaching for a global, so it can run
//! against a [`Document`](crate::Document) or a lightweight test double.

use crate::dom::NodeId;
use crate::selector::SelectorError;

/// Read and write the active (focused) element.
pub trait FocusHost {
    /// The element that currently holds input focus, if any.
    fn active_element(&self) -> Option<NodeId>;

    /// Give `node` input focus.  Hosts may ignore nodes that cannot take
    /// focus; callers are not told.
    fn focus(&mut self, node: NodeId);
}

/// Query elements below a scope with a selector.
pub trait ElementQuery {
    /// Matches below `scope` (excluded) in document order.
    fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError>;
}

/// Everything keyboard navigation touches.
pub trait NavigationHost: FocusHost + ElementQuery {}

impl<T: FocusHost + ElementQuery + ?Sized> NavigationHost for T {}
