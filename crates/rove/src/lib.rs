//! **rove** -- roving keyboard focus for [`ratatui`] applications.
//!
//! This is the umbrella crate that re-exports everything you need from a
//! single dependency:
//!
//! ```toml
//! [dependencies]
//! rove = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`rove_core`] are available at the crate root
//!   ([`Document`], [`Element`], [`App`], [`Program`], [`run`], etc.).
//! * The [`widgets`] module re-exports everything from [`rove_widgets`]
//!   (the focus navigator, key bindings, and the focus list).
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use rove::widgets::{FocusNavigator, NavigationConfig};
//! use rove::{Document, Element};
//!
//! let mut document = Document::new();
//! let menu = document.append(document.root(), Element::new("ul"))?;
//! for city in ["Lisbon", "Porto"] {
//!     document.append(menu, Element::new("li").text(city))?;
//! }
//!
//! let mut nav = FocusNavigator::new();
//! nav.sync(&mut document, Some(menu), &NavigationConfig::new("li").initial_focus(true))?;
//! ```

pub use rove_core::*;
pub mod widgets {
    pub use rove_widgets::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
