//! Keyboard navigation for [`rove_core`] documents.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`navigator`] | Roving focus over the candidates inside a container |
//! | [`key`] | Key bindings and the default navigation key map |
//! | [`focus_list`] | Renders a navigable region as a list with the focused row marked |
//!
//! # Example
//!
//! ```ignore
//! use rove_widgets::navigator::{FocusNavigator, NavigationConfig};
//!
//! let mut nav = FocusNavigator::new();
//! let config = NavigationConfig::new("li.tour")
//!     .on_enter(|node| tracing::info!(%node, "picked"))
//!     .initial_focus(true);
//! nav.sync(&mut document, Some(menu), &config)?;
//! ```

pub mod focus_list;
pub mod key;
pub mod navigator;

pub use focus_list::{render_help, FocusList, FocusListStyle};
pub use key::{Binding, KeyCombination, KeyMap, NavigationKeys};
pub use navigator::{
    attach, handle_key, EnterCallback, EscapeCallback, FocusNavigator, KeyOutcome,
    NavigationConfig, NavigationHandle,
};
