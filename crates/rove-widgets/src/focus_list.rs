//! Render the candidates of a navigable region as a ratatui list.
//!
//! The widget owns no state.  Each frame it queries the candidates below the
//! container and highlights whichever one holds document focus, so what is on
//! screen always agrees with where the navigator moved focus.

use crate::key::KeyMap;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use rove_core::dom::{Document, NodeId};
use rove_core::selector::{Selector, SelectorError};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Style configuration for a [`FocusList`].
#[derive(Debug, Clone)]
pub struct FocusListStyle {
    pub normal: Style,
    /// Style of the focused candidate.
    pub focused: Style,
    /// Candidates carrying `aria-disabled`.
    pub disabled: Style,
    pub highlight_symbol: String,
}

impl Default for FocusListStyle {
    fn default() -> Self {
        Self {
            normal: Style::default(),
            focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            disabled: Style::default().fg(Color::DarkGray),
            highlight_symbol: "▸ ".to_string(),
        }
    }
}

/// A list view of the candidates below a container.
///
/// ```ignore
/// FocusList::new("li.tour")
///     .title("Tours")
///     .render(&document, Some(menu), frame, area)?;
/// ```
#[derive(Debug, Clone)]
pub struct FocusList {
    selector: String,
    title: Option<String>,
    borders: bool,
    style: FocusListStyle,
}

impl FocusList {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            title: None,
            borders: true,
            style: FocusListStyle::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn borders(mut self, borders: bool) -> Self {
        self.borders = borders;
        self
    }

    pub fn style(mut self, style: FocusListStyle) -> Self {
        self.style = style;
        self
    }

    pub fn highlight_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.style.highlight_symbol = symbol.into();
        self
    }

    /// Draw the candidates below `container` into `area`.  With no container
    /// only the frame is drawn.  An invalid selector is reported even when
    /// nothing would be drawn.
    pub fn render(
        &self,
        document: &Document,
        container: Option<NodeId>,
        frame: &mut Frame,
        area: Rect,
    ) -> Result<(), SelectorError> {
        let candidates = match container {
            Some(container) => document.query_selector_all(container, &self.selector)?,
            None => {
                Selector::parse(&self.selector)?;
                Vec::new()
            }
        };

        let inner = if self.borders {
            let mut block = Block::default().borders(Borders::ALL);
            if let Some(title) = &self.title {
                block = block.title(format!(" {title} "));
            }
            let inner = block.inner(area);
            frame.render_widget(block, area);
            inner
        } else {
            area
        };
        if inner.width == 0 || inner.height == 0 || container.is_none() {
            return Ok(());
        }

        let focused = document
            .active_element()
            .and_then(|active| candidates.iter().position(|c| *c == active));

        let symbol_width = self.style.highlight_symbol.width();
        let label_width = (inner.width as usize).saturating_sub(symbol_width);
        let items: Vec<ListItem> = candidates
            .iter()
            .map(|node| {
                let style = if is_disabled(document, *node) {
                    self.style.disabled
                } else {
                    self.style.normal
                };
                ListItem::new(truncate(&label(document, *node), label_width, "…")).style(style)
            })
            .collect();

        let list = List::new(items)
            .highlight_style(self.style.focused)
            .highlight_symbol(self.style.highlight_symbol.as_str())
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default().with_selected(focused);
        frame.render_stateful_widget(list, inner, &mut state);
        Ok(())
    }
}

/// One-line help built from a key map, e.g. `↓/→ next • esc close`.
pub fn render_help(keys: &dyn KeyMap, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, binding) in keys
        .short_help()
        .into_iter()
        .filter(|b| b.enabled)
        .enumerate()
    {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            binding.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            binding.description.to_lowercase(),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn label(document: &Document, node: NodeId) -> String {
    let Some(data) = document.node(node) else {
        return String::new();
    };
    let text = data.text().trim();
    if !text.is_empty() {
        return text.to_string();
    }
    data.attribute("aria-label")
        .map(str::to_string)
        .unwrap_or_else(|| format!("<{}>", data.tag()))
}

fn is_disabled(document: &Document, node: NodeId) -> bool {
    document
        .node(node)
        .is_some_and(|n| matches!(n.attribute("aria-disabled"), Some(v) if v != "false"))
}

/// Cut `s` to at most `max_width` columns, ending in `tail` when shortened.
fn truncate(s: &str, max_width: usize, tail: &str) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let tail_width = tail.width();
    let budget = max_width.saturating_sub(tail_width);
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if width + cw > budget {
            break;
        }
        out.push(c);
        width += cw;
    }
    if tail_width <= max_width {
        out.push_str(tail);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::NavigationKeys;
    use rove_core::dom::Element;
    use rove_core::testing::TestDocument;

    fn draw(t: &TestDocument, list: &FocusList, container: Option<NodeId>, w: u16, h: u16) -> String {
        t.render_string(w, h, |doc, frame| {
            let area = frame.area();
            list.render(doc, container, frame, area).unwrap();
        })
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate("Lisbon", 10, "…"), "Lisbon");
        assert_eq!(truncate("Lisbon old town", 8, "…"), "Lisbon …");
        assert_eq!(truncate("東京タワー", 5, "…"), "東京…");
        assert_eq!(truncate("abc", 0, "…"), "");
    }

    #[test]
    fn marks_the_focused_candidate() {
        let mut t = TestDocument::new();
        let (ul, items) = t.list(&["Paris", "Rome", "Oslo"]);
        t.document_mut().focus(items[1]);
        let out = draw(&t, &FocusList::new(".item").borders(false), Some(ul), 12, 3);
        let rows: Vec<&str> = out.lines().collect();
        assert!(rows[0].starts_with("  Paris"));
        assert!(rows[1].starts_with("▸ Rome"));
        assert!(rows[2].starts_with("  Oslo"));
    }

    #[test]
    fn focus_outside_highlights_nothing() {
        let mut t = TestDocument::new();
        let (ul, _) = t.list(&["Paris"]);
        let out = draw(&t, &FocusList::new(".item").borders(false), Some(ul), 10, 1);
        assert!(!out.contains('▸'));
    }

    #[test]
    fn label_falls_back_to_aria_label_then_tag() {
        let mut t = TestDocument::new();
        let (ul, _) = t.list(&[]);
        t.document_mut()
            .append(ul, Element::new("li").class("item").attr("aria-label", "Close"))
            .unwrap();
        t.document_mut()
            .append(ul, Element::new("li").class("item"))
            .unwrap();
        let out = draw(&t, &FocusList::new(".item").borders(false), Some(ul), 12, 2);
        assert!(out.contains("Close"));
        assert!(out.contains("<li>"));
    }

    #[test]
    fn titled_border_without_container() {
        let t = TestDocument::new();
        let out = draw(&t, &FocusList::new(".item").title("Tours"), None, 14, 3);
        assert!(out.lines().next().unwrap_or("").contains("Tours"));
    }

    #[test]
    fn bad_selector_is_reported() {
        let mut t = TestDocument::new();
        let (ul, _) = t.list(&["Paris"]);
        let list = FocusList::new("li[");
        // 10x2 leaves no room inside the border; the selector is still checked.
        for (height, container) in [(2, Some(ul)), (3, Some(ul)), (3, None)] {
            let mut result = Ok(());
            t.render(10, height, |doc, frame| {
                let area = frame.area();
                result = list.render(doc, container, frame, area);
            });
            assert!(
                matches!(result, Err(SelectorError::UnexpectedEnd { offset: 3 })),
                "{height} rows, container {container:?}: {result:?}"
            );
        }
    }

    #[test]
    fn help_line_lists_short_bindings() {
        let t = TestDocument::new();
        let out = t.render_string(60, 1, |_, frame| {
            let area = frame.area();
            render_help(&NavigationKeys::default(), frame, area);
        });
        assert!(out.starts_with("↓/→ next • ↑/← previous • enter/space select • esc close"));
    }
}
