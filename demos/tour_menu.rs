//! # Tour Menu Example
//!
//! A bookable list of tours driven entirely by roving focus:
//! - A `FocusNavigator` attached to the menu in `App::mounted`
//! - Arrow keys, Home/End, Enter/Space to book, Esc to close
//! - `d` marks the focused tour sold out; the navigator skips it from the
//!   next key press on, without re-attaching
//!
//! Run with: `cargo run --example tour_menu`
//! Set `ROVE_LOG=rove.log` to write navigation logs to a file.

use rove::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use rove::ratatui::layout::{Constraint, Layout};
use rove::ratatui::style::{Color, Style};
use rove::ratatui::widgets::Paragraph;
use rove::ratatui::Frame;
use rove::widgets::{render_help, FocusList, FocusNavigator, NavigationConfig, NavigationKeys};
use rove::{App, DispatchOutcome, Document, DomError, Element, Flow, ListenerError, NodeId, ProgramOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

const TOURS: &[(&str, &str)] = &[
    ("Alfama on foot", "2h walking tour through the old town"),
    ("Sintra palaces", "Full day, lunch included"),
    ("Tagus at sunset", "90 min sailing trip"),
    ("Tile workshop", "Paint your own azulejo"),
    ("Fado night", "Dinner and live music"),
];

const CANDIDATES: &str = "li.tour:not([aria-disabled])";

struct TourMenu {
    document: Document,
    menu: NodeId,
    navigator: FocusNavigator,
    config: NavigationConfig,
    booked: Receiver<NodeId>,
    closed: Arc<AtomicBool>,
    choice: Option<String>,
}

impl TourMenu {
    fn new() -> Result<Self, DomError> {
        let mut document = Document::new();
        let root = document.root();
        let menu = document.append(root, Element::new("ul").id("tours"))?;
        for (name, blurb) in TOURS {
            document.append(
                menu,
                Element::new("li")
                    .class("tour")
                    .attr("data-blurb", *blurb)
                    .text(*name),
            )?;
        }

        let (tx, booked) = channel();
        let closed = Arc::new(AtomicBool::new(false));
        let close_flag = Arc::clone(&closed);
        let config = NavigationConfig::new(CANDIDATES)
            .on_enter(move |node| {
                let _ = tx.send(node);
            })
            .on_escape(move || close_flag.store(true, Ordering::SeqCst))
            .initial_focus(true);

        Ok(Self {
            document,
            menu,
            navigator: FocusNavigator::new(),
            config,
            booked,
            closed,
            choice: None,
        })
    }

    fn toggle_sold_out(&mut self) {
        let Some(focused) = self.document.active_element() else {
            return;
        };
        let sold_out = self
            .document
            .node(focused)
            .is_some_and(|n| n.attribute("aria-disabled").is_some());
        let result = if sold_out {
            self.document.remove_attribute(focused, "aria-disabled")
        } else {
            self.document.set_attribute(focused, "aria-disabled", "true")
        };
        if let Err(err) = result {
            tracing::warn!(%err, "could not update tour");
        }
    }
}

impl App for TourMenu {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn mounted(&mut self) -> Result<(), ListenerError> {
        self.navigator
            .sync(&mut self.document, Some(self.menu), &self.config)?;
        Ok(())
    }

    fn view(&self, frame: &mut Frame) {
        let [list_area, detail_area, help_area] = Layout::vertical([
            Constraint::Min(TOURS.len() as u16 + 2),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let list = FocusList::new("li.tour").title("Lisbon tours");
        if let Err(err) = list.render(&self.document, Some(self.menu), frame, list_area) {
            tracing::error!(%err, "tour list failed to render");
        }

        let detail = match (&self.choice, self.document.active_element()) {
            (Some(choice), _) => format!("Booked: {choice}"),
            (None, Some(node)) => self
                .document
                .node(node)
                .and_then(|n| n.attribute("data-blurb"))
                .unwrap_or_default()
                .to_string(),
            (None, None) => String::new(),
        };
        frame.render_widget(
            Paragraph::new(detail).style(Style::default().fg(Color::Yellow)),
            detail_area,
        );

        render_help(&NavigationKeys::default(), frame, help_area);
    }

    fn after_key(&mut self, key: &KeyEvent, outcome: &DispatchOutcome) -> Flow {
        while let Ok(node) = self.booked.try_recv() {
            self.choice = self.document.text(node).map(str::to_string);
            tracing::info!(choice = ?self.choice, "tour booked");
        }
        if self.closed.load(Ordering::SeqCst) {
            return Flow::Exit;
        }
        if outcome.default_prevented || key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Char('q') => Flow::Exit,
            KeyCode::Char('d') => {
                self.toggle_sold_out();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }
}

#[rove::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ProgramOptions {
        title: Some("Tours".into()),
        log_file: std::env::var_os("ROVE_LOG").map(Into::into),
        ..ProgramOptions::default()
    };
    let app = rove::run_with(TourMenu::new()?, options).await?;
    if let Some(choice) = app.choice {
        println!("Booked: {choice}");
    }
    Ok(())
}
