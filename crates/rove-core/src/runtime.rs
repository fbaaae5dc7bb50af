use crate::app::{App, Flow};
use crate::event::TerminalEvent;
use crate::listener::ListenerError;
use crossterm::{
    cursor,
    event::{EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Output target for the terminal UI.
///
/// By default the TUI renders to **stdout**.  When your program's stdout is
/// piped, switch to [`Stderr`](OutputTarget::Stderr) so the UI goes to the
/// terminal while data flows through the pipe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout (default).
    #[default]
    Stdout,
    /// Write to stderr (useful when stdout is piped).
    Stderr,
}

/// Writer that wraps either stdout or stderr.
enum Output {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

impl Output {
    fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

/// Errors that can occur while running a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A key listener failed; the program stops at the first failure.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
    /// The log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Configuration options for a [`Program`].
///
/// Use struct update syntax to override only the options you need:
///
/// ```rust,ignore
/// use rove_core::{ProgramOptions, OutputTarget};
///
/// let opts = ProgramOptions {
///     title: Some("Tours".into()),
///     log_file: Some("rove.log".into()),
///     ..ProgramOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Start in alternate screen (default: true).
    pub alt_screen: bool,
    /// Set terminal title.
    pub title: Option<String>,
    /// Whether to catch panics and restore terminal (default: true).
    pub catch_panics: bool,
    /// Exit on SIGINT delivered outside raw mode (default: true).
    pub handle_signals: bool,
    /// Exit when Ctrl+C is pressed, before the key reaches the document
    /// (default: true).
    pub exit_on_ctrl_c: bool,
    /// Send `tracing` output to this file.  Nothing is logged otherwise.
    pub log_file: Option<PathBuf>,
    /// Output target: stdout (default) or stderr.
    pub output: OutputTarget,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            alt_screen: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            exit_on_ctrl_c: true,
            log_file: None,
            output: OutputTarget::default(),
        }
    }
}

/// Drives an [`App`] on a real terminal.
///
/// # Example
///
/// ```rust,ignore
/// use rove_core::{Program, ProgramError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), ProgramError> {
///     let app = Program::new(MyApp::new()).run().await?;
///     // `app` is the final state after exit
///     Ok(())
/// }
/// ```
pub struct Program<A: App> {
    app: A,
    options: ProgramOptions,
}

impl<A: App> Program<A> {
    /// Create a program with default options.
    pub fn new(app: A) -> Self {
        Self::with_options(app, ProgramOptions::default())
    }

    pub fn with_options(app: A, options: ProgramOptions) -> Self {
        Self { app, options }
    }

    /// Run until the app exits.  The terminal is restored on every exit
    /// path, including errors.
    pub async fn run(mut self) -> Result<A, ProgramError> {
        if let Some(path) = &self.options.log_file {
            init_logging(path)?;
        }

        self.app.mounted()?;
        tracing::debug!(message = "program.mounted");

        let mut terminal = init_terminal(&self.options)?;
        let result = self.event_loop(&mut terminal).await;
        let restored = restore_terminal(&self.options);
        tracing::debug!(message = "program.exit", ok = result.is_ok());

        result?;
        restored?;
        Ok(self.app)
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Output>>,
    ) -> Result<(), ProgramError> {
        let mut events = EventStream::new();
        self.render(terminal)?;

        let handle_signals = self.options.handle_signals;

        loop {
            let event = tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    tracing::debug!(message = "program.signal");
                    return Ok(());
                }

                next = events.next() => match next {
                    Some(event) => TerminalEvent::from(event?),
                    None => return Ok(()),
                },
            };

            match event {
                TerminalEvent::Key(key) => {
                    if self.options.exit_on_ctrl_c && is_ctrl_c(&key) {
                        tracing::debug!(message = "program.ctrl_c");
                        return Ok(());
                    }
                    let outcome = self.app.document_mut().dispatch_to_focused(key)?;
                    tracing::trace!(
                        message = "program.key",
                        code = ?key.code,
                        default_prevented = outcome.default_prevented,
                        listeners = outcome.listeners_invoked,
                    );
                    if self.app.after_key(&key, &outcome) == Flow::Exit {
                        return Ok(());
                    }
                }
                TerminalEvent::Resize(..) | TerminalEvent::FocusGained | TerminalEvent::FocusLost => {}
                TerminalEvent::Mouse(_) | TerminalEvent::Paste(_) => continue,
            }

            self.render(terminal)?;
        }
    }

    fn render(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Output>>,
    ) -> Result<(), ProgramError> {
        terminal.draw(|frame| self.app.view(frame))?;
        Ok(())
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.code == KeyCode::Char('c')
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Route `tracing` output to an append-mode log file.
///
/// A TUI owns the terminal, so logs cannot go to stdout or stderr.  The
/// filter honours `RUST_LOG` and defaults to `debug`.
pub fn init_logging(path: impl AsRef<Path>) -> Result<(), ProgramError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| ProgramError::Logging(e.to_string()))
}

fn init_terminal(
    options: &ProgramOptions,
) -> Result<Terminal<CrosstermBackend<Output>>, ProgramError> {
    // Install panic hook that restores terminal (only once to avoid stacking)
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        let output_target = options.output;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal_minimal(alt_screen, output_target);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = Output::new(options.output);

    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    let backend = CrosstermBackend::new(writer);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(options: &ProgramOptions) -> Result<(), ProgramError> {
    restore_terminal_minimal(options.alt_screen, options.output)?;
    Ok(())
}

fn restore_terminal_minimal(
    alt_screen: bool,
    output_target: OutputTarget,
) -> Result<(), std::io::Error> {
    // Best effort: keep restoring even if a step fails.
    let raw = disable_raw_mode();
    let mut writer = Output::new(output_target);
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    raw
}
