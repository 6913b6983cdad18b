use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dbnav_core::loader::{run_load, LoadCompletion, LoadRequest, MetadataLoader};
use dbnav_core::registry::RegistryEntry;
use dbnav_core::settings::Settings;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

mod app;
pub mod keymap;
mod render;
pub mod theme;

use app::{Msg, TuiApp};
use keymap::{Keymap, KeymapError};
use theme::Theme;

const TICK_RATE: Duration = Duration::from_millis(120);
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Keymap(#[from] KeymapError),
    #[error("failed to start load runtime: {source}")]
    Runtime {
        #[source]
        source: io::Error,
    },
}

/// Everything the terminal session needs from the caller.
pub struct RunOptions {
    pub entries: Vec<RegistryEntry>,
    pub loader: Arc<dyn MetadataLoader>,
    pub settings: Settings,
}

/// What the session left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Qualified name of the last column activated with `enter`.
    pub last_selected: Option<String>,
}

#[must_use]
pub fn ui_name() -> &'static str {
    "dbnav-tui"
}

pub fn run(options: RunOptions) -> Result<RunOutcome, TuiError> {
    let keymap = Keymap::from_overrides(&options.settings.keys)?;
    let theme = Theme::from_name(options.settings.theme);
    let runtime = build_runtime()?;
    let (sender, receiver) = mpsc::unbounded_channel();
    let dispatcher = LoadDispatcher::new(runtime.handle().clone(), options.loader, sender);

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(
        &mut terminal,
        &options.entries,
        keymap,
        &theme,
        &dispatcher,
        receiver,
    );
    let restore_result = restore_terminal(&mut terminal);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match run_result {
        Err(error) => {
            restore_result?;
            Err(error)
        }
        Ok(outcome) => {
            restore_result?;
            Ok(outcome)
        }
    }
}

fn build_runtime() -> Result<Runtime, TuiError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("dbnav-load")
        .enable_all()
        .build()
        .map_err(|source| TuiError::Runtime { source })
}

/// Runs loads off the UI thread and posts each completion back on a channel.
struct LoadDispatcher {
    handle: Handle,
    loader: Arc<dyn MetadataLoader>,
    sender: UnboundedSender<LoadCompletion>,
}

impl LoadDispatcher {
    fn new(
        handle: Handle,
        loader: Arc<dyn MetadataLoader>,
        sender: UnboundedSender<LoadCompletion>,
    ) -> Self {
        Self {
            handle,
            loader,
            sender,
        }
    }

    fn dispatch(&self, request: LoadRequest) {
        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let completion = run_load(loader.as_ref(), request).await;
            if sender.send(completion).is_err() {
                log::debug!("load finished after the session ended");
            }
        });
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    entries: &[RegistryEntry],
    keymap: Keymap,
    theme: &Theme,
    dispatcher: &LoadDispatcher,
    mut receiver: UnboundedReceiver<LoadCompletion>,
) -> Result<RunOutcome, TuiError> {
    let size = terminal.size()?;
    let mut app = TuiApp::new(entries, keymap, size.width, size.height);
    let mut last_tick = Instant::now();
    log::info!("session started with {} connection(s)", entries.len());

    loop {
        terminal.draw(|frame| render::render(frame, &app, theme))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            let message = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.map_key(key),
                Event::Resize(width, height) => Some(Msg::Resize(width, height)),
                _ => None,
            };
            if let Some(message) = message {
                if let Some(request) = app.handle(message) {
                    dispatcher.dispatch(request);
                }
            }
        }

        while let Ok(completion) = receiver.try_recv() {
            app.handle(Msg::Loaded(completion));
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.handle(Msg::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(RunOutcome {
        last_selected: app.last_selected,
    })
}
