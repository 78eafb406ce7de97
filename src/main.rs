mod session;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use kodiscope_logs::{
    FileStats, LogBuffer, MonitorConfig, SessionRequest, TailEvent, TailMonitor, TailOptions,
    keywords::DEFAULT_KEYWORD_DIR, summary,
};
use kodiscope_tui::{
    Action, AppState, Availability, Event, EventHandler, HelpOverlay, InputMode, JumpRequest,
    KeyBindings, KeyContext, LogViewerScreen, SummaryOverlay, Tui,
};
use kodiscope_types::{LogLevel, LogLine};

use session::{DEFAULT_SESSION_FILE, Session};

/// How often file size and line count are refreshed
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Rows moved by PageUp/PageDown
const PAGE_SIZE: usize = 20;

/// Kodiscope - A terminal monitor for Kodi log files
#[derive(Parser, Debug)]
#[command(name = "kodiscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kodi log file to monitor (defaults to the last file used)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Load the whole file instead of the last lines
    #[arg(long)]
    full: bool,

    /// Directory holding keyword lists (*.txt)
    #[arg(long, default_value = DEFAULT_KEYWORD_DIR)]
    keyword_dir: PathBuf,

    /// File remembering the last path and filters
    #[arg(long, default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    /// Delay between polls when the log is idle
    #[arg(long, default_value = "400")]
    poll_interval_ms: u64,

    /// Buffer size for displayed lines
    #[arg(long, default_value = "10000")]
    buffer_size: usize,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::WARN.into()),
    );

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            subscriber
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => subscriber.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Internal actions for async operations
enum InternalAction {
    /// Replace the tail session; `reset` marks a truncated file
    RestartSession { reset: bool },
    StatsCollected {
        path: PathBuf,
        stats: Option<FileStats>,
    },
    SummaryLoaded(Result<Option<String>, String>),
}

async fn run_app(args: Args) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();
    let (tail_tx, mut tail_rx) = mpsc::unbounded_channel::<TailEvent>();

    // Restore the last session, then let the command line override it
    let mut state = AppState::new(&args.keyword_dir);
    Session::load(&args.session_file).apply(&mut state);
    if let Some(path) = &args.path {
        state.set_path(path);
    }
    if args.full {
        state.full_load = true;
    }

    let log_buffer = LogBuffer::new(args.buffer_size);
    let mut monitor = TailMonitor::new(MonitorConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
        ..MonitorConfig::default()
    });

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(STATS_INTERVAL);
    let keybindings = KeyBindings::new();

    if state.path.is_some() {
        let _ = internal_tx.send(InternalAction::RestartSession { reset: false });
    }

    render(&mut tui, &mut state, &log_buffer)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.input_mode.is_some() {
                            keybindings.get_input_action(&key)
                        } else if state.ui_state.help_visible || state.ui_state.summary.is_some() {
                            // Overlays only react to global keys
                            keybindings.get_action(KeyContext::Global, &key)
                        } else {
                            keybindings.get_action(KeyContext::LogViewer, &key)
                        };

                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        state.ui_state.jump_highlight = None;
                        collect_stats(&state, &internal_tx);
                    }
                    Event::Resize(_, _) => {}
                    Event::Error(e) => {
                        state.show_message(e);
                    }
                }
            }

            // Handle tail session events
            Some(event) = tail_rx.recv() => {
                handle_tail_event(&mut state, &log_buffer, &internal_tx, event);
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &internal_tx, &log_buffer, action);
            }

            // Handle internal async actions
            Some(internal) = internal_rx.recv() => {
                match internal {
                    InternalAction::RestartSession { reset } => {
                        restart_session(&mut state, &mut monitor, &log_buffer, &tail_tx, reset).await;
                        collect_stats(&state, &internal_tx);
                        save_session(&state, &args.session_file);
                    }
                    InternalAction::StatsCollected { path, stats } => {
                        if state.path.as_deref() == Some(path.as_path()) {
                            state.file_stats = stats;
                        }
                    }
                    InternalAction::SummaryLoaded(Ok(Some(text))) => {
                        state.ui_state.summary = Some(text);
                    }
                    InternalAction::SummaryLoaded(Ok(None)) => {
                        state.show_message("No startup banner found in this log");
                    }
                    InternalAction::SummaryLoaded(Err(e)) => {
                        state.show_message(format!("Summary failed: {}", e));
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &log_buffer)?;
    }

    // Cleanup
    monitor.stop().await;
    events.shutdown().await;
    tui.restore()?;
    save_session(&state, &args.session_file);

    Ok(())
}

/// Stop the running session, clear the view and open the file again
async fn restart_session(
    state: &mut AppState,
    monitor: &mut TailMonitor,
    log_buffer: &LogBuffer,
    tail_tx: &mpsc::UnboundedSender<TailEvent>,
    reset: bool,
) {
    let Some(path) = state.path.clone() else {
        return;
    };

    monitor.stop().await;
    log_buffer.clear();
    state.reset_view();
    state.availability = Availability::Idle;

    if reset {
        log_buffer.push(LogLine::new(
            "--- log reset detected, reloading ---",
            LogLevel::Unclassified,
        ));
    }

    let request = SessionRequest {
        path,
        options: TailOptions::full_load(state.full_load),
        filter: state.filter_spec(),
    };
    state.session = monitor.restart(request, tail_tx.clone()).await;
}

fn handle_tail_event(
    state: &mut AppState,
    log_buffer: &LogBuffer,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    event: TailEvent,
) {
    // Events from a replaced session are stale
    if !state.is_current(event.session()) {
        return;
    }

    match event {
        TailEvent::Loaded { lines, .. } => {
            log_buffer.extend(lines);
            state.availability = Availability::Live;
            state.finish_jump(log_buffer);
        }
        TailEvent::Line { line, .. } => {
            if !state.paused {
                log_buffer.push(line);
            }
        }
        TailEvent::Truncated { .. } => {
            let _ = internal_tx.send(InternalAction::RestartSession { reset: true });
        }
        TailEvent::Unavailable { reason, .. } => {
            state.availability = Availability::Unavailable(reason);
        }
        TailEvent::Recovered { .. } => {
            state.availability = Availability::Live;
        }
        TailEvent::Ended { .. } => {
            state.availability = Availability::Ended;
        }
        TailEvent::Failed { error, .. } => {
            state.pending_jump = None;
            state.show_message(format!("Cannot open log: {}", error));
            state.availability = Availability::Failed(error);
        }
    }
}

fn handle_action(
    state: &mut AppState,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    log_buffer: &LogBuffer,
    action: Action,
) {
    let restart = || {
        let _ = internal_tx.send(InternalAction::RestartSession { reset: false });
    };

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::Dismiss => {
            state.dismiss();
        }

        // Filter changes replace the session
        Action::ToggleLevel(level) => {
            state.toggle_level(level);
            restart();
        }
        Action::SelectAllLevels => {
            state.select_all_levels();
            restart();
        }
        Action::ResetFilters => {
            state.reset_filters();
            restart();
        }
        Action::NextKeywordList => {
            state.cycle_keyword_list(true);
            restart();
        }
        Action::PrevKeywordList => {
            state.cycle_keyword_list(false);
            restart();
        }
        Action::ToggleFullLoad => {
            state.full_load = !state.full_load;
            restart();
        }

        // Input bar
        Action::OpenSearch => {
            state.start_input(InputMode::Search);
        }
        Action::OpenPath => {
            state.start_input(InputMode::OpenPath);
        }
        Action::InputChar(c) => {
            state.input_char(c);
        }
        Action::InputBackspace => {
            state.input_backspace();
        }
        Action::InputClear => {
            state.ui_state.input.clear();
        }
        Action::CancelInput => {
            state.cancel_input();
        }
        Action::SubmitInput => match state.submit_input() {
            Some((InputMode::Search, text)) => {
                let query = text.trim();
                if query != state.query {
                    state.query = query.to_string();
                    restart();
                }
            }
            Some((InputMode::OpenPath, text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    state.set_path(Path::new(text));
                    restart();
                }
            }
            None => {}
        },

        // View
        Action::TogglePause => {
            state.paused = !state.paused;
            if !state.paused {
                state.ui_state.auto_scroll = true;
            }
        }
        Action::ClearView => {
            log_buffer.clear();
            state.ui_state.log_scroll = 0;
        }
        Action::ExportView => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filename = format!("kodi_extract_{}.txt", timestamp);

            match export_view(&filename, log_buffer) {
                Ok(count) => {
                    state.show_message(format!("Exported {} lines to {}", count, filename));
                }
                Err(e) => {
                    state.show_message(format!("Export failed: {:#}", e));
                }
            }
        }
        Action::JumpToContext => match state.request_jump(log_buffer) {
            JumpRequest::Refused(reason) => state.show_message(reason),
            JumpRequest::Landed => {}
            JumpRequest::Reload => restart(),
        },
        Action::ShowSummary => {
            if let Some(path) = state.path.clone() {
                let tx = internal_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = summary::read_system_summary(&path).map_err(|e| e.to_string());
                    let _ = tx.send(InternalAction::SummaryLoaded(result));
                });
            }
        }

        // Scrolling
        Action::ScrollUp(n) => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.auto_scroll = false;
            // Don't cap here - the viewer clamps to the line count
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(PAGE_SIZE);
        }
        Action::PageDown => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(PAGE_SIZE);
        }
        Action::ScrollToTop => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = 0;
        }
        Action::ScrollToBottom => {
            // Back to the live end
            state.ui_state.auto_scroll = true;
            state.ui_state.log_scroll = usize::MAX;
        }
    }
}

/// Refresh size and line count off the UI thread
fn collect_stats(state: &AppState, internal_tx: &mpsc::UnboundedSender<InternalAction>) {
    let Some(path) = state.path.clone() else {
        return;
    };
    let tx = internal_tx.clone();
    tokio::task::spawn_blocking(move || {
        let stats = FileStats::collect(&path).ok();
        let _ = tx.send(InternalAction::StatsCollected { path, stats });
    });
}

fn save_session(state: &AppState, path: &Path) {
    if let Err(e) = Session::capture(state).save(path) {
        let error = format!("{:#}", e);
        tracing::warn!(%error, "session not saved");
    }
}

fn render(tui: &mut Tui, state: &mut AppState, log_buffer: &LogBuffer) -> Result<()> {
    tui.terminal().draw(|frame| {
        LogViewerScreen::render(frame, state, log_buffer);

        if let Some(summary) = &state.ui_state.summary {
            SummaryOverlay::render(frame, summary);
        }

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

/// Write the displayed lines to `filename`
fn export_view(filename: &str, log_buffer: &LogBuffer) -> Result<usize> {
    let count = log_buffer.len();
    fs::write(filename, log_buffer.export_raw())
        .with_context(|| format!("cannot write {}", filename))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(dir.path());
        state.session = 3;
        (dir, state)
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["kodiscope"]);
        assert_eq!(args.path, None);
        assert!(!args.full);
        assert_eq!(args.keyword_dir, PathBuf::from(DEFAULT_KEYWORD_DIR));
        assert_eq!(args.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
        assert_eq!(args.poll_interval_ms, 400);
        assert_eq!(args.buffer_size, 10000);
    }

    #[test]
    fn test_args_path_and_flags() {
        let args = Args::parse_from(["kodiscope", "/tmp/kodi.log", "--full", "--poll-interval-ms", "50"]);
        assert_eq!(args.path, Some(PathBuf::from("/tmp/kodi.log")));
        assert!(args.full);
        assert_eq!(args.poll_interval_ms, 50);
    }

    #[test]
    fn test_stale_events_dropped() {
        let (_dir, mut state) = state();
        let buffer = LogBuffer::new(10);
        let (tx, _rx) = mpsc::unbounded_channel();

        let line = LogLine::new("old session", LogLevel::Info);
        handle_tail_event(&mut state, &buffer, &tx, TailEvent::Line { session: 2, line });
        assert!(buffer.is_empty());

        let line = LogLine::new("current", LogLevel::Info);
        handle_tail_event(&mut state, &buffer, &tx, TailEvent::Line { session: 3, line });
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_pause_drops_lines() {
        let (_dir, mut state) = state();
        let buffer = LogBuffer::new(10);
        let (tx, _rx) = mpsc::unbounded_channel();

        state.paused = true;
        let line = LogLine::new("while paused", LogLevel::Info);
        handle_tail_event(&mut state, &buffer, &tx, TailEvent::Line { session: 3, line });
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_truncation_requests_restart() {
        let (_dir, mut state) = state();
        let buffer = LogBuffer::new(10);
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_tail_event(&mut state, &buffer, &tx, TailEvent::Truncated { session: 3 });
        assert!(matches!(rx.try_recv(), Ok(InternalAction::RestartSession { reset: true })));
    }

    #[test]
    fn test_filter_actions_restart_session() {
        let (_dir, mut state) = state();
        let buffer = LogBuffer::new(10);
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &tx, &buffer, Action::ToggleLevel(LogLevel::Error));
        assert!(state.levels.is_selected(LogLevel::Error));
        assert!(matches!(rx.try_recv(), Ok(InternalAction::RestartSession { reset: false })));

        // Scrolling leaves the session alone
        handle_action(&mut state, &tx, &buffer, Action::ScrollUp(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unchanged_search_keeps_session() {
        let (_dir, mut state) = state();
        let buffer = LogBuffer::new(10);
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &tx, &buffer, Action::OpenSearch);
        handle_action(&mut state, &tx, &buffer, Action::SubmitInput);
        assert!(rx.try_recv().is_err());

        handle_action(&mut state, &tx, &buffer, Action::OpenSearch);
        handle_action(&mut state, &tx, &buffer, Action::InputChar('p'));
        handle_action(&mut state, &tx, &buffer, Action::SubmitInput);
        assert_eq!(state.query, "p");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_jump_reload_lands_after_loaded() {
        let (_dir, mut state) = state();
        state.toggle_level(LogLevel::Error);
        let buffer = LogBuffer::new(10);
        buffer.push(kodiscope_logs::LogParser::parse(
            "2024-01-01 10:00:01.000 T:1 error <general>: boom",
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &tx, &buffer, Action::JumpToContext);
        assert!(matches!(rx.try_recv(), Ok(InternalAction::RestartSession { reset: false })));
        assert!(state.paused && state.full_load);

        // What the restarted session would deliver
        buffer.clear();
        state.reset_view();
        let lines = [
            "2024-01-01 10:00:00.000 T:1 info <general>: before",
            "2024-01-01 10:00:01.000 T:1 error <general>: boom",
        ]
        .map(kodiscope_logs::LogParser::parse)
        .to_vec();
        handle_tail_event(&mut state, &buffer, &tx, TailEvent::Loaded { session: 3, lines });

        assert_eq!(state.ui_state.log_scroll, 1);
        assert_eq!(state.ui_state.jump_highlight, Some(1));
        assert!(!state.ui_state.auto_scroll);
    }

    #[test]
    fn test_export_view() {
        let dir = TempDir::new().unwrap();
        let buffer = LogBuffer::new(10);
        buffer.push(LogLine::new("a info b", LogLevel::Info));
        buffer.push(LogLine::new("c error d", LogLevel::Error));

        let path = dir.path().join("out.txt");
        let count = export_view(path.to_str().unwrap(), &buffer).unwrap();
        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a info b\nc error d\n");
    }
}
