use std::path::PathBuf;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use kodiscope_types::{FilterSpec, LogLine};

use crate::error::TailError;
use crate::filter::CompiledFilter;
use crate::tailer::{PollOutcome, TailOptions, Tailer};

/// Sleep between polls when the file has nothing new
pub const POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Sleep before retrying after a transient I/O error
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Worker timing
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

/// Everything a session needs to open its file
#[derive(Clone, Debug)]
pub struct SessionRequest {
    pub path: PathBuf,
    pub options: TailOptions,
    pub filter: FilterSpec,
}

/// Messages from the worker to its consumer
///
/// Every event carries the id of the session that produced it so events
/// still queued from a replaced session can be dropped.
#[derive(Clone, Debug)]
pub enum TailEvent {
    /// Initial window, in file order
    Loaded { session: u64, lines: Vec<LogLine> },
    /// One appended line
    Line { session: u64, line: LogLine },
    /// File shrank; the session has ended and should be started again
    Truncated { session: u64 },
    /// Transient I/O failure; the worker keeps retrying
    Unavailable { session: u64, reason: String },
    /// Reads succeed again after `Unavailable`
    Recovered { session: u64 },
    /// File disappeared; the session has ended
    Ended { session: u64 },
    /// File could not be opened; the session never started
    Failed { session: u64, error: String },
}

impl TailEvent {
    pub fn session(&self) -> u64 {
        match self {
            Self::Loaded { session, .. }
            | Self::Line { session, .. }
            | Self::Truncated { session }
            | Self::Unavailable { session, .. }
            | Self::Recovered { session }
            | Self::Ended { session }
            | Self::Failed { session, .. } => *session,
        }
    }
}

/// Runs at most one tail session at a time on a blocking worker
pub struct TailMonitor {
    config: MonitorConfig,

    /// Cancellation token for the running worker
    cancel: CancellationToken,

    /// Active worker handle
    task: Option<JoinHandle<()>>,

    /// Id of the most recently started session (0 = none yet)
    session: u64,
}

impl TailMonitor {
    /// Create a new monitor
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            task: None,
            session: 0,
        }
    }

    /// Start a session, stopping the previous one first
    ///
    /// Returns the new session id.
    pub async fn start(
        &mut self,
        request: SessionRequest,
        tx: mpsc::UnboundedSender<TailEvent>,
    ) -> u64 {
        self.stop().await;

        self.session += 1;
        let session = self.session;
        let cancel = self.cancel.clone();
        let config = self.config.clone();
        let handle = Handle::current();

        tracing::debug!(session, path = %request.path.display(), "starting tail session");

        self.task = Some(tokio::task::spawn_blocking(move || {
            run_session(session, request, config, cancel, tx, handle);
        }));

        session
    }

    /// Replace the running session with a new one
    pub async fn restart(
        &mut self,
        request: SessionRequest,
        tx: mpsc::UnboundedSender<TailEvent>,
    ) -> u64 {
        self.stop().await;
        self.start(request, tx).await
    }

    /// Stop the running session and wait for its worker to exit
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "tail worker did not exit cleanly");
            }
        }
        // Create a fresh cancellation token for future sessions
        self.cancel = CancellationToken::new();
    }

    /// Id of the most recently started session
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Check if a worker is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Default for TailMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl Drop for TailMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn run_session(
    session: u64,
    request: SessionRequest,
    config: MonitorConfig,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<TailEvent>,
    handle: Handle,
) {
    let filter = CompiledFilter::new(&request.filter);
    let (mut tailer, lines) = match Tailer::open(&request.path, &request.options, filter) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!(session, error = %e, "could not open log file");
            let _ = tx.send(TailEvent::Failed {
                session,
                error: e.to_string(),
            });
            return;
        }
    };

    if tx.send(TailEvent::Loaded { session, lines }).is_err() {
        return;
    }

    follow(session, &mut tailer, &config, &cancel, &tx, &handle);

    tracing::debug!(session, cursor = tailer.cursor(), "tail session finished");
}

/// Source of appended lines polled by the worker
trait LineSource {
    fn poll(&mut self) -> Result<PollOutcome, TailError>;
}

impl LineSource for Tailer {
    fn poll(&mut self) -> Result<PollOutcome, TailError> {
        Tailer::poll(self)
    }
}

/// Poll `source` until cancelled or the session ends
fn follow(
    session: u64,
    source: &mut impl LineSource,
    config: &MonitorConfig,
    cancel: &CancellationToken,
    tx: &mpsc::UnboundedSender<TailEvent>,
    handle: &Handle,
) {
    let mut unavailable = false;

    while !cancel.is_cancelled() {
        match source.poll() {
            Ok(outcome) => {
                if unavailable {
                    unavailable = false;
                    tracing::info!(session, "log file readable again");
                    let _ = tx.send(TailEvent::Recovered { session });
                }

                match outcome {
                    PollOutcome::Line(line) => {
                        if tx.send(TailEvent::Line { session, line }).is_err() {
                            // Consumer gone, stop tailing
                            break;
                        }
                    }
                    PollOutcome::Skipped => {}
                    PollOutcome::Idle => sleep_unless_cancelled(handle, cancel, config.poll_interval),
                    PollOutcome::Truncated => {
                        let _ = tx.send(TailEvent::Truncated { session });
                        break;
                    }
                    PollOutcome::Missing => {
                        tracing::info!(session, "log file disappeared");
                        let _ = tx.send(TailEvent::Ended { session });
                        break;
                    }
                }
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(session, error = %e, "log file unavailable, retrying");
                if !unavailable {
                    unavailable = true;
                    let _ = tx.send(TailEvent::Unavailable {
                        session,
                        reason: e.to_string(),
                    });
                }
                sleep_unless_cancelled(handle, cancel, config.retry_backoff);
            }
            Err(e) => {
                tracing::info!(session, error = %e, "log file gone");
                let _ = tx.send(TailEvent::Ended { session });
                break;
            }
        }
    }
}

/// Block the worker thread for `duration` or until cancelled
fn sleep_unless_cancelled(handle: &Handle, cancel: &CancellationToken, duration: Duration) {
    handle.block_on(async {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodiscope_types::{LevelSelection, LogLevel};
    use std::collections::VecDeque;
    use std::fs::{self, OpenOptions};
    use std::io::{self, Write};
    use std::path::Path;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn fast_monitor() -> TailMonitor {
        TailMonitor::new(MonitorConfig {
            poll_interval: Duration::from_millis(20),
            retry_backoff: Duration::from_millis(50),
        })
    }

    fn request(path: &Path, filter: FilterSpec) -> SessionRequest {
        SessionRequest {
            path: path.to_path_buf(),
            options: TailOptions::default(),
            filter,
        }
    }

    fn append(path: &Path, content: &[u8]) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content).unwrap();
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<TailEvent>) -> TailEvent {
        timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for tail event")
            .expect("channel closed")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_initial_batch_then_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, "a info started\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        let session = monitor.start(request(&path, FilterSpec::pass_all()), tx).await;

        match next(&mut rx).await {
            TailEvent::Loaded { session: s, lines } => {
                assert_eq!(s, session);
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].level, LogLevel::Info);
            }
            other => panic!("unexpected event {other:?}"),
        }

        append(&path, b"x error y\nx error y\nlast warning line\n");

        match next(&mut rx).await {
            TailEvent::Line { line, .. } => assert_eq!(line.text, "x error y"),
            other => panic!("unexpected event {other:?}"),
        }
        match next(&mut rx).await {
            TailEvent::Line { line, .. } => {
                assert_eq!(line.text, "last warning line");
                assert_eq!(line.level, LogLevel::Warning);
            }
            other => panic!("unexpected event {other:?}"),
        }

        monitor.stop().await;
        assert!(!monitor.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_filter_applies_to_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, "").unwrap();

        let spec = FilterSpec::pass_all().with_levels(LevelSelection::only([LogLevel::Error]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        monitor.start(request(&path, spec), tx).await;
        assert!(matches!(next(&mut rx).await, TailEvent::Loaded { lines, .. } if lines.is_empty()));

        append(&path, b"a info b\nc error d\n");
        match next(&mut rx).await {
            TailEvent::Line { line, .. } => assert_eq!(line.text, "c error d"),
            other => panic!("unexpected event {other:?}"),
        }
        monitor.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_truncation_ends_session_and_restart_rereads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, "old info line one\nold info line two\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        let first = monitor
            .start(request(&path, FilterSpec::pass_all()), tx.clone())
            .await;
        assert!(matches!(next(&mut rx).await, TailEvent::Loaded { .. }));

        fs::write(&path, "new\n").unwrap();
        match next(&mut rx).await {
            TailEvent::Truncated { session } => assert_eq!(session, first),
            other => panic!("unexpected event {other:?}"),
        }

        let second = monitor
            .restart(request(&path, FilterSpec::pass_all()), tx)
            .await;
        assert!(second > first);
        match next(&mut rx).await {
            TailEvent::Loaded { session, lines } => {
                assert_eq!(session, second);
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].text, "new");
            }
            other => panic!("unexpected event {other:?}"),
        }
        monitor.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_failure_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.log");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        monitor.start(request(&path, FilterSpec::pass_all()), tx).await;

        match next(&mut rx).await {
            TailEvent::Failed { error, .. } => assert!(error.contains("not found")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_removed_file_ends_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, "a\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        monitor.start(request(&path, FilterSpec::pass_all()), tx).await;
        assert!(matches!(next(&mut rx).await, TailEvent::Loaded { .. }));

        fs::remove_file(&path).unwrap();
        assert!(matches!(next(&mut rx).await, TailEvent::Ended { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_silences_worker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, "a\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = fast_monitor();
        monitor.start(request(&path, FilterSpec::pass_all()), tx).await;
        assert!(matches!(next(&mut rx).await, TailEvent::Loaded { .. }));

        monitor.stop().await;
        append(&path, b"after stop\n");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The worker dropped its sender on exit
        assert!(rx.recv().await.is_none());
    }

    /// Replays scripted poll results, then stays idle
    struct Scripted(VecDeque<Result<PollOutcome, TailError>>);

    impl LineSource for Scripted {
        fn poll(&mut self) -> Result<PollOutcome, TailError> {
            self.0.pop_front().unwrap_or(Ok(PollOutcome::Idle))
        }
    }

    fn hiccup() -> Result<PollOutcome, TailError> {
        Err(TailError::from_io(Path::new("kodi.log"), io::Error::other("stale file handle")))
    }

    fn line(text: &str) -> Result<PollOutcome, TailError> {
        Ok(PollOutcome::Line(LogLine::new(text, LogLevel::Info)))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transient_errors_back_off_and_recover() {
        let mut source = Scripted(VecDeque::from([
            hiccup(),
            hiccup(),
            line("back info online"),
            hiccup(),
            line("again info online"),
        ]));
        let config = MonitorConfig {
            poll_interval: Duration::from_millis(20),
            retry_backoff: Duration::from_millis(20),
        };
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Handle::current();

        let worker = {
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || {
                follow(7, &mut source, &config, &cancel, &tx, &handle);
            })
        };

        // Repeated failures are reported once
        match next(&mut rx).await {
            TailEvent::Unavailable { session, reason } => {
                assert_eq!(session, 7);
                assert!(reason.contains("stale file handle"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(next(&mut rx).await, TailEvent::Recovered { session: 7 }));
        assert!(matches!(next(&mut rx).await, TailEvent::Line { line, .. } if line.text == "back info online"));

        assert!(matches!(next(&mut rx).await, TailEvent::Unavailable { .. }));
        assert!(matches!(next(&mut rx).await, TailEvent::Recovered { .. }));
        assert!(matches!(next(&mut rx).await, TailEvent::Line { line, .. } if line.text == "again info online"));

        // Still polling after recovery
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!worker.is_finished());

        cancel.cancel();
        timeout(WAIT, worker).await.unwrap().unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fatal_poll_error_ends_session() {
        let mut source = Scripted(VecDeque::from([Err(TailError::NotFound("kodi.log".into()))]));
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Handle::current();

        let config = MonitorConfig::default();
        let worker = tokio::task::spawn_blocking(move || {
            follow(1, &mut source, &config, &cancel, &tx, &handle);
        });

        assert!(matches!(next(&mut rx).await, TailEvent::Ended { session: 1 }));
        timeout(WAIT, worker).await.unwrap().unwrap();
    }
}
