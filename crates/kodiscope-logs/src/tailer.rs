use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use kodiscope_types::LogLine;

use crate::error::TailError;
use crate::filter::CompiledFilter;
use crate::parser::LogParser;
use crate::recency::{DEDUP_CAPACITY, RecencyCache};

/// Bytes scanned back from the end of the file in tail mode
pub const WINDOW_BYTES: u64 = 100_000;

/// Lines kept from the back-scan window in tail mode
pub const TAIL_LINES: usize = 1000;

/// How a session reads its file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailOptions {
    /// Read from the start instead of the last `tail_lines` lines
    pub full_load: bool,

    /// Back-scan window for tail mode
    pub window_bytes: u64,

    /// Lines kept from the window in tail mode
    pub tail_lines: usize,

    /// Recency cache size
    pub dedup_capacity: usize,
}

impl TailOptions {
    pub fn full_load(full_load: bool) -> Self {
        Self {
            full_load,
            ..Self::default()
        }
    }
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            full_load: false,
            window_bytes: WINDOW_BYTES,
            tail_lines: TAIL_LINES,
            dedup_capacity: DEDUP_CAPACITY,
        }
    }
}

/// Result of a single poll
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// A new line passed the filter
    Line(LogLine),
    /// A line was consumed but filtered out or suppressed as a duplicate
    Skipped,
    /// Nothing new (or only part of a line so far)
    Idle,
    /// The file shrank below the cursor; the session must be re-opened
    Truncated,
    /// The file no longer exists
    Missing,
}

/// Incremental reader for one log file
///
/// Owns the file handle, the read cursor and the recency cache of one
/// session. A new session means a new `Tailer`.
pub struct Tailer {
    path: PathBuf,
    reader: BufReader<File>,

    /// Bytes consumed from the start of the file
    cursor: u64,

    /// Bytes of a line whose newline has not been written yet
    pending: Vec<u8>,

    /// The window began inside a line that had no newline yet
    skip_to_newline: bool,

    filter: CompiledFilter,
    recent: RecencyCache,
}

impl Tailer {
    /// Open a file and read its initial window
    ///
    /// Returns the tailer positioned after the window together with the lines
    /// of the window that pass the filter, in file order.
    pub fn open(
        path: impl AsRef<Path>,
        options: &TailOptions,
        filter: CompiledFilter,
    ) -> Result<(Self, Vec<LogLine>), TailError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |e: io::Error| TailError::from_io(&path, e);

        let file = File::open(&path).map_err(io_err)?;
        let size = file.metadata().map_err(io_err)?.len();

        let mut tailer = Self {
            reader: BufReader::new(file),
            cursor: 0,
            pending: Vec::new(),
            skip_to_newline: false,
            recent: RecencyCache::new(options.dedup_capacity),
            filter,
            path: path.clone(),
        };

        let start = if options.full_load {
            0
        } else {
            size.saturating_sub(options.window_bytes)
        };
        if start > 0 {
            tailer.skip_partial_line(start).map_err(io_err)?;
        }

        let mut raw_lines = tailer.read_complete_lines().map_err(io_err)?;
        if !options.full_load {
            let excess = raw_lines.len().saturating_sub(options.tail_lines);
            raw_lines.drain(..excess);
        }

        let lines: Vec<LogLine> = raw_lines
            .iter()
            .filter_map(|raw| tailer.admit(raw))
            .collect();

        tracing::debug!(
            path = %path.display(),
            size,
            start,
            cursor = tailer.cursor,
            emitted = lines.len(),
            full_load = options.full_load,
            "opened log file"
        );

        Ok((tailer, lines))
    }

    /// Read at most one more line
    pub fn poll(&mut self) -> Result<PollOutcome, TailError> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PollOutcome::Missing),
            Err(e) => return Err(TailError::from_io(&self.path, e)),
        };

        if size < self.cursor {
            tracing::info!(
                path = %self.path.display(),
                size,
                cursor = self.cursor,
                "log file shrank, session must restart"
            );
            return Ok(PollOutcome::Truncated);
        }

        let n = read_counted(&mut self.reader, &mut self.pending, &mut self.cursor)
            .map_err(|e| TailError::from_io(&self.path, e))?;

        if n == 0 || !self.pending.ends_with(b"\n") {
            return Ok(PollOutcome::Idle);
        }

        let raw = std::mem::take(&mut self.pending);
        if std::mem::take(&mut self.skip_to_newline) {
            // Remainder of the line the window cut into
            return Ok(PollOutcome::Skipped);
        }
        Ok(match self.admit(&raw) {
            Some(line) => PollOutcome::Line(line),
            None => PollOutcome::Skipped,
        })
    }

    /// Path being tailed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Position at `start`, dropping the line it falls inside of
    ///
    /// Reading resumes one byte early so that a window starting exactly on a
    /// line boundary keeps its first line.
    fn skip_partial_line(&mut self, start: u64) -> io::Result<()> {
        let from = start - 1;
        self.reader.seek(SeekFrom::Start(from))?;
        let mut discarded = Vec::new();
        let n = self.reader.read_until(b'\n', &mut discarded)?;
        self.cursor = from + n as u64;
        self.skip_to_newline = !discarded.ends_with(b"\n");
        Ok(())
    }

    /// Read every complete line up to EOF, holding back a trailing fragment
    fn read_complete_lines(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        loop {
            let mut buf = std::mem::take(&mut self.pending);
            let n = read_counted(&mut self.reader, &mut buf, &mut self.cursor)?;
            if buf.ends_with(b"\n") {
                if !std::mem::take(&mut self.skip_to_newline) {
                    lines.push(buf);
                }
            } else {
                self.pending = buf;
            }
            if n == 0 || !self.pending.is_empty() {
                break;
            }
        }
        Ok(lines)
    }

    /// Decode, classify, filter and de-duplicate one raw line
    fn admit(&mut self, raw: &[u8]) -> Option<LogLine> {
        let decoded = String::from_utf8_lossy(raw);
        let line = LogParser::parse(&decoded);
        if !self.filter.matches(&line.text, line.level) {
            return None;
        }
        if !self.recent.check_and_insert(&line.text) {
            return None;
        }
        Some(line)
    }
}

/// Read through the next newline into `buf`
///
/// Every byte taken from the reader is added to `cursor`, including those
/// appended before a read error.
fn read_counted(
    reader: &mut impl BufRead,
    buf: &mut Vec<u8>,
    cursor: &mut u64,
) -> io::Result<usize> {
    let before = buf.len();
    let result = reader.read_until(b'\n', buf);
    *cursor += (buf.len() - before) as u64;
    result
}

impl std::fmt::Debug for Tailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tailer")
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .field("pending", &self.pending.len())
            .field("skip_to_newline", &self.skip_to_newline)
            .field("filter", &self.filter)
            .finish()
    }
}
