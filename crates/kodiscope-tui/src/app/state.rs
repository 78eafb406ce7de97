use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use kodiscope_logs::{CompiledFilter, FileStats, LogBuffer, keywords};
use kodiscope_types::{FilterSpec, LevelSelection, LogLevel};

/// Files above this size are not reloaded in full to show a line's context
pub const JUMP_SIZE_LIMIT: u64 = 50 * 1024 * 1024;

/// What the input bar is collecting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Search,
    OpenPath,
}

/// State of the tail session as last reported by the monitor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Availability {
    /// No file selected yet
    #[default]
    Idle,
    Live,
    Unavailable(String),
    /// The file disappeared
    Ended,
    Failed(String),
}

/// Result of asking to see the focused line in context
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JumpRequest {
    /// Nothing to jump to; the reason is shown to the user
    Refused(String),
    /// The view already holds the whole unfiltered file and now shows the line
    Landed,
    /// Filters were cleared and full load switched on; the session must restart
    Reload,
}

/// UI-specific transient state
pub struct UiState {
    /// Active input bar, if any
    pub input_mode: Option<InputMode>,

    /// Current input text
    pub input: String,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// System summary overlay content
    pub summary: Option<String>,

    /// One-line notice shown in the status bar
    pub message: Option<String>,

    /// Scroll position in log viewer
    pub log_scroll: usize,

    /// Auto-scroll enabled (follow mode)?
    pub auto_scroll: bool,

    /// Line landed on by the last jump, highlighted until the next tick
    pub jump_highlight: Option<usize>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            input_mode: None,
            input: String::new(),
            help_visible: false,
            summary: None,
            message: None,
            log_scroll: 0,
            auto_scroll: true,
            jump_highlight: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Log file being monitored
    pub path: Option<PathBuf>,

    /// Read the whole file instead of the tail window
    pub full_load: bool,

    pub levels: LevelSelection,

    /// Case-insensitive search query
    pub query: String,

    /// Directory holding keyword lists
    pub keyword_dir: PathBuf,

    /// Names of the available keyword lists
    pub keyword_lists: Vec<String>,

    /// Selected keyword list (None = no keyword filter)
    pub keyword_list: Option<String>,

    /// Keywords of the selected list
    pub keywords: Vec<String>,

    /// Keyword highlighter for rendering
    pub highlighter: CompiledFilter,

    /// Drop appended lines instead of showing them
    pub paused: bool,

    pub availability: Availability,

    /// Size and line count of the file on disk
    pub file_stats: Option<FileStats>,

    /// Id of the session whose events are accepted
    pub session: u64,

    /// Timestamp to show once the reloaded session delivers its lines
    pub pending_jump: Option<NaiveDateTime>,

    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(keyword_dir: impl Into<PathBuf>) -> Self {
        let mut state = Self {
            path: None,
            full_load: false,
            levels: LevelSelection::all(),
            query: String::new(),
            keyword_dir: keyword_dir.into(),
            keyword_lists: Vec::new(),
            keyword_list: None,
            keywords: Vec::new(),
            highlighter: CompiledFilter::pass_all(),
            paused: false,
            availability: Availability::Idle,
            file_stats: None,
            session: 0,
            pending_jump: None,
            ui_state: UiState::default(),
            should_quit: false,
        };
        state.refresh_keyword_lists();
        state
    }

    /// The line predicate for the next session
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::pass_all()
            .with_levels(self.levels.clone())
            .with_query(self.query.trim())
            .with_keywords(self.keywords.clone())
    }

    pub fn toggle_level(&mut self, level: LogLevel) {
        self.levels.toggle(level);
    }

    pub fn select_all_levels(&mut self) {
        self.levels.select_all();
    }

    /// Back to all levels, no query, no keyword list
    pub fn reset_filters(&mut self) {
        self.levels.select_all();
        self.query.clear();
        self.select_keyword_list(None);
    }

    /// Re-scan the keyword directory
    ///
    /// A selected list that vanished is deselected.
    pub fn refresh_keyword_lists(&mut self) {
        self.keyword_lists = keywords::available_lists(&self.keyword_dir);
        if let Some(name) = &self.keyword_list
            && !self.keyword_lists.contains(name)
        {
            self.select_keyword_list(None);
        }
    }

    /// Select a keyword list by name and load its keywords
    pub fn select_keyword_list(&mut self, name: Option<String>) {
        self.keywords = match &name {
            Some(name) => keywords::load_named(&self.keyword_dir, name),
            None => Vec::new(),
        };
        self.keyword_list = name;
        self.highlighter =
            CompiledFilter::new(&FilterSpec::pass_all().with_keywords(self.keywords.clone()));
    }

    /// Step through "none" and every available list, wrapping around
    pub fn cycle_keyword_list(&mut self, forward: bool) {
        self.refresh_keyword_lists();

        // Position 0 is "none", list i sits at i + 1
        let slots = self.keyword_lists.len() + 1;
        let current = self
            .keyword_list
            .as_ref()
            .and_then(|name| self.keyword_lists.iter().position(|l| l == name))
            .map_or(0, |i| i + 1);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };

        let name = next.checked_sub(1).map(|i| self.keyword_lists[i].clone());
        self.select_keyword_list(name);
    }

    /// Open the input bar, pre-filled with the current value
    pub fn start_input(&mut self, mode: InputMode) {
        self.ui_state.input = match mode {
            InputMode::Search => self.query.clone(),
            InputMode::OpenPath => self
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        };
        self.ui_state.input_mode = Some(mode);
    }

    /// Close the input bar without applying it
    pub fn cancel_input(&mut self) {
        self.ui_state.input_mode = None;
        self.ui_state.input.clear();
    }

    /// Close the input bar, returning what was typed
    pub fn submit_input(&mut self) -> Option<(InputMode, String)> {
        let mode = self.ui_state.input_mode.take()?;
        Some((mode, std::mem::take(&mut self.ui_state.input)))
    }

    pub fn input_char(&mut self, c: char) {
        self.ui_state.input.push(c);
    }

    pub fn input_backspace(&mut self) {
        self.ui_state.input.pop();
    }

    /// Point the monitor at a new file
    pub fn set_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
        self.file_stats = None;
    }

    /// Scroll back to the live end of the view
    pub fn reset_view(&mut self) {
        self.ui_state.log_scroll = 0;
        self.ui_state.auto_scroll = true;
        self.ui_state.jump_highlight = None;
    }

    /// Buffer index of the line a jump starts from
    ///
    /// The newest line while following, otherwise the top visible line.
    pub fn focused_index(&self, total: usize) -> Option<usize> {
        let last = total.checked_sub(1)?;
        if self.ui_state.auto_scroll {
            Some(last)
        } else {
            Some(self.ui_state.log_scroll.min(last))
        }
    }

    /// Prepare to show the focused line among its unfiltered neighbours
    ///
    /// The view is paused either way. When levels, query or keywords hide
    /// lines, or only the tail is loaded, they are cleared and the caller must
    /// restart the session; the jump then completes in [`AppState::finish_jump`].
    pub fn request_jump(&mut self, buffer: &LogBuffer) -> JumpRequest {
        let Some(index) = self.focused_index(buffer.len()) else {
            return JumpRequest::Refused("No line to jump from".into());
        };
        let Some(timestamp) = buffer.get(index).and_then(|line| line.timestamp) else {
            return JumpRequest::Refused("Line has no timestamp".into());
        };

        if self.full_load && self.filter_spec().is_empty() {
            self.paused = true;
            self.land_jump(buffer, timestamp);
            return JumpRequest::Landed;
        }

        if let Some(stats) = &self.file_stats
            && stats.size > JUMP_SIZE_LIMIT
        {
            return JumpRequest::Refused(format!(
                "File too large to reload in full ({})",
                stats.human_size()
            ));
        }

        self.paused = true;
        self.reset_filters();
        self.full_load = true;
        self.pending_jump = Some(timestamp);
        JumpRequest::Reload
    }

    /// Complete a jump once the reloaded lines are in the buffer
    pub fn finish_jump(&mut self, buffer: &LogBuffer) {
        if let Some(timestamp) = self.pending_jump.take() {
            self.land_jump(buffer, timestamp);
        }
    }

    fn land_jump(&mut self, buffer: &LogBuffer, timestamp: NaiveDateTime) {
        match buffer.position_of(timestamp) {
            Some(index) => {
                self.ui_state.auto_scroll = false;
                self.ui_state.log_scroll = index;
                self.ui_state.jump_highlight = Some(index);
            }
            None => self.show_message(format!("{timestamp} is no longer in the file")),
        }
    }

    pub fn show_message(&mut self, msg: impl Into<String>) {
        self.ui_state.message = Some(msg.into());
    }

    /// Close the topmost overlay, or the message if none is open
    pub fn dismiss(&mut self) {
        if self.ui_state.help_visible {
            self.ui_state.help_visible = false;
        } else if self.ui_state.summary.is_some() {
            self.ui_state.summary = None;
        } else {
            self.ui_state.message = None;
        }
    }

    /// Check if an event belongs to the current session
    pub fn is_current(&self, session: u64) -> bool {
        session == self.session
    }
}
