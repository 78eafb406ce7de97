use kodiscope_types::LogLevel;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    /// Close whatever overlay or message is showing
    Dismiss,

    // Filters (each of these replaces the tail session)
    ToggleLevel(LogLevel),
    SelectAllLevels,
    ResetFilters,
    NextKeywordList,
    PrevKeywordList,
    ToggleFullLoad,

    // Text input bar
    OpenSearch,
    OpenPath,
    InputChar(char),
    InputBackspace,
    InputClear,
    SubmitInput,
    CancelInput,

    // View
    TogglePause,
    ClearView,
    ExportView,
    ShowSummary,
    /// Show the focused line in the unfiltered file
    JumpToContext,

    // Scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
}
