use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use kodiscope_types::LogLevel;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    TextInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::Dismiss);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        let mut log_viewer = HashMap::new();
        // Level toggles
        log_viewer.insert(KeyBinding::new(KeyCode::Char('a')), Action::SelectAllLevels);
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('1')),
            Action::ToggleLevel(LogLevel::Debug),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('2')),
            Action::ToggleLevel(LogLevel::Info),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('3')),
            Action::ToggleLevel(LogLevel::Warning),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('4')),
            Action::ToggleLevel(LogLevel::Error),
        );
        log_viewer.insert(KeyBinding::new(KeyCode::Char('x')), Action::ResetFilters);
        // Keyword lists
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::NextKeywordList);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('K')), Action::PrevKeywordList);
        // Session
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenPath);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('l')), Action::ToggleFullLoad);
        // View
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::TogglePause);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearView);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportView);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('m')), Action::ShowSummary);
        log_viewer.insert(KeyBinding::new(KeyCode::Enter), Action::JumpToContext);
        // Line navigation
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        // Page navigation (less-style)
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation (less-style)
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('<')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('>')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Text input bindings (search or path bar active)
        let mut text_input = HashMap::new();
        text_input.insert(KeyBinding::new(KeyCode::Enter), Action::SubmitInput);
        text_input.insert(KeyBinding::new(KeyCode::Esc), Action::CancelInput);
        text_input.insert(KeyBinding::new(KeyCode::Backspace), Action::InputBackspace);
        text_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::InputClear);
        text_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CancelInput);
        bindings.insert(KeyContext::TextInput, text_input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while the input bar is active
    /// Returns Some(Action) for special keys and character input
    pub fn get_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::TextInput)
            .and_then(|input_bindings| input_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // For regular characters, return InputChar action
        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::InputChar(c));
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
