mod action;
mod state;

pub use action::Action;
pub use state::{AppState, Availability, InputMode, JUMP_SIZE_LIMIT, JumpRequest, UiState};
