mod help_overlay;
mod status_bar;
mod summary_overlay;

pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, viewer_hints};
pub use summary_overlay::SummaryOverlay;
