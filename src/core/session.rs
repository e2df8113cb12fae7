//! Widget presentation state

use serde::{Deserialize, Serialize};

/// Transient per-session UI state, reset whenever a controller is built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUiState {
    pub is_open: bool,
    pub is_minimized: bool,
    pub pending_input: String,
    pub is_awaiting_response: bool,
}

/// Whether input counts as empty.
///
/// Unicode whitespace plus the byte order mark, which browsers also strip
/// from form input.
pub fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}').is_empty()
}

/// The three reachable combinations of `is_open` and `is_minimized`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetState {
    Closed,
    OpenExpanded,
    OpenMinimized,
}

impl SessionUiState {
    pub fn widget_state(&self) -> WidgetState {
        match (self.is_open, self.is_minimized) {
            (false, _) => WidgetState::Closed,
            (true, false) => WidgetState::OpenExpanded,
            (true, true) => WidgetState::OpenMinimized,
        }
    }

    /// Whether the send button would be enabled
    pub fn can_submit(&self) -> bool {
        !is_blank(&self.pending_input) && !self.is_awaiting_response
    }
}
