//! Core assistant components
//!
//! This module contains the session logic behind the assistant widget.

mod controller;
mod latency;
mod session;

pub use controller::{ConversationController, SubmitOutcome, TranscriptSnapshot};
pub use session::WidgetState;
