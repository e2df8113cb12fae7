//! Terminal surfaces: transcript renderer and notification printer

use tokio::sync::watch;

use crate::conversation::{Message, Role};
use crate::core::{TranscriptSnapshot, WidgetState};
use crate::notify::{Notification, Notifier};

pub const TYPING_INDICATOR: &str = "  assistant is typing...";

pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    format!("[{}] {}: {}", message.display_time(), who, message.content)
}

/// Renders a transcript incrementally, printing each message once.
///
/// Nothing is shown unless the widget is open and expanded; messages that
/// arrive meanwhile are printed when it is expanded again.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    shown: usize,
    was_awaiting: bool,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for whatever changed since the last snapshot
    pub fn render(&mut self, snapshot: &TranscriptSnapshot) -> Vec<String> {
        if snapshot.widget != WidgetState::OpenExpanded {
            self.was_awaiting = false;
            return Vec::new();
        }

        let mut lines: Vec<String> = snapshot
            .messages
            .iter()
            .skip(self.shown)
            .map(format_message)
            .collect();
        self.shown = snapshot.messages.len();

        if snapshot.is_awaiting_response && !self.was_awaiting {
            lines.push(TYPING_INDICATOR.to_string());
        }
        self.was_awaiting = snapshot.is_awaiting_response;

        lines
    }
}

/// Print transcript updates until the controller goes away
pub async fn run(mut updates: watch::Receiver<TranscriptSnapshot>) {
    let mut renderer = TranscriptRenderer::new();

    loop {
        let lines = renderer.render(&updates.borrow_and_update());
        for line in lines {
            println!("{}", line);
        }

        if updates.changed().await.is_err() {
            break;
        }
    }
}

/// Prints notifications as a banner line
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        println!("** {}: {} **", notification.title, notification.description);
    }
}
