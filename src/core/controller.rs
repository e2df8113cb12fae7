//! Conversation controller
//!
//! The controller owns one session: the transcript, the widget's UI state
//! and at most one pending assistant reply. It:
//! 1. Accepts user input and appends it to the transcript
//! 2. Schedules the assistant reply through the [`LatencySimulator`]
//! 3. Drives the Closed / OpenExpanded / OpenMinimized state machine
//! 4. Fires the "assistant available" notification on the first open
//! 5. Publishes transcript snapshots to display surfaces
//!
//! Tearing the controller down (explicitly or by dropping it) cancels the
//! pending reply, so nothing is appended to a discarded transcript.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::{builtin, Config};
use crate::conversation::{Message, MessageId, Transcript};
use crate::intent::RuleTable;
use crate::notify::{Notification, Notifier};

use super::latency::{LatencySimulator, ScheduledResponse};
use super::session::{is_blank, SessionUiState, WidgetState};

/// What a display surface needs to render the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSnapshot {
    pub messages: Vec<Message>,
    pub is_awaiting_response: bool,
    /// The message list is only visible while `OpenExpanded`
    pub widget: WidgetState,
}

/// Result of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// User message appended, reply scheduled
    Accepted(MessageId),
    /// Input was blank, nothing happened
    Empty,
    /// A reply is still pending, input ignored
    Busy,
    /// The controller has been torn down
    TornDown,
}

struct Session {
    transcript: Transcript,
    ui: SessionUiState,
    has_greeted: bool,
    torn_down: bool,
    updates: watch::Sender<TranscriptSnapshot>,
}

impl Session {
    fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            messages: self.transcript.messages().to_vec(),
            is_awaiting_response: self.ui.is_awaiting_response,
            widget: self.ui.widget_state(),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ConversationController {
    id: Uuid,
    session: Arc<Mutex<Session>>,
    latency: LatencySimulator,
    notifier: Arc<dyn Notifier>,
    notify_duration_ms: u64,
    pending: Option<ScheduledResponse>,
}

impl ConversationController {
    /// Create a controller with the welcome message already in place
    pub fn new(config: &Config, rules: Arc<RuleTable>, notifier: Arc<dyn Notifier>) -> Self {
        let transcript = Transcript::with_welcome(builtin::WELCOME, Utc::now());
        let initial = TranscriptSnapshot {
            messages: transcript.messages().to_vec(),
            is_awaiting_response: false,
            widget: WidgetState::Closed,
        };
        let (updates, _) = watch::channel(initial);

        let id = Uuid::new_v4();
        tracing::debug!(session = %id, rules = rules.len(), "Conversation controller created");

        Self {
            id,
            session: Arc::new(Mutex::new(Session {
                transcript,
                ui: SessionUiState::default(),
                has_greeted: false,
                torn_down: false,
                updates,
            })),
            latency: LatencySimulator::new(config.response_delay(), rules),
            notifier,
            notify_duration_ms: config.notify_duration_ms,
            pending: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Submit user text.
    ///
    /// Blank input is ignored. While a reply is pending further input is
    /// ignored too, so replies can never overlap.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let mut session = lock(&self.session);

        if session.torn_down {
            return SubmitOutcome::TornDown;
        }
        if is_blank(text) {
            return SubmitOutcome::Empty;
        }
        if session.ui.is_awaiting_response {
            tracing::debug!(session = %self.id, "Ignoring input while a reply is pending");
            return SubmitOutcome::Busy;
        }

        let message_id = session.transcript.add_user(text, Utc::now());
        session.ui.pending_input.clear();
        session.ui.is_awaiting_response = true;
        session.publish();
        drop(session);

        tracing::debug!(session = %self.id, message = %message_id, "User message accepted");

        let weak = Arc::downgrade(&self.session);
        self.pending = Some(
            self.latency
                .schedule_response(text.to_string(), move |response| deliver(&weak, &response)),
        );

        SubmitOutcome::Accepted(message_id)
    }

    /// Submit whatever is in the input box
    pub fn submit_pending(&mut self) -> SubmitOutcome {
        let text = lock(&self.session).ui.pending_input.clone();
        self.submit(&text)
    }

    pub fn set_input(&self, text: &str) {
        let mut session = lock(&self.session);
        if !session.torn_down {
            session.ui.pending_input = text.to_string();
        }
    }

    pub fn can_submit(&self) -> bool {
        let session = lock(&self.session);
        !session.torn_down && session.ui.can_submit()
    }

    /// Open the widget, expanded. The first open of a session also shows the
    /// "assistant available" notification.
    pub fn open(&self) {
        let mut session = lock(&self.session);
        if session.torn_down {
            return;
        }

        session.ui.is_open = true;
        session.ui.is_minimized = false;
        let first_open = !session.has_greeted;
        session.has_greeted = true;
        session.publish();
        drop(session);

        tracing::debug!(session = %self.id, first_open, "Widget opened");

        if first_open {
            self.notifier
                .notify(Notification::assistant_available(self.notify_duration_ms));
        }
    }

    pub fn close(&self) {
        let mut session = lock(&self.session);
        if session.torn_down {
            return;
        }

        session.ui.is_open = false;
        session.ui.is_minimized = false;
        session.publish();
        tracing::debug!(session = %self.id, "Widget closed");
    }

    pub fn toggle_open(&self) {
        if self.state() == WidgetState::Closed {
            self.open();
        } else {
            self.close();
        }
    }

    /// Flip between expanded and minimized. No effect while closed.
    pub fn toggle_minimize(&self) {
        let mut session = lock(&self.session);
        if session.torn_down || !session.ui.is_open {
            return;
        }

        session.ui.is_minimized = !session.ui.is_minimized;
        session.publish();
        tracing::debug!(
            session = %self.id,
            minimized = session.ui.is_minimized,
            "Widget minimize toggled"
        );
    }

    pub fn state(&self) -> WidgetState {
        lock(&self.session).ui.widget_state()
    }

    pub fn is_awaiting_response(&self) -> bool {
        lock(&self.session).ui.is_awaiting_response
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.session).transcript.messages().to_vec()
    }

    /// Read-only feed of transcript changes for a display surface
    pub fn subscribe(&self) -> watch::Receiver<TranscriptSnapshot> {
        lock(&self.session).updates.subscribe()
    }

    pub fn rules(&self) -> &RuleTable {
        self.latency.rules()
    }

    /// Cancel any pending reply and freeze the session. Idempotent.
    pub fn teardown(&mut self) {
        {
            let mut session = lock(&self.session);
            if session.torn_down {
                return;
            }
            session.torn_down = true;
        }

        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }

        tracing::debug!(session = %self.id, "Conversation controller torn down");
    }
}

#[cfg(test)]
impl ConversationController {
    fn ui(&self) -> SessionUiState {
        lock(&self.session).ui.clone()
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Append the assistant reply, unless the session is gone or torn down
fn deliver(session: &Weak<Mutex<Session>>, response: &str) {
    let Some(session) = session.upgrade() else {
        return;
    };
    let mut session = lock(&session);
    if session.torn_down {
        return;
    }

    session.transcript.add_assistant(response, Utc::now());
    session.ui.is_awaiting_response = false;
    session.publish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::intent::Rule;
    use crate::notify::testing::RecordingNotifier;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(1000);

    fn controller_with(rules: RuleTable) -> (ConversationController, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let controller = ConversationController::new(
            &Config::default(),
            Arc::new(rules),
            Arc::new(notifier.clone()),
        );
        (controller, notifier)
    }

    fn controller() -> (ConversationController, RecordingNotifier) {
        controller_with(RuleTable::builtin())
    }

    async fn elapse(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[test]
    fn test_initial_state() {
        let (controller, notifier) = controller();

        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId::WELCOME);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, builtin::WELCOME);

        assert_eq!(controller.state(), WidgetState::Closed);
        assert_eq!(controller.ui(), SessionUiState::default());
        assert!(notifier.seen().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let (mut controller, _) = controller();

        for input in ["", "   ", "\n\t ", "\u{FEFF}", " \u{FEFF}\u{00A0}"] {
            assert_eq!(controller.submit(input), SubmitOutcome::Empty);
        }

        assert_eq!(controller.messages().len(), 1);
        assert!(!controller.is_awaiting_response());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_then_reply() {
        let (mut controller, _) = controller();

        let outcome = controller.submit("Where do I track feeding?");
        let SubmitOutcome::Accepted(id) = outcome else {
            panic!("expected Accepted, got {:?}", outcome);
        };

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, id);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Where do I track feeding?");
        assert!(controller.is_awaiting_response());

        elapse(DELAY - Duration::from_millis(1)).await;
        assert_eq!(controller.messages().len(), 2);

        elapse(Duration::from_millis(2)).await;
        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(
            messages[2].content,
            controller.rules().classify("Where do I track feeding?")
        );
        assert!(messages[2].id > id);
        assert!(!controller.is_awaiting_response());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_reply() {
        let (mut controller, _) = controller();

        controller.submit("asdkjqwzzd");
        elapse(DELAY * 2).await;

        assert_eq!(controller.messages()[2].content, builtin::FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_submit_ignored() {
        let rules = RuleTable::new(
            vec![Rule::new(["hello"], "R1"), Rule::new(["help"], "R2")],
            "fallback",
        );
        let (mut controller, _) = controller_with(rules);

        assert!(matches!(controller.submit("hello"), SubmitOutcome::Accepted(_)));
        assert_eq!(controller.submit("help"), SubmitOutcome::Busy);
        assert_eq!(controller.messages().len(), 2);

        elapse(DELAY * 3).await;
        let contents: Vec<_> = controller.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents[1..], ["hello".to_string(), "R1".to_string()]);

        assert!(matches!(controller.submit("help"), SubmitOutcome::Accepted(_)));
        elapse(DELAY + Duration::from_millis(1)).await;
        assert_eq!(controller.messages().last().unwrap().content, "R2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_input() {
        let (mut controller, _) = controller();

        assert!(!controller.can_submit());
        assert_eq!(controller.submit_pending(), SubmitOutcome::Empty);

        controller.set_input("thanks!");
        assert!(controller.can_submit());

        assert!(matches!(controller.submit_pending(), SubmitOutcome::Accepted(_)));
        assert!(controller.ui().pending_input.is_empty());

        controller.set_input("more");
        assert!(!controller.can_submit());

        elapse(DELAY + Duration::from_millis(1)).await;
        assert!(controller.can_submit());
    }

    #[test]
    fn test_state_machine_and_single_notification() {
        let (controller, notifier) = controller();

        controller.open();
        assert_eq!(controller.state(), WidgetState::OpenExpanded);
        controller.toggle_minimize();
        assert_eq!(controller.state(), WidgetState::OpenMinimized);
        controller.toggle_minimize();
        assert_eq!(controller.state(), WidgetState::OpenExpanded);
        controller.close();
        assert_eq!(controller.state(), WidgetState::Closed);

        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], Notification::assistant_available(3000));

        controller.toggle_open();
        assert_eq!(controller.state(), WidgetState::OpenExpanded);
        controller.toggle_open();
        assert_eq!(controller.state(), WidgetState::Closed);
        assert_eq!(notifier.seen().len(), 1);
        assert_eq!(controller.messages().len(), 1);
    }

    #[test]
    fn test_minimize_while_closed_is_noop() {
        let (controller, _) = controller();

        controller.toggle_minimize();
        assert_eq!(controller.state(), WidgetState::Closed);
        assert!(!controller.ui().is_minimized);
    }

    #[test]
    fn test_reopen_from_minimized_expands() {
        let (controller, _) = controller();

        controller.open();
        controller.toggle_minimize();
        controller.toggle_open();
        controller.toggle_open();
        assert_eq!(controller.state(), WidgetState::OpenExpanded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_reply() {
        let (mut controller, _) = controller();

        controller.submit("hello");
        elapse(DELAY / 2).await;

        controller.teardown();
        let at_teardown = controller.messages();

        elapse(DELAY * 5).await;
        assert_eq!(controller.messages(), at_teardown);
        assert_eq!(at_teardown.len(), 2);
        assert!(controller.is_awaiting_response());

        assert_eq!(controller.submit("again"), SubmitOutcome::TornDown);
        controller.open();
        assert_eq!(controller.state(), WidgetState::Closed);
        controller.teardown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_reply() {
        let (mut controller, _) = controller();
        let mut updates = controller.subscribe();

        controller.submit("hello");
        drop(controller);

        elapse(DELAY * 5).await;
        let last = updates.borrow_and_update().clone();
        assert_eq!(last.messages.len(), 2);
        assert!(last.is_awaiting_response);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let (mut controller, _) = controller();
        let mut updates = controller.subscribe();
        assert_eq!(updates.borrow_and_update().messages.len(), 1);

        controller.submit("community groups?");
        updates.changed().await.unwrap();
        {
            let snapshot = updates.borrow_and_update();
            assert_eq!(snapshot.messages.len(), 2);
            assert!(snapshot.is_awaiting_response);
        }

        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.messages.len(), 3);
        assert!(!snapshot.is_awaiting_response);
        assert!(snapshot.messages[2].content.contains("Community"));
    }

    #[tokio::test]
    async fn test_snapshots_track_widget_state() {
        let (controller, _) = controller();
        let mut updates = controller.subscribe();
        assert_eq!(updates.borrow_and_update().widget, WidgetState::Closed);

        controller.open();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().widget, WidgetState::OpenExpanded);

        controller.toggle_minimize();
        assert_eq!(updates.borrow_and_update().widget, WidgetState::OpenMinimized);

        controller.close();
        assert_eq!(updates.borrow_and_update().widget, WidgetState::Closed);
    }
}
