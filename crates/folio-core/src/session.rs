//! Chat session orchestration.
//!
//! `ChatSession` owns the conversation, the user's color preference and the
//! window geometry. Submitted text goes through [`command::classify`]; help
//! and color commands are answered synchronously, plain queries are handed to
//! a [`Responder`] on a spawned task that the UI polls each tick.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::color::ColorValue;
use crate::command::{self, Command};
use crate::conversation::{ConversationStore, Message, Sender};
use crate::error::ResponseError;
use crate::geometry::{GeometryController, PhaseKind, Pointer, Viewport, WindowGeometry};
use crate::preference::{PreferenceStore, UserPreference};
use crate::responder::Responder;

pub const GREETING: &str = "Hi! I'm Pablo's AI assistant. I can answer questions about his experience, skills, projects, and background. What would you like to know?";

pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

pub const QUICK_REPLIES: &[&str] = &[
    "Tell me about your experience",
    "What skills do you have?",
    "Show me your projects",
    "What are your goals?",
];

pub const HELP_MESSAGE: &str = "\
## Help

### Ask a question
Type anything about Pablo's **experience**, **skills**, **projects**, **education** or **goals**.

### Change your message color
- type a color name, e.g. `teal`
- or a hex value, e.g. `#ff8800` or `#f80`
- or a phrase, e.g. `set color to navy`

### Window
- drag the title bar to move the chat
- drag the bottom-right corner to resize it
- press `Esc` to close";

/// Result of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; nothing changed.
    Ignored,
    /// A response is still in flight; nothing changed.
    Busy,
    /// Help or color change, answered immediately.
    Answered,
    /// A plain query is waiting on the responder.
    Pending,
}

pub struct ChatSession {
    store: ConversationStore,
    preference: UserPreference,
    preference_store: Arc<dyn PreferenceStore>,
    responder: Arc<dyn Responder>,
    pending: Option<JoinHandle<Result<String, ResponseError>>>,
    geometry: GeometryController,
    open: bool,
}

impl ChatSession {
    pub fn new(
        responder: Arc<dyn Responder>,
        preference_store: Arc<dyn PreferenceStore>,
        default_color: ColorValue,
    ) -> Self {
        let preference = UserPreference::load(preference_store.as_ref(), default_color);
        let mut store = ConversationStore::new();
        store.push_assistant(GREETING);

        Self {
            store,
            preference,
            preference_store,
            responder,
            pending: None,
            geometry: GeometryController::default(),
            open: false,
        }
    }

    // Conversation view

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn is_awaiting(&self) -> bool {
        self.store.awaiting_response()
    }

    pub fn preference(&self) -> &UserPreference {
        &self.preference
    }

    /// Color for user messages, read at render time so that a color change
    /// applies to every user message already shown.
    pub fn user_style(&self) -> &ColorValue {
        &self.preference.message_color
    }

    pub fn style_for(&self, message: &Message) -> Option<&ColorValue> {
        match message.sender {
            Sender::User => Some(self.user_style()),
            Sender::Assistant => None,
        }
    }

    /// Suggestions offered while only the greeting has been shown.
    pub fn quick_replies(&self) -> &'static [&'static str] {
        if self.store.len() == 1 && !self.is_awaiting() {
            QUICK_REPLIES
        } else {
            &[]
        }
    }

    // Exchange

    /// Submit one line of input. Must be called from within a tokio runtime.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.is_awaiting() {
            debug!("submission rejected while a response is pending");
            return SubmitOutcome::Busy;
        }

        self.store.push_user(text);
        self.store.set_awaiting(true);

        let command = command::classify(text);
        debug!(command = command.as_str(), "classified input");

        match command {
            Command::Help => {
                self.store.push_assistant(HELP_MESSAGE);
                self.store.set_awaiting(false);
                SubmitOutcome::Answered
            }
            Command::ColorChange(color) => {
                self.apply_color(color);
                self.store.set_awaiting(false);
                SubmitOutcome::Answered
            }
            Command::PlainQuery(query) => {
                let responder = Arc::clone(&self.responder);
                self.pending = Some(tokio::spawn(async move {
                    responder.respond(&query).await
                }));
                SubmitOutcome::Pending
            }
        }
    }

    fn apply_color(&mut self, color: ColorValue) {
        let confirmation = format!(
            "Message color set to **{}**.",
            color.display_name()
        );
        info!(color = %color, "message color changed");
        self.preference.message_color = color;
        if let Err(e) = self.preference.save(self.preference_store.as_ref()) {
            warn!(error = %e, "failed to persist message color");
        }
        self.store.push_assistant(confirmation);
    }

    /// Append the response if the in-flight query has settled. Returns true
    /// when a message was appended.
    pub async fn poll_response(&mut self) -> bool {
        match &self.pending {
            Some(handle) if handle.is_finished() => {}
            _ => return false,
        }
        match self.pending.take() {
            Some(handle) => {
                let result = handle.await;
                self.finish(result);
                true
            }
            None => false,
        }
    }

    /// Wait for the in-flight query, if any, and append its response.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            let result = handle.await;
            self.finish(result);
        }
    }

    fn finish(&mut self, result: Result<Result<String, ResponseError>, JoinError>) {
        let result = result.unwrap_or_else(|e| Err(ResponseError::TaskFailed(e.to_string())));
        let text = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "responder failed");
                APOLOGY.to_string()
            }
        };
        self.store.push_assistant(text);
        self.store.set_awaiting(false);
    }

    // Widget lifetime

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        if !self.open {
            info!("chat widget opened");
            self.open = true;
        }
    }

    /// Close the widget: cancel any in-flight query and reset the window
    /// geometry. The conversation itself is kept.
    pub fn close(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!("in-flight response cancelled on close");
        }
        self.store.set_awaiting(false);
        self.geometry.reset();
        if self.open {
            info!("chat widget closed");
        }
        self.open = false;
    }

    // Window geometry

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry.geometry()
    }

    pub fn geometry_phase(&self) -> PhaseKind {
        self.geometry.phase()
    }

    pub fn geometry_controller(&self) -> &GeometryController {
        &self.geometry
    }

    pub fn header_pressed(&mut self, pointer: Pointer, viewport: Viewport) -> bool {
        self.geometry.begin_drag(pointer, viewport)
    }

    pub fn resize_handle_pressed(&mut self, pointer: Pointer) -> bool {
        self.geometry.begin_resize(pointer)
    }

    pub fn pointer_moved(&mut self, pointer: Pointer, viewport: Viewport) -> bool {
        self.geometry.pointer_move(pointer, viewport)
    }

    pub fn pointer_released(&mut self) {
        self.geometry.pointer_up();
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;
    use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
    use crate::preference::{MemoryPreferenceStore, MESSAGE_COLOR_KEY};
    use crate::responder::ResponseEngine;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct FailingResponder;

    #[async_trait]
    impl Responder for FailingResponder {
        async fn respond(&self, _query: &str) -> Result<String, ResponseError> {
            Err(ResponseError::Unavailable("backend offline".to_string()))
        }
    }

    struct PanickingResponder;

    #[async_trait]
    impl Responder for PanickingResponder {
        async fn respond(&self, _query: &str) -> Result<String, ResponseError> {
            panic!("responder blew up");
        }
    }

    fn engine() -> Arc<dyn Responder> {
        Arc::new(ResponseEngine::new(KnowledgeBase::embedded().unwrap()))
    }

    fn session_with(responder: Arc<dyn Responder>) -> (ChatSession, Arc<MemoryPreferenceStore>) {
        let prefs = Arc::new(MemoryPreferenceStore::new());
        let session = ChatSession::new(responder, prefs.clone(), ColorValue::default());
        (session, prefs)
    }

    fn texts(session: &ChatSession) -> Vec<(Sender, String)> {
        session
            .messages()
            .iter()
            .map(|m| (m.sender, m.text.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_starts_with_greeting() {
        let (session, _) = session_with(engine());
        assert_eq!(texts(&session), vec![(Sender::Assistant, GREETING.to_string())]);
        assert_eq!(session.quick_replies(), QUICK_REPLIES);
        assert!(!session.is_awaiting());
    }

    #[tokio::test]
    async fn test_empty_submission_is_ignored() {
        let (mut session, _) = session_with(engine());
        let before = session.messages().len();
        assert_eq!(session.submit(""), SubmitOutcome::Ignored);
        assert_eq!(session.submit("   \t\n"), SubmitOutcome::Ignored);
        assert_eq!(session.messages().len(), before);
        assert!(!session.is_awaiting());
    }

    #[tokio::test]
    async fn test_help_answers_without_responder() {
        let (mut session, _) = session_with(Arc::new(FailingResponder));
        assert_eq!(session.submit("  HELP "), SubmitOutcome::Answered);
        assert!(!session.is_awaiting());
        let messages = texts(&session);
        assert_eq!(messages[1], (Sender::User, "  HELP ".to_string()));
        assert_eq!(messages[2], (Sender::Assistant, HELP_MESSAGE.to_string()));
        assert_eq!(messages.len(), 3);
        assert!(session.quick_replies().is_empty());
    }

    #[tokio::test]
    async fn test_color_change_updates_and_persists() {
        let (mut session, prefs) = session_with(Arc::new(FailingResponder));
        assert_eq!(session.submit("set color to teal"), SubmitOutcome::Answered);
        assert_eq!(session.user_style().hex(), "#008080");
        assert_eq!(prefs.get(MESSAGE_COLOR_KEY).as_deref(), Some("#008080"));
        assert_eq!(
            session.messages().last().unwrap().text,
            "Message color set to **teal**."
        );
        assert!(!session.is_awaiting());
    }

    #[tokio::test]
    async fn test_unnamed_color_confirmation_uses_hex() {
        let (mut session, _) = session_with(Arc::new(FailingResponder));
        session.submit("#123");
        assert_eq!(
            session.messages().last().unwrap().text,
            "Message color set to **#112233**."
        );
    }

    #[tokio::test]
    async fn test_color_changes_apply_to_earlier_messages() {
        let (mut session, _) = session_with(Arc::new(FailingResponder));
        session.submit("red");
        session.submit("#00f");

        let blue = color::resolve("blue").unwrap();
        let user_messages: Vec<&Message> = session
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::User)
            .collect();
        assert_eq!(user_messages.len(), 2);
        for message in user_messages {
            assert_eq!(session.style_for(message), Some(&blue));
        }
        assert_eq!(session.style_for(&session.messages()[0]), None);
    }

    #[tokio::test]
    async fn test_preference_loaded_from_store() {
        let prefs = Arc::new(MemoryPreferenceStore::new());
        prefs.set(MESSAGE_COLOR_KEY, "#ff0000").unwrap();
        let session = ChatSession::new(engine(), prefs, ColorValue::default());
        assert_eq!(session.user_style().name(), Some("red"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_query_answers_after_delay() {
        let (mut session, _) = session_with(engine());
        assert_eq!(
            session.submit("Tell me about your experience"),
            SubmitOutcome::Pending
        );
        assert!(session.is_awaiting());
        assert_eq!(session.messages().last().unwrap().sender, Sender::User);

        session.settle().await;

        let expected = KnowledgeBase::embedded().unwrap().entries()[0].response.clone();
        let last = session.messages().last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.text, expected);
        assert!(!session.is_awaiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_response_waits_for_completion() {
        let (mut session, _) = session_with(engine());
        session.submit("hello");
        assert!(!session.poll_response().await);
        assert!(session.is_awaiting());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(session.poll_response().await);
        assert!(!session.is_awaiting());
        assert_eq!(session.messages().len(), 3);
        assert!(!session.poll_response().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_submission_is_rejected() {
        let (mut session, _) = session_with(engine());
        assert_eq!(session.submit("skills"), SubmitOutcome::Pending);
        let len = session.messages().len();
        assert_eq!(session.submit("projects"), SubmitOutcome::Busy);
        assert_eq!(session.submit("help"), SubmitOutcome::Busy);
        assert_eq!(session.messages().len(), len);

        session.settle().await;
        assert_eq!(session.submit("projects"), SubmitOutcome::Pending);
    }

    #[tokio::test]
    async fn test_responder_error_appends_apology() {
        let (mut session, _) = session_with(Arc::new(FailingResponder));
        assert_eq!(session.submit("what's new?"), SubmitOutcome::Pending);
        session.settle().await;
        assert_eq!(session.messages().last().unwrap().text, APOLOGY);
        assert!(!session.is_awaiting());
        assert_eq!(session.submit("help"), SubmitOutcome::Answered);
    }

    #[tokio::test]
    async fn test_responder_panic_appends_apology() {
        let (mut session, _) = session_with(Arc::new(PanickingResponder));
        session.submit("anything");
        session.settle().await;
        assert_eq!(session.messages().last().unwrap().text, APOLOGY);
        assert!(!session.is_awaiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_in_flight_response() {
        let (mut session, _) = session_with(engine());
        session.open();
        session.submit("skills");
        let len = session.messages().len();

        session.close();
        assert!(!session.is_open());
        assert!(!session.is_awaiting());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!session.poll_response().await);
        session.settle().await;
        assert_eq!(session.messages().len(), len);
    }

    #[tokio::test]
    async fn test_close_resets_geometry() {
        let (mut session, _) = session_with(engine());
        session.open();
        let viewport = Viewport::new(100, 100);
        let start = session.geometry();
        assert!(session.header_pressed(Pointer::new(start.x + 1.0, start.y), viewport));
        session.pointer_moved(Pointer::new(1.0, 0.0), viewport);
        assert_ne!(session.geometry(), start);
        assert_eq!(session.geometry_phase(), PhaseKind::Dragging);

        session.close();
        assert_eq!(session.geometry(), WindowGeometry::default());
        assert_eq!(session.geometry_phase(), PhaseKind::Idle);
        assert_eq!(session.geometry_controller().listeners().active(), 0);
    }

    #[tokio::test]
    async fn test_geometry_callbacks() {
        let (mut session, _) = session_with(engine());
        let viewport = Viewport::new(200, 100);
        let g = session.geometry();
        let corner = Pointer::new((g.x + g.width) * 2.0, g.y + g.height);
        assert!(session.resize_handle_pressed(corner));
        assert!(!session.header_pressed(Pointer::new(0, 0), viewport));
        session.pointer_moved(Pointer::new(0, 0), viewport);
        session.pointer_released();
        let resized = session.geometry();
        assert_eq!((resized.width, resized.height), (30.0, 40.0));
        assert_eq!(session.geometry_phase(), PhaseKind::Idle);
    }
}
