use std::sync::Arc;

use folio_core::{
    ChatSession, Config, FilePreferenceStore, MemoryPreferenceStore, Pointer, PreferenceStore,
    ResponseEngine, SubmitOutcome, Viewport,
};
use ratatui::layout::Rect;
use tracing::warn;

use crate::markup::MarkupStyles;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Hit-test regions of the floating window, refreshed on every render.
#[derive(Debug, Clone, Default)]
pub struct WindowAreas {
    pub window: Option<Rect>,
    pub header: Option<Rect>,
    pub close_button: Option<Rect>,
    pub resize_handle: Option<Rect>,
    pub messages: Option<Rect>,
    pub quick_replies: Vec<(Rect, &'static str)>,
}

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession,

    // Input line
    pub input: String,
    pub input_cursor: usize,
    quick_reply_idx: Option<usize>,

    // Chat scroll state
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,
    pub total_chat_lines: u16,

    // Layout
    pub viewport: Viewport,
    pub areas: WindowAreas,
    pub styles: MarkupStyles,

    // Typing animation, 0-2
    pub animation_frame: u8,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let knowledge = config.knowledge_base()?;
        let responder = ResponseEngine::new(knowledge).with_delay(config.response_delay());

        let preferences: Arc<dyn PreferenceStore> = if config.persist_preferences() {
            match Config::app_dir() {
                Ok(dir) => Arc::new(FilePreferenceStore::in_dir(&dir)),
                Err(e) => {
                    warn!(error = %e, "no config directory, preferences will not persist");
                    Arc::new(MemoryPreferenceStore::new())
                }
            }
        } else {
            Arc::new(MemoryPreferenceStore::new())
        };

        let session = ChatSession::new(Arc::new(responder), preferences, config.default_color());
        Ok(Self::with_session(session))
    }

    pub fn with_session(session: ChatSession) -> Self {
        Self {
            should_quit: false,
            session,

            input: String::new(),
            input_cursor: 0,
            quick_reply_idx: None,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            total_chat_lines: 0,

            viewport: Viewport::new(80, 24),
            areas: WindowAreas::default(),
            styles: MarkupStyles::default(),

            animation_frame: 0,
        }
    }

    // Widget lifetime

    pub fn open_chat(&mut self) {
        self.session.open();
        self.follow_bottom = true;
    }

    pub fn close_chat(&mut self) {
        self.session.close();
        self.areas = WindowAreas::default();
        self.quick_reply_idx = None;
    }

    /// Input is disabled while a response is pending.
    pub fn input_enabled(&self) -> bool {
        self.session.is_open() && !self.session.is_awaiting()
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        if !self.input_enabled() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if !self.input_enabled() || self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if !self.input_enabled() {
            return;
        }
        let char_count = self.input.chars().count();
        if self.input_cursor < char_count {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    /// Fill the input with the next quick reply, if any are on offer.
    pub fn cycle_quick_reply(&mut self) {
        let replies = self.session.quick_replies();
        if replies.is_empty() || !self.input_enabled() {
            return;
        }
        let next = self.quick_reply_idx.map(|i| (i + 1) % replies.len()).unwrap_or(0);
        self.quick_reply_idx = Some(next);
        self.input = replies[next].to_string();
        self.cursor_end();
    }

    /// Submit the input line. The line is only cleared when the session
    /// accepted it.
    pub fn submit_input(&mut self) -> SubmitOutcome {
        let text = self.input.clone();
        let outcome = self.submit(&text);
        if matches!(outcome, SubmitOutcome::Answered | SubmitOutcome::Pending) {
            self.input.clear();
            self.input_cursor = 0;
        }
        outcome
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let outcome = self.session.submit(text);
        if outcome != SubmitOutcome::Ignored && outcome != SubmitOutcome::Busy {
            self.quick_reply_idx = None;
            self.follow_bottom = true;
        }
        outcome
    }

    // Async bookkeeping

    /// Called on every tick: advance the typing animation and pick up a
    /// settled response.
    pub async fn on_tick(&mut self) {
        if self.session.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.session.poll_response().await {
            self.follow_bottom = true;
        }
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.chat_scroll >= max;
    }

    fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    /// Record the rendered chat size; keeps the view pinned to the newest
    /// message unless the user scrolled away.
    pub fn update_chat_metrics(&mut self, total_lines: u16, height: u16) {
        self.total_chat_lines = total_lines;
        self.chat_height = height;
        let max = self.max_scroll();
        if self.follow_bottom || self.chat_scroll > max {
            self.chat_scroll = max;
        }
    }

    // Pointer input

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn pointer(column: u16, row: u16) -> Pointer {
        Pointer::new(column, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{ColorValue, KnowledgeBase, Sender};

    fn app() -> App {
        let responder = ResponseEngine::new(KnowledgeBase::embedded().unwrap());
        let session = ChatSession::new(
            Arc::new(responder),
            Arc::new(MemoryPreferenceStore::new()),
            ColorValue::default(),
        );
        let mut app = App::with_session(session);
        app.open_chat();
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[tokio::test]
    async fn test_editing_is_utf8_safe() {
        let mut app = app();
        type_text(&mut app, "héllo");
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input, "hélo");
        app.cursor_home();
        app.delete();
        assert_eq!(app.input, "élo");
        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.input, "élo!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_disabled_while_awaiting() {
        let mut app = app();
        type_text(&mut app, "skills");
        assert_eq!(app.submit_input(), SubmitOutcome::Pending);
        assert!(app.input.is_empty());
        assert!(!app.input_enabled());

        type_text(&mut app, "more");
        assert!(app.input.is_empty());

        app.session.settle().await;
        assert!(app.input_enabled());
    }

    #[tokio::test]
    async fn test_whitespace_submission_keeps_input() {
        let mut app = app();
        type_text(&mut app, "   ");
        let before = app.session.messages().len();
        assert_eq!(app.submit_input(), SubmitOutcome::Ignored);
        assert_eq!(app.session.messages().len(), before);
        assert_eq!(app.input, "   ");
    }

    #[tokio::test]
    async fn test_cycle_quick_replies() {
        let mut app = app();
        app.cycle_quick_reply();
        assert_eq!(app.input, "Tell me about your experience");
        app.cycle_quick_reply();
        assert_eq!(app.input, "What skills do you have?");
        assert_eq!(app.input_cursor, app.input.chars().count());
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_tick_picks_up_response() {
        let mut app = app();
        app.submit("Show me your projects");
        app.on_tick().await;
        assert_eq!(app.animation_frame, 1);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        app.on_tick().await;

        let last = app.session.messages().last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert!(last.text.contains("portfolio website"));
        assert!(!app.session.is_awaiting());
    }

    #[tokio::test]
    async fn test_scroll_metrics() {
        let mut app = app();
        app.update_chat_metrics(50, 10);
        assert_eq!(app.chat_scroll, 40);
        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 35);
        assert!(!app.follow_bottom);
        app.update_chat_metrics(60, 10);
        assert_eq!(app.chat_scroll, 35);
        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 50);
        assert!(app.follow_bottom);
    }
}
