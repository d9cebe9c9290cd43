use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::client::{AnswerService, AskError, AskResponse};
use crate::session::{ChatSession, Resolution};
use crate::state::Theme;
use crate::tui::AppEvent;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,
    pub service: Arc<dyn AnswerService>,
    pub endpoint: String,

    // Input state
    pub cursor: usize, // cursor position in the draft, in chars

    // Conversation view state
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,      // inner height of the chat area
    pub chat_total_lines: u16, // wrapped line count from the last render

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(service: Arc<dyn AnswerService>, endpoint: impl Into<String>, theme: Theme) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(theme),
            service,
            endpoint: endpoint.into(),

            cursor: 0,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_total_lines: 0,

            chat_area: None,

            animation_frame: 0,
        }
    }

    /// Send the draft on a background task. The reply comes back through
    /// `tx` as [`AppEvent::Reply`]; nothing happens if the draft is blank or
    /// a question is already in flight.
    pub fn submit(&mut self, tx: &mpsc::UnboundedSender<AppEvent>) {
        let Some(question) = self.session.begin_draft() else {
            return;
        };

        self.cursor = 0;
        self.animation_frame = 0;
        self.follow_bottom = true;

        let service = Arc::clone(&self.service);
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = service.ask(&question).await;
            if tx.send(AppEvent::Reply(outcome)).is_err() {
                tracing::debug!("reply arrived after the event loop closed");
            }
        });
    }

    pub fn on_reply(&mut self, outcome: Result<AskResponse, AskError>) -> Option<Resolution> {
        let resolution = self.session.resolve(outcome);
        self.follow_bottom = true;
        resolution
    }

    pub fn toggle_theme(&mut self) {
        self.session.toggle_theme();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Conversation scrolling
    pub fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        }
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn jump_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Record the rendered height and pin to the bottom when following.
    pub fn set_chat_metrics(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_total_lines = total_lines;
        self.chat_height = visible_height;
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl AnswerService for Echo {
        async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
            Ok(AskResponse::answered(format!("echo: {}", question)))
        }
    }

    fn app() -> App {
        App::new(Arc::new(Echo), "http://test", Theme::Light)
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.session.set_draft("hello");
        app.cursor = 5;

        app.submit(&tx);
        assert!(app.session.is_busy());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.session.messages().len(), 1);

        let Some(AppEvent::Reply(outcome)) = rx.recv().await else {
            panic!("expected a reply event");
        };
        assert_eq!(app.on_reply(outcome), Some(Resolution::Answered));

        let last = app.session.messages().last().unwrap();
        assert_eq!(last.role(), Role::Bot);
        assert_eq!(last.text(), "echo: hello");
        assert!(!app.session.is_busy());
    }

    #[tokio::test]
    async fn test_blank_draft_spawns_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.session.set_draft("   ");

        app.submit(&tx);
        drop(tx);

        assert!(rx.recv().await.is_none());
        assert!(app.session.messages().is_empty());
    }

    #[test]
    fn test_tick_only_animates_while_busy() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.session.begin("q");
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_scrolling_releases_and_regains_bottom() {
        let mut app = app();
        app.set_chat_metrics(50, 10);
        assert_eq!(app.chat_scroll, 40);

        app.scroll_up(5);
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, 35);

        // New content does not yank the view while reading history
        app.set_chat_metrics(60, 10);
        assert_eq!(app.chat_scroll, 35);

        app.scroll_down(100);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, 50);
    }
}
