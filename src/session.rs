//! Chat session controller
//!
//! Owns the conversation, the draft input, the busy flag and the theme flag.
//! A submission is split in two halves so an event loop can run the request
//! elsewhere: [`ChatSession::begin`] records the question and marks the
//! session busy, [`ChatSession::resolve`] appends the single bot reply and
//! clears the flag. [`ChatSession::submit`] chains both around one call to an
//! [`AnswerService`].

use crate::client::{AnswerService, AskError, AskResponse, FALLBACK_REPLY, GENERIC_REPLY};
use crate::state::{Message, Role, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Sending,
}

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Answered,
    ServiceError,
    Unrecognized,
    TransportFailure,
}

impl Resolution {
    /// Bot reply for a finished request: the answer, else the service error,
    /// else the generic line. Any failed request gets the fallback line.
    pub fn select(outcome: &Result<AskResponse, AskError>) -> (Self, &str) {
        match outcome {
            Ok(response) => match (response.answer_text(), response.error_text()) {
                (Some(answer), _) => (Resolution::Answered, answer),
                (None, Some(error)) => (Resolution::ServiceError, error),
                (None, None) => (Resolution::Unrecognized, GENERIC_REPLY),
            },
            Err(_) => (Resolution::TransportFailure, FALLBACK_REPLY),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    draft: String,
    phase: Phase,
    theme: Theme,
}

impl ChatSession {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Sending
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        tracing::debug!(theme = self.theme.as_str(), "theme toggled");
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Start a submission. Returns the question to send, or `None` when the
    /// question is blank or another request is still in flight. A rejected
    /// submission leaves the session untouched.
    pub fn begin(&mut self, question: &str) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }
        if self.is_busy() {
            tracing::debug!("submission ignored while a request is in flight");
            return None;
        }

        self.messages.push(Message::user(question));
        self.draft.clear();
        self.phase = Phase::Sending;
        tracing::info!(chars = question.chars().count(), "question submitted");
        Some(question.to_string())
    }

    /// Start a submission from the current draft.
    pub fn begin_draft(&mut self) -> Option<String> {
        let question = self.draft.clone();
        self.begin(&question)
    }

    /// Append the bot reply for the in-flight request and go idle again.
    /// Does nothing when no request is in flight.
    pub fn resolve(&mut self, outcome: Result<AskResponse, AskError>) -> Option<Resolution> {
        if !self.is_busy() {
            tracing::debug!("resolution without a request in flight ignored");
            return None;
        }

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "answer request failed");
        }
        let (resolution, text) = Resolution::select(&outcome);

        self.messages.push(Message::bot(text));
        self.phase = Phase::Idle;
        tracing::info!(?resolution, "question resolved");
        Some(resolution)
    }

    /// Send `question` through `service` and wait for the reply.
    pub async fn submit<S>(&mut self, service: &S, question: &str) -> Option<Resolution>
    where
        S: AnswerService + ?Sized,
    {
        let question = self.begin(question)?;
        let outcome = service.ask(&question).await;
        self.resolve(outcome)
    }

    pub async fn submit_draft<S>(&mut self, service: &S) -> Option<Resolution>
    where
        S: AnswerService + ?Sized,
    {
        let question = self.draft.clone();
        self.submit(service, &question).await
    }

    pub fn last_reply(&self) -> Option<&Message> {
        self.messages
            .last()
            .filter(|m| m.role() == Role::Bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Replays canned outcomes and records what was asked.
    struct FakeService {
        reply: Mutex<Option<Result<AskResponse, AskError>>>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn new(reply: Result<AskResponse, AskError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerService for FakeService {
        async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
            self.asked.lock().unwrap().push(question.to_string());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(AskResponse::default()))
        }
    }

    fn texts(session: &ChatSession) -> Vec<(Role, String)> {
        session
            .messages()
            .iter()
            .map(|m| (m.role(), m.text().to_string()))
            .collect()
    }

    #[test]
    fn test_select_prefers_answer_then_error() {
        let both = Ok(AskResponse {
            answer: Some("Paris".into()),
            error: Some("ignored".into()),
        });
        assert_eq!(Resolution::select(&both), (Resolution::Answered, "Paris"));

        let error_only = Ok(AskResponse::failed("rate limited"));
        assert_eq!(
            Resolution::select(&error_only),
            (Resolution::ServiceError, "rate limited")
        );
    }

    #[test]
    fn test_select_treats_empty_strings_as_absent() {
        let empty_answer = Ok(AskResponse {
            answer: Some(String::new()),
            error: Some("quota".into()),
        });
        assert_eq!(
            Resolution::select(&empty_answer),
            (Resolution::ServiceError, "quota")
        );

        let all_empty = Ok(AskResponse {
            answer: Some(String::new()),
            error: Some(String::new()),
        });
        assert_eq!(
            Resolution::select(&all_empty),
            (Resolution::Unrecognized, GENERIC_REPLY)
        );
    }

    #[test]
    fn test_select_failure_is_fallback() {
        let failed = Err(AskError::Status(StatusCode::NOT_FOUND));
        assert_eq!(
            Resolution::select(&failed),
            (Resolution::TransportFailure, FALLBACK_REPLY)
        );
    }

    #[tokio::test]
    async fn test_answer_appends_user_then_bot() {
        let service = FakeService::new(Ok(AskResponse::answered("Paris")));
        let mut session = ChatSession::default();

        let res = session.submit(&service, "Capital of France?").await;

        assert_eq!(res, Some(Resolution::Answered));
        assert_eq!(
            texts(&session),
            vec![
                (Role::User, "Capital of France?".to_string()),
                (Role::Bot, "Paris".to_string()),
            ]
        );
        assert!(!session.is_busy());
        assert_eq!(service.asked(), vec!["Capital of France?"]);
    }

    #[tokio::test]
    async fn test_service_error_is_shown_verbatim() {
        let service = FakeService::new(Ok(AskResponse::failed("rate limited")));
        let mut session = ChatSession::default();

        let res = session.submit(&service, "hi").await;

        assert_eq!(res, Some(Resolution::ServiceError));
        assert_eq!(session.last_reply().unwrap().text(), "rate limited");
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_empty_response_uses_generic_reply() {
        let service = FakeService::new(Ok(AskResponse::default()));
        let mut session = ChatSession::default();

        let res = session.submit(&service, "hi").await;

        assert_eq!(res, Some(Resolution::Unrecognized));
        assert_eq!(session.last_reply().unwrap().text(), "Something went wrong");
    }

    #[tokio::test]
    async fn test_transport_failure_uses_fallback() {
        let service = FakeService::new(Err(AskError::Status(StatusCode::BAD_GATEWAY)));
        let mut session = ChatSession::default();

        let res = session.submit(&service, "hi").await;

        assert_eq!(res, Some(Resolution::TransportFailure));
        assert_eq!(session.last_reply().unwrap().text(), "⚠️ Failed to fetch answer.");
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_blank_questions_are_ignored() {
        let service = FakeService::new(Ok(AskResponse::answered("unused")));
        let mut session = ChatSession::default();

        assert_eq!(session.submit(&service, "").await, None);
        assert_eq!(session.submit(&service, "   ").await, None);
        assert_eq!(session.submit(&service, "\n\t").await, None);

        assert!(session.messages().is_empty());
        assert!(service.asked().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_user_message_precedes_request() {
        let mut session = ChatSession::default();
        session.set_draft("What's new?");

        let question = session.begin_draft();

        assert_eq!(question.as_deref(), Some("What's new?"));
        assert_eq!(texts(&session), vec![(Role::User, "What's new?".to_string())]);
        assert_eq!(session.draft(), "");
        assert!(session.is_busy());
    }

    #[test]
    fn test_busy_only_between_begin_and_resolve() {
        let mut session = ChatSession::default();
        assert!(!session.is_busy());

        session.begin("q").unwrap();
        assert!(session.is_busy());

        session.resolve(Ok(AskResponse::answered("a")));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_submission_while_busy_is_rejected_and_draft_kept() {
        let mut session = ChatSession::default();
        session.begin("first").unwrap();
        session.set_draft("second");

        assert_eq!(session.begin_draft(), None);
        assert_eq!(session.draft(), "second");
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_resolve_when_idle_is_noop() {
        let mut session = ChatSession::default();
        assert_eq!(session.resolve(Ok(AskResponse::answered("stray"))), None);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_question_is_kept_raw() {
        let mut session = ChatSession::default();
        let sent = session.begin("  spaced out  ").unwrap();
        assert_eq!(sent, "  spaced out  ");
        assert_eq!(session.messages()[0].text(), "  spaced out  ");
    }

    #[test]
    fn test_toggle_theme_twice_restores_and_keeps_conversation() {
        let mut session = ChatSession::new(Theme::Light);
        session.begin("q").unwrap();
        session.resolve(Ok(AskResponse::answered("a")));
        let before = texts(&session);

        session.toggle_theme();
        assert_eq!(session.theme(), Theme::Dark);
        session.toggle_theme();

        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(texts(&session), before);
    }

    #[tokio::test]
    async fn test_submit_draft_uses_draft() {
        let service = FakeService::new(Ok(AskResponse::answered("ok")));
        let mut session = ChatSession::default();
        session.draft_mut().push_str("from draft");

        session.submit_draft(&service).await;

        assert_eq!(service.asked(), vec!["from draft"]);
        assert_eq!(session.draft(), "");
    }
}
