//! AI assistant chat

use chrono::{DateTime, Utc};
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionStore;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

/// First message of every transcript
pub const WELCOME_MESSAGE: &str =
    "Hello! I am your Aqarak AI assistant. How can I help you find your dream property today?";

/// Reply appended when a turn fails
pub const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again later.";

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<i64>,
    /// Answering style, e.g. `legal`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}

/// Client for the chat endpoint
#[derive(Clone)]
pub struct ChatClient {
    url: String,
    client: Client,
    session: SessionStore,
    options: ClientOptions,
}

impl ChatClient {
    /// Create a new ChatClient
    pub(crate) fn new(url: &str, client: Client, session: SessionStore, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    /// Ask one question
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatReply, Error> {
        let url = format!("{}/chat", self.url);

        Fetch::post(&self.client, &url)
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
            .session(&self.session)
            .json(request)?
            .execute::<ChatReply>()
            .await
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A turn started by [`ChatPanel::begin_turn`]
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    /// The request to send
    pub request: ChatRequest,
}

/// Chat panel state.
///
/// The transcript lives only on the client and is append-only. One turn may
/// be outstanding at a time; further submissions are ignored until it
/// completes.
#[derive(Debug, Clone)]
pub struct ChatPanel {
    messages: Vec<ChatMessage>,
    pending: bool,
    is_open: bool,
    initial_message: Option<String>,
    property_id: Option<i64>,
    mode: Option<String>,
    jurisdiction: Option<String>,
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPanel {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, WELCOME_MESSAGE)],
            pending: false,
            is_open: false,
            initial_message: None,
            property_id: None,
            mode: None,
            jurisdiction: None,
        }
    }

    /// Panel attached to a property page; every question carries its id
    pub fn for_property(property_id: i64) -> Self {
        Self {
            property_id: Some(property_id),
            ..Self::new()
        }
    }

    /// Ask for answers in a specific mode, e.g. legal information
    pub fn with_mode(mut self, mode: &str, jurisdiction: Option<&str>) -> Self {
        self.mode = Some(mode.to_string());
        self.jurisdiction = jurisdiction.map(str::to_string);
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether the input should be disabled
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn property_id(&self) -> Option<i64> {
        self.property_id
    }

    /// Open the panel, optionally queueing a first question
    pub fn open(&mut self, message: Option<&str>) {
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            self.initial_message = Some(message.to_string());
        }
        self.is_open = true;
    }

    /// Close the panel and drop any queued question
    pub fn close(&mut self) {
        self.is_open = false;
        self.initial_message = None;
    }

    /// Open or close the panel. Closing drops any queued question, as
    /// [`close`](Self::close) does.
    pub fn toggle(&mut self) {
        if self.is_open {
            self.close();
        } else {
            self.open(None);
        }
    }

    /// The question waiting to be sent by [`send_initial`](Self::send_initial)
    pub fn queued_message(&self) -> Option<&str> {
        self.initial_message.as_deref()
    }

    /// Record a user message and produce the request for it. Returns `None`
    /// for blank input or while another turn is outstanding.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return None;
        }

        self.messages.push(ChatMessage::new(Role::User, text));
        self.pending = true;

        Some(PendingTurn {
            request: ChatRequest {
                question: text.to_string(),
                property_id: self.property_id,
                mode: self.mode.clone(),
                jurisdiction: self.jurisdiction.clone(),
            },
        })
    }

    /// Append the reply for a turn, or the apology if it failed
    pub fn complete_turn(&mut self, _turn: PendingTurn, result: Result<ChatReply, Error>) {
        let content = match result {
            Ok(reply) => reply.answer,
            Err(err) => {
                error!("Chat error: {}", err);
                CHAT_APOLOGY.to_string()
            }
        };
        self.messages.push(ChatMessage::new(Role::Assistant, &content));
        self.pending = false;
    }

    /// Send one message and wait for the reply. Returns whether a request
    /// was made.
    pub async fn submit(&mut self, client: &ChatClient, text: &str) -> bool {
        let turn = match self.begin_turn(text) {
            Some(turn) => turn,
            None => return false,
        };
        let result = client.send(&turn.request).await;
        self.complete_turn(turn, result);
        true
    }

    /// Send the question queued by [`open`](Self::open), if the panel is
    /// open. While a turn is outstanding the question stays queued.
    pub async fn send_initial(&mut self, client: &ChatClient) -> bool {
        if !self.is_open || self.pending {
            return false;
        }
        match self.initial_message.take() {
            Some(message) => self.submit(client, &message).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_starts_with_welcome() {
        let panel = ChatPanel::new();
        assert_eq!(panel.messages().len(), 1);
        assert_eq!(panel.messages()[0].role, Role::Assistant);
        assert_eq!(panel.messages()[0].content, WELCOME_MESSAGE);
    }

    #[test]
    fn blank_and_concurrent_submissions_are_ignored() {
        let mut panel = ChatPanel::for_property(12);
        assert!(panel.begin_turn("   ").is_none());

        let turn = panel.begin_turn(" Is parking included? ").unwrap();
        assert_eq!(turn.request.question, "Is parking included?");
        assert_eq!(turn.request.property_id, Some(12));
        assert!(panel.is_pending());
        assert!(panel.begin_turn("hello?").is_none());

        panel.complete_turn(
            turn,
            Ok(ChatReply {
                answer: "Yes, one spot.".to_string(),
            }),
        );
        assert!(!panel.is_pending());

        let roles: Vec<Role> = panel.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn failed_turn_appends_apology() {
        let mut panel = ChatPanel::new();
        let turn = panel.begin_turn("hi").unwrap();
        panel.complete_turn(turn, Err(Error::general("offline")));
        assert_eq!(panel.messages().last().unwrap().content, CHAT_APOLOGY);
        assert!(!panel.is_pending());
    }

    #[test]
    fn close_drops_queued_question() {
        let mut panel = ChatPanel::new();
        panel.open(Some("Tell me about Abdoun"));
        assert!(panel.is_open());
        panel.close();
        assert!(!panel.is_open());
        assert_eq!(panel.queued_message(), None);
        panel.toggle();
        assert!(panel.is_open());
    }

    #[test]
    fn toggle_closed_drops_queued_question() {
        let mut panel = ChatPanel::new();
        panel.open(Some("Tell me about Abdoun"));
        panel.toggle();
        assert!(!panel.is_open());
        assert_eq!(panel.queued_message(), None);
    }

    #[test]
    fn queued_question_waits_for_pending_turn() {
        let client = ChatClient::new(
            "http://localhost:8000",
            Client::new(),
            SessionStore::in_memory(),
            ClientOptions::default(),
        );
        let mut panel = ChatPanel::new();
        let turn = panel.begin_turn("first question").unwrap();
        panel.open(Some("Tell me about Abdoun"));

        assert!(!tokio_test::block_on(panel.send_initial(&client)));
        assert_eq!(panel.queued_message(), Some("Tell me about Abdoun"));
        assert_eq!(panel.messages().len(), 2);

        panel.complete_turn(
            turn,
            Ok(ChatReply {
                answer: "Sure.".to_string(),
            }),
        );
        assert_eq!(panel.queued_message(), Some("Tell me about Abdoun"));
    }

    #[test]
    fn request_omits_unset_fields() {
        let body = serde_json::to_value(ChatRequest {
            question: "hi".to_string(),
            property_id: None,
            mode: None,
            jurisdiction: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"question": "hi"}));
    }
}
