pub mod http;

use async_trait::async_trait;
use log::{ debug, error };
use once_cell::sync::Lazy;
use std::sync::Arc;
use thiserror::Error;

use crate::models::chat::{ HistoryEntry, Message, PageContext };
use crate::models::wire::{ ChatRequest, ChatResponse };

pub use self::http::HttpTransport;

const FALLBACK_TEXT: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

const FALLBACK_SUGGESTIONS: [&str; 2] = [
    "Help me find a refrigerator part",
    "My dishwasher needs repair",
];

/// Reply substituted for any failed request.
pub static FALLBACK: Lazy<Message> = Lazy::new(|| {
    Message::assistant(
        FALLBACK_TEXT,
        Vec::new(),
        FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
    )
});

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")] Request(#[from] reqwest::Error),
    #[error("API error: {0}")] Status(reqwest::StatusCode),
    #[error("undecodable response body: {0}")] Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

pub fn build_request(
    query: &str,
    history: Vec<HistoryEntry>,
    context: Option<&PageContext>
) -> ChatRequest {
    ChatRequest {
        message: query.to_string(),
        conversation_history: history,
        page_url: context.map(|c| c.url.clone()),
    }
}

impl From<ChatResponse> for Message {
    fn from(body: ChatResponse) -> Self {
        Message::assistant(
            body.content,
            body.parts.unwrap_or_default(),
            body.suggested_queries.unwrap_or_default()
        )
    }
}

/// Issues one backend call per `send` and turns every outcome into an
/// assistant message.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn ChatTransport>,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    pub async fn send(
        &self,
        query: &str,
        history: Vec<HistoryEntry>,
        context: Option<&PageContext>
    ) -> Message {
        let request = build_request(query, history, context);
        debug!(
            "Dispatching chat request: history_len={}, page_url={:?}",
            request.conversation_history.len(),
            request.page_url
        );

        match self.transport.post_chat(&request).await {
            Ok(body) => body.into(),
            Err(e) => {
                error!("API call failed: {}", e);
                FALLBACK.clone()
            }
        }
    }
}
