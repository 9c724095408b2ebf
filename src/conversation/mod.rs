use once_cell::sync::Lazy;
use thiserror::Error;

use crate::models::chat::{ HistoryEntry, Message, Role };

const GREETING_TEXT: &str = "Hi! I'm the **PartSelect Assistant**. I can help you with **refrigerator** and **dishwasher** parts.\n\n\
I can help you:\n\
- Find the right replacement part\n\
- Check if a part fits your model\n\
- Get installation instructions\n\
- Troubleshoot common problems\n\n\
What can I help you with today?";

const STARTER_SUGGESTIONS: [&str; 3] = [
    "How can I install part PS11752778?",
    "My dishwasher is not draining",
    "Find parts for my Whirlpool refrigerator",
];

pub static GREETING: Lazy<Message> = Lazy::new(|| {
    Message::assistant(
        GREETING_TEXT,
        Vec::new(),
        STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
    )
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message is blank")]
    BlankMessage,
}

/// Append-only message log for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the greeting.
    pub fn seeded() -> Self {
        Self {
            messages: vec![GREETING.clone()],
        }
    }

    pub fn append_user_message(&mut self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::BlankMessage);
        }
        self.messages.push(Message::user(text));
        Ok(())
    }

    pub fn append_assistant_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Turns replayed to the backend. Entries with empty content carry only
    /// cards or suggestions and are skipped.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn tail_suggestions(&self) -> &[String] {
        match self.messages.last() {
            Some(last) if last.role == Role::Assistant => &last.suggested_queries,
            _ => &[],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn seeded_store_offers_starter_suggestions() {
        let store = ConversationStore::seeded();
        assert_eq!(store.len(), 1);
        assert_eq!(store.tail_suggestions(), suggestions(&STARTER_SUGGESTIONS).as_slice());
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].role, Role::Assistant);
    }

    #[test]
    fn blank_user_message_is_rejected() {
        let mut store = ConversationStore::new();
        assert_eq!(store.append_user_message(""), Err(ValidationError::BlankMessage));
        assert_eq!(store.append_user_message("  \n\t"), Err(ValidationError::BlankMessage));
        assert!(store.is_empty());
    }

    #[test]
    fn user_message_keeps_original_text() {
        let mut store = ConversationStore::new();
        store.append_user_message("  padded  ").unwrap();
        assert_eq!(store.last().unwrap().content, "  padded  ");
        assert!(store.last().unwrap().parts.is_empty());
    }

    #[test]
    fn history_skips_empty_content_and_keeps_order() {
        let mut store = ConversationStore::seeded();
        store.append_user_message("first").unwrap();
        store.append_assistant_message(
            Message::assistant("", Vec::new(), suggestions(&["only suggestions"]))
        );
        store.append_user_message("second").unwrap();
        store.append_assistant_message(Message::assistant("answer", Vec::new(), Vec::new()));

        let history = store.history();
        let contents: Vec<&str> = history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec![GREETING_TEXT, "first", "second", "answer"]);
        assert!(history.iter().all(|h| !h.content.is_empty()));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn tail_suggestions_only_for_last_assistant_message() {
        let mut store = ConversationStore::seeded();
        store.append_user_message("hello").unwrap();
        assert!(store.tail_suggestions().is_empty());

        let reply = Message::assistant("hi", Vec::new(), suggestions(&["a", "b"]));
        store.append_assistant_message(reply.clone());
        assert_eq!(store.tail_suggestions(), suggestions(&["a", "b"]).as_slice());

        store.append_assistant_message(Message::assistant("more", Vec::new(), Vec::new()));
        assert!(store.tail_suggestions().is_empty());

        store.append_assistant_message(reply);
        assert_eq!(store.messages()[2].suggested_queries.len(), 2);
        assert_eq!(store.tail_suggestions(), suggestions(&["a", "b"]).as_slice());
    }
}
