use serde::{ Serialize, Deserialize };

use super::chat::{ HistoryEntry, PartCard };

/// Body of `POST {base_url}/api/chat`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
    #[serde(default)]
    pub parts: Option<Vec<PartCard>>,
    #[serde(default)]
    pub suggested_queries: Option<Vec<String>>,
}
