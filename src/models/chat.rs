use serde::{ Serialize, Deserialize };

const PART_URL_BASE: &str = "https://www.partselect.com";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCard {
    pub ps_number: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub part_url: Option<String>,
    #[serde(default)]
    pub oem_part_number: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl PartCard {
    /// Link for the card: the backend-supplied URL, or the canonical
    /// product page built from the PartSelect number.
    pub fn link(&self) -> String {
        match self.part_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}/PS{}.htm", PART_URL_BASE, self.ps_number),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub parts: Vec<PartCard>,
    #[serde(default)]
    pub suggested_queries: Vec<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            parts: Vec::new(),
            suggested_queries: Vec::new(),
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        parts: Vec<PartCard>,
        suggested_queries: Vec<String>
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            parts,
            suggested_queries,
        }
    }
}

/// One conversational turn as replayed to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: Option<String>,
}
