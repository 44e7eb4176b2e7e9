//! Canned replies for the site assistant.
//!
//! No language model is involved: the first reply with a keyword contained in the
//! lower-cased message wins, otherwise the fallback is returned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannedReply {
    pub keywords: Vec<String>,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    #[serde(default)]
    pub replies: Vec<CannedReply>,
    pub fallback: String,
}

impl Default for Assistant {
    fn default() -> Self {
        Self {
            replies: Vec::new(),
            fallback: "I don't know that one yet.".to_string(),
        }
    }
}

impl Assistant {
    pub fn reply(&self, message: &str) -> &str {
        let message = message.to_lowercase();
        self.replies
            .iter()
            .find(|r| {
                r.keywords
                    .iter()
                    .any(|k| !k.is_empty() && message.contains(&k.to_lowercase()))
            })
            .map(|r| r.reply.as_str())
            .unwrap_or(&self.fallback)
    }
}
