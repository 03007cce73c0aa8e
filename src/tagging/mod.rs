//! Subject tag generation for messages
//!
//! Tagging is best-effort: a failed or malformed model reply never aborts
//! the caller. The outcome type records whether the tag list is genuinely
//! empty or was defaulted after a failure.

use crate::config::TaggingConfig;
use crate::context::Message;
use crate::llm::{ChatClient, CompletionOptions};
use crate::metrics::METRICS;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of tagging one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TagOutcome {
    /// The model returned at least one tag
    Tagged { tags: Vec<String> },
    /// The model returned an empty array
    Empty,
    /// Tagging failed; callers see no tags
    Defaulted { reason: String },
}

impl TagOutcome {
    /// Tags to use, empty for both `Empty` and `Defaulted`
    pub fn tags(&self) -> &[String] {
        match self {
            TagOutcome::Tagged { tags } => tags,
            TagOutcome::Empty | TagOutcome::Defaulted { .. } => &[],
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, TagOutcome::Defaulted { .. })
    }

    fn status(&self) -> &'static str {
        match self {
            TagOutcome::Tagged { .. } => "tagged",
            TagOutcome::Empty => "empty",
            TagOutcome::Defaulted { .. } => "defaulted",
        }
    }
}

/// A message's content alongside its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedMessage {
    pub content: String,
    pub outcome: TagOutcome,
}

/// Parse a model reply expected to be a JSON array of strings
pub fn parse_tags(reply: &str) -> TagOutcome {
    let trimmed = strip_code_fence(reply.trim());
    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(tags) => {
            let tags: Vec<String> = tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if tags.is_empty() {
                TagOutcome::Empty
            } else {
                TagOutcome::Tagged { tags }
            }
        }
        Err(e) => TagOutcome::Defaulted {
            reason: format!("reply is not a JSON array of strings: {e}"),
        },
    }
}

// Models often wrap JSON in a ```json fence.
fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Generates subject tags through a chat model
pub struct MessageTagger {
    client: Arc<dyn ChatClient>,
    config: TaggingConfig,
}

impl MessageTagger {
    pub fn new(client: Arc<dyn ChatClient>, config: TaggingConfig) -> Self {
        Self { client, config }
    }

    /// Tag a single message
    pub async fn tag(&self, content: &str) -> TagOutcome {
        let messages = [
            Message::system(self.config.system_prompt.as_str()),
            Message::user(content),
        ];
        let options = CompletionOptions {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let outcome = match self.client.complete(&messages, &options).await {
            Ok(reply) => parse_tags(&reply),
            Err(e) => TagOutcome::Defaulted {
                reason: e.to_string(),
            },
        };

        if let TagOutcome::Defaulted { reason } = &outcome {
            warn!(%reason, "Tagging failed, defaulting to no tags");
        } else {
            debug!(tags = outcome.tags().len(), "Message tagged");
        }
        METRICS.record_tagging(outcome.status());

        outcome
    }

    /// Tag a batch of messages, keeping input order
    pub async fn tag_messages<K, I>(&self, messages: I) -> IndexMap<K, TaggedMessage>
    where
        K: Hash + Eq,
        I: IntoIterator<Item = (K, String)>,
    {
        let mut tagged = IndexMap::new();
        for (id, content) in messages {
            let outcome = self.tag(&content).await;
            tagged.insert(id, TaggedMessage { content, outcome });
        }
        tagged
    }
}
