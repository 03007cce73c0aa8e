//! Data models for transcripts and pruning results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// System messages are never evicted
    pub fn is_pinned(&self) -> bool {
        self.role == Role::System
    }
}

/// Ordered message history for one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
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

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Remove every message whose position satisfies `remove`, keeping the
    /// survivors in their original order. Returns the removed messages.
    pub(crate) fn remove_positions(&mut self, mut remove: impl FnMut(usize) -> bool) -> Vec<Message> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.messages)
            .into_iter()
            .enumerate()
            .partition(|(position, _)| remove(*position));
        self.messages = kept.into_iter().map(|(_, message)| message).collect();
        removed.into_iter().map(|(_, message)| message).collect()
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Outcome of a budget enforcement pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    /// Transcript tokens before pruning
    pub initial_tokens: usize,
    /// Transcript tokens after pruning
    pub final_tokens: usize,
    pub max_tokens: usize,
    /// Evicted messages, in transcript order
    pub removed: Vec<Message>,
}

impl PruneReport {
    /// True unless the pinned messages alone exceed the budget
    pub fn within_budget(&self) -> bool {
        self.final_tokens <= self.max_tokens
    }

    /// Tokens still over budget (0 when within budget)
    pub fn overage(&self) -> usize {
        self.final_tokens.saturating_sub(self.max_tokens)
    }

    pub fn pruned(&self) -> bool {
        !self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_transcript_is_a_json_array() {
        let transcript = Transcript::from(vec![Message::system("be brief"), Message::user("hello")]);
        let json = serde_json::to_string(&transcript).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(parsed, transcript);
    }

    #[test]
    fn test_only_system_messages_are_pinned() {
        assert!(Message::system("x").is_pinned());
        assert!(!Message::user("x").is_pinned());
        assert!(!Message::assistant("x").is_pinned());
    }

    #[test]
    fn test_remove_positions_keeps_order() {
        let mut transcript = Transcript::from(vec![
            Message::user("a"),
            Message::user("b"),
            Message::user("c"),
            Message::user("d"),
        ]);
        let removed = transcript.remove_positions(|i| i == 1 || i == 2);
        let kept: Vec<&str> = transcript.iter().map(Message::content).collect();
        assert_eq!(kept, vec!["a", "d"]);
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn test_prune_report_overage() {
        let report = PruneReport {
            initial_tokens: 1500,
            final_tokens: 1100,
            max_tokens: 1000,
            removed: vec![],
        };
        assert!(!report.within_budget());
        assert_eq!(report.overage(), 100);
        assert!(!report.pruned());
    }
}
