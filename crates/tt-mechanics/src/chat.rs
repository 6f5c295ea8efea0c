//! The chat log rolls are published to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tt_core::CharacterId;
use uuid::Uuid;

use crate::reroll::RolledDie;

/// Identifies a published chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.to_string();
        f.write_str(&s[..8])
    }
}

/// The text of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatBody {
    /// Plain message content.
    Content(String),
    /// Flavor text shown above roll payloads.
    Flavor(String),
}

impl ChatBody {
    /// The text regardless of kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Content(s) | Self::Flavor(s) => s,
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// The character speaking, if any.
    pub speaker: Option<CharacterId>,
    /// Display name of the speaker.
    pub speaker_name: String,
    /// Message text.
    pub body: ChatBody,
    /// Rolls attached to the message. Each carries its reroll descriptor.
    #[serde(default)]
    pub rolls: Vec<RolledDie>,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    /// A content message.
    pub fn content(speaker_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            speaker_name: speaker_name.into(),
            body: ChatBody::Content(text.into()),
            rolls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// A flavor message.
    pub fn flavor(speaker_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            body: ChatBody::Flavor(text.into()),
            ..Self::content(speaker_name, String::new())
        }
    }

    /// Set the speaking character.
    pub fn spoken_by(mut self, character: CharacterId) -> Self {
        self.speaker = Some(character);
        self
    }

    /// Attach rolls.
    pub fn with_rolls(mut self, rolls: Vec<RolledDie>) -> Self {
        self.rolls = rolls;
        self
    }
}

/// Somewhere chat messages can be published.
pub trait ChatSink {
    /// Publish a message and return its id.
    fn append(&mut self, entry: ChatEntry) -> MessageId;
}

/// An in-memory chat log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatLog {
    messages: Vec<(MessageId, ChatEntry)>,
}

impl ChatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.messages.iter().map(|(_, e)| e)
    }

    /// Look up a message.
    pub fn get(&self, id: MessageId) -> Option<&ChatEntry> {
        self.messages
            .iter()
            .find(|(mid, _)| *mid == id)
            .map(|(_, e)| e)
    }

    /// The newest message.
    pub fn last(&self) -> Option<&ChatEntry> {
        self.messages.last().map(|(_, e)| e)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Export the log as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Combat Log\n\n");
        for (_, entry) in &self.messages {
            out.push_str(&format!("**{}**", entry.speaker_name));
            match &entry.body {
                ChatBody::Content(text) => out.push_str(&format!(": {text}\n")),
                ChatBody::Flavor(text) => out.push_str(&format!(" *{text}*\n")),
            }
            for roll in &entry.rolls {
                out.push_str(&format!("- `{}`\n", roll.trace()));
            }
            out.push('\n');
        }
        out
    }
}

impl ChatSink for ChatLog {
    fn append(&mut self, entry: ChatEntry) -> MessageId {
        let id = MessageId::new();
        self.messages.push((id, entry));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::reroll::RerollDescriptor;
    use tt_core::DieType;

    #[test]
    fn append_and_lookup() {
        let mut log = ChatLog::new();
        assert!(log.is_empty());
        let id = log.append(ChatEntry::content("GM", "Round 1"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(id).map(|e| e.body.text()), Some("Round 1"));
        assert!(log.get(MessageId::new()).is_none());
    }

    #[test]
    fn flavor_with_rolls() {
        let mut dice = ScriptedDice::new([4]);
        let rolled = RerollDescriptor::for_formula("1d6", DieType::default(), "Roland")
            .roll(&mut dice)
            .unwrap();
        let character = CharacterId::new();
        let entry = ChatEntry::flavor("Roland", "rolls")
            .spoken_by(character)
            .with_rolls(vec![rolled]);
        assert_eq!(entry.speaker, Some(character));
        assert!(matches!(entry.body, ChatBody::Flavor(_)));

        let mut log = ChatLog::new();
        log.append(entry);
        let md = log.export_markdown();
        assert!(md.starts_with("# Combat Log"));
        assert!(md.contains("**Roland** *rolls*"));
        assert!(md.contains("- `1d6 [4] = 4`"));
    }

    #[test]
    fn message_id_display_is_short() {
        assert_eq!(MessageId::new().to_string().len(), 8);
    }
}
