//! Diplomatic chat threads between the player and AI-driven nations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GameDate, NationCode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Bilateral,
    Conference,
}

impl ChatType {
    /// Two participants make a bilateral channel; more make a conference.
    pub fn for_participants(count: usize) -> Self {
        if count > 2 {
            ChatType::Conference
        } else {
            ChatType::Bilateral
        }
    }
}

/// One message in a chat. Immutable once appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_nation: NationCode,
    pub sender_is_player: bool,
    pub message_text: String,
    pub game_date: GameDate,
    pub created_at: DateTime<Utc>,
}

/// A multi-party message thread, owned by its save.
///
/// Closed chats are soft-deleted: `is_active` flips to false, the message
/// history stays queryable by id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiplomaticChat {
    pub id: String,
    pub participant_nations: Vec<NationCode>,
    pub chat_type: ChatType,
    pub topic: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl DiplomaticChat {
    /// Average character length of the player's messages so far, used as the
    /// reply-length target for AI participants. Falls back to `fallback`
    /// (typically the incoming message's length) before the player has any
    /// history in this chat.
    pub fn player_average_length(&self, fallback: usize) -> usize {
        let player_messages: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.sender_is_player)
            .collect();
        if player_messages.is_empty() {
            return fallback;
        }
        let total: usize = player_messages
            .iter()
            .map(|m| m.message_text.chars().count())
            .sum();
        (total as f64 / player_messages.len() as f64).round() as usize
    }
}

/// Listing view: chat metadata plus a last-message preview.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub participant_nations: Vec<NationCode>,
    pub chat_type: ChatType,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl ChatSummary {
    pub fn of(chat: &DiplomaticChat) -> Self {
        Self {
            id: chat.id.clone(),
            participant_nations: chat.participant_nations.clone(),
            chat_type: chat.chat_type,
            topic: chat.topic.clone(),
            created_at: chat.created_at,
            message_count: chat.messages.len(),
            last_message: chat.messages.last().map(|m| m.message_text.clone()),
        }
    }
}
