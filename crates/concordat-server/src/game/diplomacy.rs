//! Diplomatic sessions: multi-party chat threads where every non-player
//! participant answers through the generation backend.
//!
//! A chat is bilateral with two participants, a conference with more. One
//! player message fans out to every AI participant; each reply succeeds or
//! fails on its own, and the save is written once at the end so a partial
//! failure never loses the exchange.

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use concordat_core::DIPLOMACY_EVENT_WINDOW;
use concordat_protocol::{
    ChatMessage, ChatSummary, ChatType, DiplomaticChat, NationCode, NationInfo,
};

use crate::llm::prompts::DiplomacyParams;
use crate::notify::Notification;

use super::{GameService, ServiceError};

/// A chat plus the registry entries of its participants, so clients can
/// render names and flags without extra lookups.
#[derive(Debug, Serialize)]
pub struct ChatDetail {
    pub chat: DiplomaticChat,
    pub participants: Vec<NationInfo>,
}

impl GameService {
    /// Open a new chat between the player and the named nations.
    pub async fn start_chat(
        &self,
        save_id: &str,
        partner_codes: &[String],
        topic: Option<&str>,
    ) -> Result<DiplomaticChat, ServiceError> {
        if partner_codes.is_empty() {
            return Err(ServiceError::Validation(
                "a chat needs at least one partner nation".into(),
            ));
        }

        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let mut participants = vec![save.player_nation_code.clone()];
        for raw in partner_codes {
            let code = NationCode::new(raw);
            if !self.registry.contains(&code) {
                return Err(ServiceError::Validation(format!("unknown nation {code}")));
            }
            if code == save.player_nation_code {
                return Err(ServiceError::Validation(
                    "the player cannot be their own chat partner".into(),
                ));
            }
            if !participants.contains(&code) {
                participants.push(code);
            }
        }

        let chat = DiplomaticChat {
            id: Self::generate_id("chat"),
            chat_type: ChatType::for_participants(participants.len()),
            participant_nations: participants,
            topic: topic.unwrap_or("Diplomatic exchange").to_string(),
            is_active: true,
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        save.chats.push(chat.clone());
        self.store.save(save_id, &save)?;
        Ok(chat)
    }

    /// Post a player message and collect every AI participant's reply.
    ///
    /// Replies are generated per participant; a failed generation becomes a
    /// visible communication-error message rather than aborting the others.
    /// Returns only the newly appended reply messages.
    pub async fn post_message(
        &self,
        save_id: &str,
        chat_id: &str,
        message_text: &str,
    ) -> Result<Vec<ChatMessage>, ServiceError> {
        let text = message_text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("message cannot be empty".into()));
        }

        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let player_code = save.player_nation_code.clone();
        let player_name = self.nation_name(&player_code);
        let current_date = save.current_date;
        let world_context = save.world_context.clone();
        let simulation_rules = save.simulation_rules.clone();
        let recent_events = save.recent_events(DIPLOMACY_EVENT_WINDOW).to_vec();

        let chat = save
            .chat_mut(chat_id)
            .ok_or_else(|| ServiceError::NotFound(format!("chat {chat_id}")))?;
        if !chat.is_active {
            return Err(ServiceError::Validation("this chat has been closed".into()));
        }

        chat.messages.push(ChatMessage {
            id: Self::generate_id("msg"),
            sender_nation: player_code.clone(),
            sender_is_player: true,
            message_text: text.to_string(),
            game_date: current_date,
            created_at: Utc::now(),
        });

        let reply_target = chat.player_average_length(text.chars().count());
        let participant_names: Vec<String> = chat
            .participant_nations
            .iter()
            .map(|code| self.nation_name(code))
            .collect();
        let roster = participant_names.join(", ");
        // Participants no longer in the registry cannot roleplay; skip them.
        let responders: Vec<NationCode> = chat
            .participant_nations
            .iter()
            .filter(|code| **code != player_code && self.registry.contains(code))
            .cloned()
            .collect();
        // History before the new message; the prompt carries the message
        // itself as the final user turn.
        let transcript: Vec<ChatMessage> = chat.messages[..chat.messages.len() - 1].to_vec();

        let mut replies = Vec::with_capacity(responders.len());
        for responder in &responders {
            let responder_name = self.nation_name(responder);
            let params = DiplomacyParams {
                participants: roster.clone(),
                player_name: &player_name,
                responding_name: &responder_name,
                current_date,
                reply_target_chars: reply_target,
                world_context: &world_context,
                simulation_rules: &simulation_rules,
                recent_events: &recent_events,
                message: text,
            };
            let reply_text = match self.generator.diplomatic_reply(params, &transcript).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(save_id, chat_id, nation = %responder, %err, "diplomatic reply failed");
                    format!("[Communication Error: {responder_name} could not be reached]")
                }
            };
            replies.push(ChatMessage {
                id: Self::generate_id("msg"),
                sender_nation: responder.clone(),
                sender_is_player: false,
                message_text: reply_text,
                game_date: current_date,
                created_at: Utc::now(),
            });
        }

        let chat = save
            .chat_mut(chat_id)
            .ok_or_else(|| ServiceError::NotFound(format!("chat {chat_id}")))?;
        chat.messages.extend(replies.iter().cloned());
        self.store.save(save_id, &save)?;

        self.notifier.publish(Notification::DiplomaticMessage {
            save_id: save_id.to_string(),
            chat_id: chat_id.to_string(),
            responding_nations: responders.iter().map(|c| c.to_string()).collect(),
        });
        Ok(replies)
    }

    /// Summaries of the save's open chats.
    pub fn list_chats(&self, save_id: &str) -> Result<Vec<ChatSummary>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(save
            .chats
            .iter()
            .filter(|c| c.is_active)
            .map(ChatSummary::of)
            .collect())
    }

    /// Full thread by id, closed chats included.
    pub fn chat_detail(&self, save_id: &str, chat_id: &str) -> Result<ChatDetail, ServiceError> {
        let save = self.store.load(save_id)?;
        let chat = save
            .chat(chat_id)
            .ok_or_else(|| ServiceError::NotFound(format!("chat {chat_id}")))?
            .clone();
        let participants = chat
            .participant_nations
            .iter()
            .filter_map(|code| self.registry.get(code).cloned())
            .collect();
        Ok(ChatDetail { chat, participants })
    }

    /// Close a chat. Soft: the thread stays readable by id, it just stops
    /// accepting messages and drops out of the listing.
    pub async fn close_chat(&self, save_id: &str, chat_id: &str) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;
        let chat = save
            .chat_mut(chat_id)
            .ok_or_else(|| ServiceError::NotFound(format!("chat {chat_id}")))?;
        chat.is_active = false;
        self.store.save(save_id, &save)?;
        Ok(())
    }

    /// Nations the player could open a chat with: everyone but themselves,
    /// majors first.
    pub fn available_partners(&self, save_id: &str) -> Result<Vec<NationInfo>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(self
            .registry
            .sorted()
            .into_iter()
            .filter(|info| info.code != save.player_nation_code)
            .cloned()
            .collect())
    }
}
