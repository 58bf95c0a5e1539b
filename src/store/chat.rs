//! Chat state store
//!
//! Holds the conversation list, the current selection and a per-conversation
//! message cache for one logged-in session. Every operation swallows API
//! failures, logs them and records a single human-readable message on
//! [`ChatState::error`]; nothing is retried.
//!
//! Appending a message does not touch the parent chat's `last_message` or
//! `unread_count`; those are refreshed by the next [`ChatStore::load_chats`].

use crate::api::ChatApi;
use crate::forms::models::DEFAULT_MAX_GROUP_MEMBERS;
use crate::forms::validators::is_valid_message;
use crate::types::{AppError, Chat, CreateGroupChatRequest, Message};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CHATS_KEY: &str = "chats";

/// Immutable snapshot of the chat store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub chats: Vec<Chat>,
    pub current_chat: Option<Chat>,
    /// chat id -> messages in arrival order. Each list is replaced as a whole.
    pub messages: HashMap<String, Arc<Vec<Message>>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ChatState {
    pub fn messages_for(&self, chat_id: &str) -> Option<&[Message]> {
        self.messages.get(chat_id).map(|list| list.as_slice())
    }

    pub fn find_chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id() == chat_id)
    }

    // ============= Transitions =============

    fn loading_started(&self) -> Self {
        Self {
            is_loading: true,
            error: None,
            ..self.clone()
        }
    }

    fn chats_loaded(&self, chats: Vec<Chat>) -> Self {
        Self {
            chats,
            is_loading: false,
            ..self.clone()
        }
    }

    fn loading_failed(&self, message: &str) -> Self {
        Self {
            is_loading: false,
            error: Some(message.to_string()),
            ..self.clone()
        }
    }

    fn failed(&self, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..self.clone()
        }
    }

    fn selected(&self, chat: Option<Chat>) -> Self {
        Self {
            current_chat: chat,
            ..self.clone()
        }
    }

    fn messages_loaded(&self, chat_id: &str, messages: Vec<Message>) -> Self {
        let mut next = self.clone();
        next.messages
            .insert(chat_id.to_string(), Arc::new(messages));
        next
    }

    fn message_appended(&self, chat_id: &str, message: Message) -> Self {
        let mut list: Vec<Message> = self
            .messages
            .get(chat_id)
            .map(|existing| existing.as_ref().clone())
            .unwrap_or_default();
        list.push(message);

        let mut next = self.clone();
        next.messages.insert(chat_id.to_string(), Arc::new(list));
        next
    }

    fn chat_created(&self, chat: Chat) -> Self {
        let mut next = self.clone();
        next.chats.push(chat);
        next
    }

    /// Cached messages of the deleted chat are left in place
    fn chat_deleted(&self, chat_id: &str) -> Self {
        let mut next = self.clone();
        next.chats.retain(|chat| chat.id() != chat_id);
        if next
            .current_chat
            .as_ref()
            .is_some_and(|current| current.id() == chat_id)
        {
            next.current_chat = None;
        }
        next
    }

    fn chat_updated(&self, chat: Chat) -> Self {
        let mut next = self.clone();
        for existing in next.chats.iter_mut() {
            if existing.id() == chat.id() {
                *existing = chat.clone();
            }
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatStoreOptions {
    /// Drop a chat list or message list response when a newer request for the
    /// same key was started after it. Off means last response wins.
    pub discard_superseded: bool,
    pub max_group_members: usize,
}

impl Default for ChatStoreOptions {
    fn default() -> Self {
        Self {
            discard_superseded: false,
            max_group_members: DEFAULT_MAX_GROUP_MEMBERS,
        }
    }
}

/// Process-wide chat store
pub struct ChatStore {
    api: Arc<dyn ChatApi>,
    options: ChatStoreOptions,
    state: ArcSwap<ChatState>,
    /// request key -> latest generation
    generations: Mutex<HashMap<String, u64>>,
}

impl ChatStore {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self::with_options(api, ChatStoreOptions::default())
    }

    pub fn with_options(api: Arc<dyn ChatApi>, options: ChatStoreOptions) -> Self {
        Self {
            api,
            options,
            state: ArcSwap::from_pointee(ChatState::default()),
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> ChatStoreOptions {
        self.options
    }

    pub fn snapshot(&self) -> Arc<ChatState> {
        self.state.load_full()
    }

    fn transition<F>(&self, f: F)
    where
        F: Fn(&ChatState) -> ChatState,
    {
        self.state.rcu(|current| f(current));
    }

    fn record_failure(&self, operation: &str, error: &AppError) {
        let message = error.user_message();
        warn!("{} failed: {}", operation, message);
        self.transition(|s| s.failed(&message));
    }

    fn start_request(&self, key: &str) -> u64 {
        let mut generations = self.generations.lock();
        let generation = generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_superseded(&self, key: &str, generation: u64) -> bool {
        self.options.discard_superseded
            && self
                .generations
                .lock()
                .get(key)
                .is_some_and(|latest| *latest != generation)
    }

    /// Replace the conversation list with the server's. A failure keeps the
    /// previous list.
    pub async fn load_chats(&self) {
        let generation = self.start_request(CHATS_KEY);
        self.transition(ChatState::loading_started);

        let result = self.api.get_chats().await;
        if self.is_superseded(CHATS_KEY, generation) {
            debug!("Discarding superseded chat list response");
            return;
        }

        match result {
            Ok(chats) => {
                debug!("Loaded {} chats", chats.len());
                self.transition(|s| s.chats_loaded(chats.clone()));
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Loading chats failed: {}", message);
                self.transition(|s| s.loading_failed(&message));
            }
        }
    }

    /// Swap the selection. Does not fetch messages.
    pub fn select_chat(&self, chat: Option<Chat>) {
        self.transition(|s| s.selected(chat.clone()));
    }

    /// Replace the cached messages of one conversation
    pub async fn load_messages(&self, chat_id: &str) {
        let key = format!("messages:{}", chat_id);
        let generation = self.start_request(&key);

        let result = self.api.get_messages(chat_id).await;
        if self.is_superseded(&key, generation) {
            debug!(chat_id, "Discarding superseded message list response");
            return;
        }

        match result {
            Ok(messages) => {
                debug!(chat_id, "Loaded {} messages", messages.len());
                self.transition(|s| s.messages_loaded(chat_id, messages.clone()));
            }
            Err(e) => self.record_failure("Loading messages", &e),
        }
    }

    /// Send to the selected conversation and append the acknowledged message.
    ///
    /// Without a selection this does nothing. The message is appended to the
    /// chat that was selected when the call started, in completion order.
    pub async fn send_message(&self, content: &str) {
        let Some(chat_id) = self
            .snapshot()
            .current_chat
            .as_ref()
            .map(|chat| chat.id().to_string())
        else {
            debug!("No chat selected; message not sent");
            return;
        };

        if !is_valid_message(content) {
            let error = AppError::InvalidInput("Message must be 1 to 5000 characters".to_string());
            self.record_failure("Sending message", &error);
            return;
        }

        match self.api.send_message(&chat_id, content).await {
            Ok(message) => {
                debug!(chat_id = %chat_id, message_id = %message.id, "Message sent");
                self.transition(|s| s.message_appended(&chat_id, message.clone()));
            }
            Err(e) => self.record_failure("Sending message", &e),
        }
    }

    pub async fn create_private_chat(&self, participant_id: &str) {
        match self.api.create_private_chat(participant_id).await {
            Ok(chat) => {
                info!("Created private chat {}", chat.id());
                self.transition(|s| s.chat_created(chat.clone()));
            }
            Err(e) => self.record_failure("Creating private chat", &e),
        }
    }

    pub async fn create_group_chat(
        &self,
        name: &str,
        member_ids: Vec<String>,
        description: Option<String>,
    ) {
        if member_ids.len() > self.options.max_group_members {
            let error = AppError::InvalidInput(format!(
                "A group can have at most {} members",
                self.options.max_group_members
            ));
            self.record_failure("Creating group chat", &error);
            return;
        }

        let request = CreateGroupChatRequest {
            name: name.to_string(),
            member_ids,
            description,
        };

        match self.api.create_group_chat(&request).await {
            Ok(chat) => {
                info!("Created group chat {}", chat.id());
                self.transition(|s| s.chat_created(chat.clone()));
            }
            Err(e) => self.record_failure("Creating group chat", &e),
        }
    }

    /// Delete on the server, then drop the chat locally (clearing the
    /// selection if it was selected). On failure the list is kept.
    pub async fn delete_chat(&self, chat_id: &str) {
        match self.api.delete_chat(chat_id).await {
            Ok(()) => {
                info!("Deleted chat {}", chat_id);
                self.transition(|s| s.chat_deleted(chat_id));
            }
            Err(e) => self.record_failure("Deleting chat", &e),
        }
    }

    /// Replace a chat in the list by id. The selection is not touched.
    pub fn update_chat(&self, chat: Chat) {
        self.transition(|s| s.chat_updated(chat.clone()));
    }

    /// Discard everything, e.g. after logout
    pub fn reset(&self) {
        self.state.store(Arc::new(ChatState::default()));
        self.generations.lock().clear();
    }
}
