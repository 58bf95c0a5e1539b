//! Mock implementations for testing.
//!
//! This module provides an in-memory chat API and uploader that can be used
//! across different test files without duplication, plus fixture builders
//! for users, chats and messages.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use parlor::api::ChatApi;
use parlor::types::{
    AppError, AuthResponse, Chat, CreateGroupChatRequest, GroupChat, Message, PrivateChat,
    ProfileUpdate, RegisterRequest, Result, Role, User,
};
use parlor::upload::ImageUploader;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ============= Fixtures =============

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        username: name.to_lowercase(),
        email: format!("{}@example.com", name.to_lowercase()),
        roles: BTreeSet::from([Role::User]),
        avatar: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn admin(id: &str, name: &str) -> User {
    let mut user = user(id, name);
    user.roles.insert(Role::Admin);
    user
}

pub fn private_chat(id: &str, participant: &str) -> Chat {
    Chat::Private(PrivateChat {
        id: id.to_string(),
        participant_id: format!("u-{}", participant.to_lowercase()),
        participant_name: participant.to_string(),
        participant_avatar: None,
        last_message: None,
        unread_count: 0,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    })
}

pub fn group_chat(id: &str, name: &str, members: Vec<User>) -> Chat {
    Chat::Group(GroupChat {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        avatar: None,
        members,
        admin: "u1".to_string(),
        last_message: None,
        unread_count: 0,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    })
}

pub fn message(id: &str, chat_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        sender_id: "u1".to_string(),
        sender_name: "Ada".to_string(),
        content: content.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        chat_id: chat_id.to_string(),
        is_read: false,
    }
}

// ============= Chat API =============

/// In-memory [`ChatApi`] with scriptable failures and latencies.
///
/// # Examples
///
/// ```ignore
/// // A server with a signed-in user and two chats
/// let api = MockChatApi::new()
///     .with_session(user("u1", "Ada"))
///     .with_chats(vec![private_chat("a", "Grace"), private_chat("b", "Alan")]);
///
/// // Every login attempt is rejected
/// let api = MockChatApi::new().failing(&["login"]);
/// ```
#[derive(Default)]
pub struct MockChatApi {
    session: Mutex<Option<User>>,
    accounts: Mutex<HashMap<String, (String, User)>>,
    chats: Mutex<Vec<Chat>>,
    messages: Mutex<HashMap<String, Vec<Message>>>,
    users: Mutex<Vec<User>>,
    failing: Mutex<HashSet<String>>,
    /// Scripted `get_messages` replies: (delay, messages)
    scripted_messages: Mutex<VecDeque<(Duration, Vec<Message>)>>,
    send_delays: Mutex<VecDeque<Duration>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing server-side session for `user`
    pub fn with_session(self, user: User) -> Self {
        *self.session.lock() = Some(user);
        self
    }

    /// Register an account that `login` accepts
    pub fn with_account(self, identifier: &str, password: &str, user: User) -> Self {
        self.accounts
            .lock()
            .insert(identifier.to_string(), (password.to_string(), user));
        self
    }

    pub fn with_chats(self, chats: Vec<Chat>) -> Self {
        *self.chats.lock() = chats;
        self
    }

    pub fn with_messages(self, chat_id: &str, messages: Vec<Message>) -> Self {
        self.messages.lock().insert(chat_id.to_string(), messages);
        self
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.lock() = users;
        self
    }

    /// Make the named operations fail
    pub fn failing(self, operations: &[&str]) -> Self {
        self.failing
            .lock()
            .extend(operations.iter().map(|op| op.to_string()));
        self
    }

    pub fn set_failing(&self, operation: &str, fail: bool) {
        let mut failing = self.failing.lock();
        if fail {
            failing.insert(operation.to_string());
        } else {
            failing.remove(operation);
        }
    }

    pub fn set_chats(&self, chats: Vec<Chat>) {
        *self.chats.lock() = chats;
    }

    /// Queue a reply for the next `get_messages` call
    pub fn script_messages(&self, delay: Duration, messages: Vec<Message>) {
        self.scripted_messages.lock().push_back((delay, messages));
    }

    /// Queue a latency for the next `send_message` call
    pub fn script_send_delay(&self, delay: Duration) {
        self.send_delays.lock().push_back(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    fn record(&self, operation: &str) -> Result<()> {
        self.calls.lock().push(operation.to_string());
        if self.failing.lock().contains(operation) {
            return Err(AppError::Api {
                status: 500,
                message: format!("Mock {} failure", operation),
            });
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn signed_in(&self) -> Result<User> {
        self.session
            .lock()
            .clone()
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse> {
        self.calls.lock().push("login".to_string());

        let account = self.accounts.lock().get(identifier).cloned();
        match account {
            Some((expected, user))
                if expected == password && !self.failing.lock().contains("login") =>
            {
                *self.session.lock() = Some(user.clone());
                Ok(AuthResponse {
                    user,
                    token: Some(format!("token-{}", identifier)),
                })
            }
            _ => Err(AppError::Api {
                status: 401,
                message: "Login failed".to_string(),
            }),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.record("register")?;
        let mut new_user = user(&self.next_id("u"), &request.name);
        new_user.username = request.username.clone();
        new_user.email = request.email.clone();

        *self.session.lock() = Some(new_user.clone());
        Ok(AuthResponse {
            user: new_user,
            token: Some("token-registered".to_string()),
        })
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout")?;
        *self.session.lock() = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        self.record("current_user")?;
        self.signed_in()
    }

    async fn get_chats(&self) -> Result<Vec<Chat>> {
        self.record("get_chats")?;
        Ok(self.chats.lock().clone())
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.record("get_messages")?;

        let scripted = self.scripted_messages.lock().pop_front();
        if let Some((delay, messages)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(messages);
        }
        Ok(self
            .messages
            .lock()
            .get(chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message> {
        self.record("send_message")?;

        let delay = self.send_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let sent = message(&self.next_id("m"), chat_id, content);
        self.messages
            .lock()
            .entry(chat_id.to_string())
            .or_default()
            .push(sent.clone());
        Ok(sent)
    }

    async fn create_private_chat(&self, participant_id: &str) -> Result<Chat> {
        self.record("create_private_chat")?;
        let mut chat = private_chat(&self.next_id("c"), participant_id);
        if let Chat::Private(private) = &mut chat {
            private.participant_id = participant_id.to_string();
        }
        self.chats.lock().push(chat.clone());
        Ok(chat)
    }

    async fn create_group_chat(&self, request: &CreateGroupChatRequest) -> Result<Chat> {
        self.record("create_group_chat")?;
        let members = request
            .member_ids
            .iter()
            .map(|id| user(id, id))
            .collect();
        let mut chat = group_chat(&self.next_id("g"), &request.name, members);
        if let Chat::Group(group) = &mut chat {
            group.description = request.description.clone();
        }
        self.chats.lock().push(chat.clone());
        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.record("delete_chat")?;
        self.chats.lock().retain(|chat| chat.id() != chat_id);
        Ok(())
    }

    async fn update_user(&self, update: &ProfileUpdate) -> Result<User> {
        self.record("update_user")?;
        let mut current = self.signed_in()?;
        if let Some(name) = &update.name {
            current.name = name.clone();
        }
        if let Some(avatar) = &update.avatar {
            current.avatar = Some(avatar.clone());
        }
        *self.session.lock() = Some(current.clone());
        Ok(current)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        self.record("search_users")?;
        let query = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| {
                u.name.to_lowercase().contains(&query) || u.username.contains(&query)
            })
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.record("get_user")?;
        self.users
            .lock()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }
}

// ============= Uploader =============

/// Uploader that returns a fixed URL or always fails
pub struct MockUploader {
    url: String,
    should_fail: bool,
    uploads: Mutex<Vec<(String, usize)>>,
}

impl MockUploader {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            should_fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: String::new(),
            should_fail: true,
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// (file name, byte length) of every upload attempt
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ImageUploader for MockUploader {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        self.uploads.lock().push((file_name.to_string(), bytes.len()));
        if self.should_fail {
            return Err(AppError::Upload("Mock upload failure".to_string()));
        }
        Ok(self.url.clone())
    }
}
