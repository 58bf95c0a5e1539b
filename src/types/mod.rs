use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

// ============= User Types =============

/// Role granted to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

// ============= Message Types =============

/// A single chat message. Never mutated once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub chat_id: String,
    #[serde(default)]
    pub is_read: bool,
}

// ============= Chat Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateChat {
    pub id: String,
    pub participant_id: String,
    pub participant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChat {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub members: Vec<User>,
    /// User id of the group administrator
    pub admin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A conversation, either one-to-one or multi-member.
///
/// Serialized with an explicit `kind` discriminant. Deserialization also
/// accepts the untagged shape served by the REST API, where a private chat
/// is recognised by the presence of `participantId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Chat {
    Private(PrivateChat),
    Group(GroupChat),
}

impl<'de> Deserialize<'de> for Chat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let is_private = match value.get("kind").and_then(|k| k.as_str()) {
            Some("private") => true,
            Some("group") => false,
            Some(other) => {
                return Err(D::Error::custom(format!("unknown chat kind '{}'", other)));
            }
            None => value.get("participantId").is_some(),
        };

        if is_private {
            serde_json::from_value(value)
                .map(Chat::Private)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Chat::Group)
                .map_err(D::Error::custom)
        }
    }
}

impl Chat {
    pub fn id(&self) -> &str {
        match self {
            Chat::Private(chat) => &chat.id,
            Chat::Group(chat) => &chat.id,
        }
    }

    /// Name shown in chat lists: the other participant or the group name
    pub fn display_name(&self) -> &str {
        match self {
            Chat::Private(chat) => &chat.participant_name,
            Chat::Group(chat) => &chat.name,
        }
    }

    pub fn avatar(&self) -> Option<&str> {
        match self {
            Chat::Private(chat) => chat.participant_avatar.as_deref(),
            Chat::Group(chat) => chat.avatar.as_deref(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        match self {
            Chat::Private(chat) => chat.last_message.as_ref(),
            Chat::Group(chat) => chat.last_message.as_ref(),
        }
    }

    pub fn unread_count(&self) -> u32 {
        match self {
            Chat::Private(chat) => chat.unread_count,
            Chat::Group(chat) => chat.unread_count,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Chat::Private(chat) => chat.created_at,
            Chat::Group(chat) => chat.created_at,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Chat::Group(_))
    }
}

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response body of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    /// Bearer token; absent when the server relies on a session cookie
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrivateChatRequest {
    pub participant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupChatRequest {
    pub name: String,
    pub member_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Envelope used by the chat creation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub chat: Chat,
}

/// Partial profile update sent to `PATCH /users/me`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none()
    }
}

/// Best-effort error body returned by the API on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.is_empty())
            .or(self.error.filter(|e| !e.is_empty()))
    }
}

// ============= Error Types =============

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload error: {0}")]
    Upload(String),

    /// A store operation failed; carries the message recorded on the store
    #[error("{0}")]
    Failed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The single human-readable string recorded on a store's `error` field.
    ///
    /// Network failures, server errors and validation rejections all collapse
    /// into one message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message, .. } => message.clone(),
            AppError::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// True when the server reported that no session exists
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Auth(_) | AppError::Api { status: 401, .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
