//! REST API client layer
//!
//! This module defines the fetch interface the stores depend on and its
//! HTTP implementation.
//!
//! # Module Structure
//!
//! - [`api::client`](crate::api::client) - `HttpApiClient`, the reqwest-backed implementation
//!
//! # API Endpoints
//!
//! ## Authentication (`/auth`)
//! - `POST /auth/login` - Login with username or email, returns `{user, token}`
//! - `POST /auth/register` - Register and log in, returns `{user, token}`
//! - `POST /auth/logout` - End the server-side session
//! - `GET /auth/me` - Current user (401 when no session exists)
//!
//! ## Chats (`/chats`)
//! - `GET /chats` - List conversations
//! - `GET /chats/{id}/messages` - Messages of a conversation
//! - `POST /chats/{id}/messages` - Send a message
//! - `POST /chats/private` - Create a one-to-one conversation
//! - `POST /chats/group` - Create a group conversation
//! - `DELETE /chats/{id}` - Delete a conversation
//!
//! ## Users (`/users`)
//! - `PATCH /users/me` - Update name and/or avatar
//! - `GET /users/search?q=` - Search users
//! - `GET /users/{id}` - Fetch a single user
//!
//! # Authentication
//!
//! Every call is credentialed. After login or registration the bearer token
//! returned by the server is attached to each request:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// reqwest-backed implementation of [`ChatApi`].
pub mod client;

pub use client::HttpApiClient;

use crate::types::{
    AuthResponse, Chat, CreateGroupChatRequest, Message, ProfileUpdate, RegisterRequest, Result,
    User,
};
use async_trait::async_trait;

/// The REST API as seen by the stores.
///
/// Any non-2xx response surfaces as an error carrying the best-effort
/// server-provided message. Implementations never retry.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Authenticate with a username or email
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse>;

    /// Create an account; a successful registration is also a login
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// End the server-side session
    async fn logout(&self) -> Result<()>;

    /// Ask the server who the current session belongs to
    async fn current_user(&self) -> Result<User>;

    async fn get_chats(&self) -> Result<Vec<Chat>>;

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message>;

    async fn create_private_chat(&self, participant_id: &str) -> Result<Chat>;

    async fn create_group_chat(&self, request: &CreateGroupChatRequest) -> Result<Chat>;

    async fn delete_chat(&self, chat_id: &str) -> Result<()>;

    /// Apply a partial profile update and return the server's representation
    async fn update_user(&self, update: &ProfileUpdate) -> Result<User>;

    async fn search_users(&self, query: &str) -> Result<Vec<User>>;

    async fn get_user(&self, user_id: &str) -> Result<User>;
}
