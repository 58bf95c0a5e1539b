//! HTTP implementation of the chat REST API
//!
//! Wraps a `reqwest::Client`, keeps the bearer token handed out by the
//! server and turns non-2xx responses into [`AppError::Api`] values.

use crate::api::ChatApi;
use crate::types::{
    ApiErrorBody, AppError, AuthResponse, Chat, ChatEnvelope, CreateGroupChatRequest,
    CreatePrivateChatRequest, LoginRequest, Message, ProfileUpdate, RegisterRequest, Result,
    SendMessageRequest, User,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a failed response is turned into a message
#[derive(Debug, Clone, Copy)]
enum FailureStyle {
    /// Server message when present, otherwise the fallback
    ServerOrFallback,
    /// `"<fallback>: <server message>"`, or just the fallback
    Prefixed,
}

/// REST client for the chat API.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::api::{ChatApi, HttpApiClient};
///
/// let client = HttpApiClient::new("http://localhost:3000/api")?;
/// let auth = client.login("ada", "hunter22").await?;
/// let chats = client.get_chats().await?;
/// ```
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpApiClient {
    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Seed the client with a token persisted by a previous run
    pub fn with_token(self, token: Option<String>) -> Self {
        *self.token.write() = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token currently attached to requests
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        fallback: &str,
        style: FailureStyle,
    ) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            error!("Request failed: {}", e);
            AppError::Network(e.to_string())
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::failure(response, fallback, style).await)
        }
    }

    async fn failure(response: Response, fallback: &str, style: FailureStyle) -> AppError {
        let status = response.status().as_u16();
        let server_message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(ApiErrorBody::into_message);

        let message = match (style, server_message) {
            (FailureStyle::Prefixed, Some(msg)) => format!("{}: {}", fallback, msg),
            (FailureStyle::ServerOrFallback, Some(msg)) => msg,
            (_, None) => fallback.to_string(),
        };

        debug!(status, message = %message, "API request rejected");
        AppError::Api { status, message }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid response from server: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        let response = self
            .execute(
                self.request(Method::GET, path),
                fallback,
                FailureStyle::ServerOrFallback,
            )
            .await?;
        Self::parse(response).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
        style: FailureStyle,
    ) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(method, path).json(body), fallback, style)
            .await?;
        Self::parse(response).await
    }

    fn remember_token(&self, auth: &AuthResponse) {
        if let Some(token) = &auth.token {
            self.set_token(Some(token.clone()));
        }
    }
}

#[async_trait]
impl ChatApi for HttpApiClient {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse> {
        debug!("POST /auth/login");
        let body = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .send_json(
                Method::POST,
                "/auth/login",
                &body,
                "Login failed",
                FailureStyle::Prefixed,
            )
            .await?;
        self.remember_token(&auth);
        Ok(auth)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        debug!("POST /auth/register");
        let auth: AuthResponse = self
            .send_json(
                Method::POST,
                "/auth/register",
                request,
                "Registration failed",
                FailureStyle::ServerOrFallback,
            )
            .await?;
        self.remember_token(&auth);
        Ok(auth)
    }

    async fn logout(&self) -> Result<()> {
        debug!("POST /auth/logout");
        let result = self
            .execute(
                self.request(Method::POST, "/auth/logout"),
                "Logout failed",
                FailureStyle::ServerOrFallback,
            )
            .await;
        // The local credential is dropped whatever the server said
        self.set_token(None);
        result.map(|_| ())
    }

    async fn current_user(&self) -> Result<User> {
        self.get_json("/auth/me", "Failed to get current user").await
    }

    async fn get_chats(&self) -> Result<Vec<Chat>> {
        self.get_json("/chats", "Failed to fetch chats").await
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.get_json(
            &format!("/chats/{}/messages", chat_id),
            "Failed to fetch messages",
        )
        .await
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<Message> {
        let body = SendMessageRequest {
            content: content.to_string(),
        };
        self.send_json(
            Method::POST,
            &format!("/chats/{}/messages", chat_id),
            &body,
            "Failed to send message",
            FailureStyle::ServerOrFallback,
        )
        .await
    }

    async fn create_private_chat(&self, participant_id: &str) -> Result<Chat> {
        let body = CreatePrivateChatRequest {
            participant_id: participant_id.to_string(),
        };
        let envelope: ChatEnvelope = self
            .send_json(
                Method::POST,
                "/chats/private",
                &body,
                "Failed to create private chat",
                FailureStyle::ServerOrFallback,
            )
            .await?;
        Ok(envelope.chat)
    }

    async fn create_group_chat(&self, request: &CreateGroupChatRequest) -> Result<Chat> {
        let envelope: ChatEnvelope = self
            .send_json(
                Method::POST,
                "/chats/group",
                request,
                "Failed to create group chat",
                FailureStyle::ServerOrFallback,
            )
            .await?;
        Ok(envelope.chat)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.execute(
            self.request(Method::DELETE, &format!("/chats/{}", chat_id)),
            "Failed to delete chat",
            FailureStyle::ServerOrFallback,
        )
        .await?;
        Ok(())
    }

    async fn update_user(&self, update: &ProfileUpdate) -> Result<User> {
        self.send_json(
            Method::PATCH,
            "/users/me",
            update,
            "Failed to update user profile",
            FailureStyle::ServerOrFallback,
        )
        .await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let response = self
            .execute(
                self.request(Method::GET, "/users/search").query(&[("q", query)]),
                "Failed to search users",
                FailureStyle::ServerOrFallback,
            )
            .await?;
        Self::parse(response).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.get_json(&format!("/users/{}", user_id), "Failed to fetch user")
            .await
    }
}
