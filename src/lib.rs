//! # Parlor - chat client core
//!
//! Headless core of the Parlor chat client: a session store, a chat store,
//! a route guard and a REST client, plus the `parlor` terminal front-end
//! built on top of them.
//!
//! ## Overview
//!
//! Everything is wired once at start-up into an [`AppState`] and passed by
//! reference to whatever renders it. Stores publish immutable snapshots;
//! readers never see a half-applied change.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parlor::{AppState, ConfigManager, HttpApiClient};
//! use parlor::upload::select_uploader;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> parlor::Result<()> {
//!     let config = Arc::new(ConfigManager::new("parlor.toml")?);
//!     let cfg = config.config();
//!
//!     let api = Arc::new(HttpApiClient::new(&cfg.api.base_url)?);
//!     let uploader = select_uploader(
//!         cfg.cloud_name(),
//!         cfg.upload_preset(),
//!         cfg.limits.max_upload_bytes(),
//!     );
//!
//!     let app = AppState::new(config, api, uploader);
//!     app.start().await;
//!
//!     app.auth.login("ada", "hunter22").await?;
//!     app.chat.load_chats().await;
//!     for chat in &app.chat.snapshot().chats {
//!         println!("{}", chat.display_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`store`] - Session and chat stores
//! - [`router`] - Route table, navigator and guard
//! - [`api`] - REST API client
//! - [`forms`] - Form state and validation
//! - [`upload`] - Avatar image uploads
//! - [`realtime`] - Real-time event hub (not yet connected to a transport)
//! - [`types`] - Domain types and error handling

/// REST API client.
pub mod api;
/// Command-line front-end.
pub mod cli;
/// Form state, models and validators.
pub mod forms;
/// Real-time event hub.
pub mod realtime;
/// Routes, navigation and the route guard.
pub mod router;
/// Session and chat stores.
pub mod store;
/// Core types (entities, requests, errors).
pub mod types;
/// Image upload collaborators.
pub mod upload;
/// Configuration and credential files.
pub mod utils;

// Re-export commonly used types
pub use api::{ChatApi, HttpApiClient};
pub use router::{guard, GuardDecision, Navigator, Route};
pub use store::{AuthStore, ChatState, ChatStore, ChatStoreOptions, Session, SessionPhase};
pub use types::{AppError, Result};
pub use upload::ImageUploader;
pub use utils::toml_config::{ClientConfig, ConfigManager};

use realtime::{SocketConfig, SocketService};
use std::sync::Arc;
use tracing::{debug, info};

/// Application state shared across screens
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration
    pub config: Arc<ConfigManager>,
    /// REST API client
    pub api: Arc<dyn ChatApi>,
    /// Avatar uploader
    pub uploader: Arc<dyn ImageUploader>,
    /// Session store
    pub auth: Arc<AuthStore>,
    /// Chat store
    pub chat: Arc<ChatStore>,
    /// Current path and history
    pub navigator: Arc<Navigator>,
    /// Real-time event hub
    pub realtime: Arc<SocketService>,
}

impl AppState {
    /// Build the stores. Nothing is fetched until [`AppState::start`].
    pub fn new(
        config: Arc<ConfigManager>,
        api: Arc<dyn ChatApi>,
        uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        let limits = config.config().limits;
        let chat_options = ChatStoreOptions {
            max_group_members: limits.max_group_members,
            ..ChatStoreOptions::default()
        };

        Self {
            auth: Arc::new(AuthStore::new(Arc::clone(&api), Arc::clone(&uploader))),
            chat: Arc::new(ChatStore::with_options(Arc::clone(&api), chat_options)),
            navigator: Arc::new(Navigator::default()),
            realtime: Arc::new(SocketService::new()),
            config,
            api,
            uploader,
        }
    }

    /// Resolve the session and, when signed in, prepare the real-time hub.
    ///
    /// Returns the failure that left the session signed out, if any.
    pub async fn start(&self) -> Option<AppError> {
        let failure = self.auth.initialize().await;

        if let Some(user) = self.auth.snapshot().user() {
            info!("Signed in as {}", user.username);
            let url = realtime_url(&self.config.config().api.base_url);
            self.realtime
                .connect(SocketConfig { url, token: None })
                .await;
        }
        failure
    }

    /// Navigate to `path` through the route guard.
    ///
    /// Rendered routes are pushed onto the history; redirects replace the
    /// current entry with their target.
    pub fn open(&self, path: &str) -> GuardDecision {
        let route = Route::resolve(path);
        let decision = guard(&self.auth.snapshot(), &route);

        match &decision {
            GuardDecision::Render(route) => self.navigator.navigate(route.path()),
            GuardDecision::Redirect(target) => {
                debug!(from = path, to = %target, "Redirected");
                self.navigator.replace(target.path());
            }
            GuardDecision::Loading => {}
        }
        decision
    }

    /// Select a chat and load its messages. Returns false when the chat is
    /// not in the loaded list.
    pub async fn open_chat(&self, chat_id: &str) -> bool {
        let Some(chat) = self.chat.snapshot().find_chat(chat_id).cloned() else {
            return false;
        };

        self.chat.select_chat(Some(chat));
        self.realtime.join_chat(chat_id);
        self.chat.load_messages(chat_id).await;
        true
    }

    /// End the session everywhere and return to the login route
    pub async fn logout(&self) {
        self.auth.logout().await;
        self.chat.reset();
        self.realtime.disconnect();
        self.navigator.replace(Route::Login.path());
    }
}

/// WebSocket URL for an API base URL: scheme swapped, `/api` suffix dropped
fn realtime_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = base.strip_suffix("/api").unwrap_or(base);
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    }
}
