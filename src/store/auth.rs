//! Authentication session store
//!
//! Single source of truth for "is there a logged-in user, and who".
//!
//! ```text
//!            initialize ok            login/register ok
//! Checking ───────────────▶ Authenticated ◀──────────── Unauthenticated
//!    │                         │   ▲  profile update ok        ▲
//!    │ initialize failed       │   └──────┘                    │
//!    └─────────────────────────┼───────────────────────────────┘
//!                              └──────── logout ───────────────┘
//! ```
//!
//! No transition leads back to `Checking`.

use crate::api::ChatApi;
use crate::types::{AppError, ProfileUpdate, RegisterRequest, Result, User};
use crate::upload::ImageUploader;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Start-up "who am I" check in flight
    Checking,
    Authenticated(User),
    Unauthenticated,
}

/// Immutable snapshot of the session.
///
/// Fields are private so that `is_authenticated() == user().is_some()` holds
/// for every snapshot ever produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    phase: SessionPhase,
    is_loading: bool,
    error: Option<String>,
}

impl Default for Session {
    /// The empty, unauthenticated shape (also the shape after logout)
    fn default() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            is_loading: false,
            error: None,
        }
    }
}

impl Session {
    /// Start-up shape: checking, loading
    pub fn checking() -> Self {
        Self {
            phase: SessionPhase::Checking,
            is_loading: true,
            error: None,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn user(&self) -> Option<&User> {
        match &self.phase {
            SessionPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_checking(&self) -> bool {
        matches!(self.phase, SessionPhase::Checking)
    }

    /// True while the start-up check or any operation is in flight
    pub fn is_loading(&self) -> bool {
        self.is_loading || self.is_checking()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ============= Transitions =============

    /// Resolve the start-up check. Ignored once the phase has moved on.
    fn resolved(&self, user: Option<User>) -> Self {
        if !self.is_checking() {
            return self.clone();
        }
        match user {
            Some(user) => Self::authenticated(user),
            None => Self::default(),
        }
    }

    /// An operation started: loading, previous error cleared.
    ///
    /// The phase is untouched, so a login started before the start-up check
    /// resolves still reports `is_loading()` through `Checking`.
    fn begin(&self) -> Self {
        Self {
            phase: self.phase.clone(),
            is_loading: true,
            error: None,
        }
    }

    /// A resolved, signed-in snapshot
    pub fn authenticated(user: User) -> Self {
        Self {
            phase: SessionPhase::Authenticated(user),
            is_loading: false,
            error: None,
        }
    }

    /// An operation failed: the phase (and any user) is kept.
    ///
    /// A failure while `Checking` leaves the session checking, so
    /// `is_loading()` only drops once [`AuthStore::initialize`] resolves.
    fn failed(&self, message: &str) -> Self {
        Self {
            phase: self.phase.clone(),
            is_loading: false,
            error: Some(message.to_string()),
        }
    }

    /// Replace the user payload; only applies while authenticated
    fn profile_updated(&self, user: User) -> Self {
        match self.phase {
            SessionPhase::Authenticated(_) => Self::authenticated(user),
            _ => Self {
                is_loading: false,
                ..self.clone()
            },
        }
    }
}

/// Process-wide session store.
///
/// Every mutation goes through one of the operations below; readers take
/// whole snapshots with [`AuthStore::snapshot`].
pub struct AuthStore {
    api: Arc<dyn ChatApi>,
    uploader: Arc<dyn ImageUploader>,
    state: ArcSwap<Session>,
}

impl AuthStore {
    /// Create a store in the `Checking` state. Call [`AuthStore::initialize`]
    /// once at start-up.
    pub fn new(api: Arc<dyn ChatApi>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self {
            api,
            uploader,
            state: ArcSwap::from_pointee(Session::checking()),
        }
    }

    /// Current session snapshot (lockless read)
    pub fn snapshot(&self) -> Arc<Session> {
        self.state.load_full()
    }

    fn transition<F>(&self, f: F)
    where
        F: Fn(&Session) -> Session,
    {
        self.state.rcu(|current| f(current));
    }

    /// Ask the server for the current user.
    ///
    /// A missing session is expected and is not recorded as an error. Loading
    /// terminates on every path. The failure that ended the check is handed
    /// back so callers can tell a rejected token ([`AppError::is_unauthorized`])
    /// from an unreachable server.
    pub async fn initialize(&self) -> Option<AppError> {
        match self.api.current_user().await {
            Ok(user) => {
                info!("Session restored for {}", user.username);
                self.transition(|s| s.resolved(Some(user.clone())));
                None
            }
            Err(e) => {
                debug!("No active session: {}", e);
                self.transition(|s| s.resolved(None));
                Some(e)
            }
        }
    }

    /// Log in with a username or email.
    ///
    /// Failures are recorded on the session and also returned so the calling
    /// form can keep the user on the page.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User> {
        self.transition(Session::begin);

        match self.api.login(identifier, password).await {
            Ok(auth) => {
                info!("User {} logged in", auth.user.username);
                self.transition(|_| Session::authenticated(auth.user.clone()));
                Ok(auth.user)
            }
            Err(e) => Err(self.record_failure("Login", e)),
        }
    }

    /// Register a new account. Success logs the user in.
    pub async fn register(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        self.transition(Session::begin);

        let request = RegisterRequest {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.register(&request).await {
            Ok(auth) => {
                info!("User {} registered", auth.user.username);
                self.transition(|_| Session::authenticated(auth.user.clone()));
                Ok(auth.user)
            }
            Err(e) => Err(self.record_failure("Registration", e)),
        }
    }

    /// Send a partial profile update and replace the stored user with the
    /// server's representation. Authentication status is unchanged.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        self.transition(Session::begin);

        match self.api.update_user(&update).await {
            Ok(user) => {
                info!("Profile updated for {}", user.username);
                self.transition(|s| s.profile_updated(user.clone()));
                Ok(user)
            }
            Err(e) => Err(self.record_failure("Profile update", e)),
        }
    }

    /// Upload a new avatar image, then store its hosted URL on the profile
    pub async fn update_avatar(&self, bytes: Vec<u8>, file_name: &str) -> Result<User> {
        let url = match self.uploader.upload_image(bytes, file_name).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Avatar upload failed: {}", e);
                let err = AppError::Upload("Failed to upload image".to_string());
                self.transition(|s| s.failed(&err.user_message()));
                return Err(err);
            }
        };

        self.update_profile(ProfileUpdate {
            name: None,
            avatar: Some(url),
        })
        .await
    }

    /// End the session. The server call is best effort; local state is
    /// reset whatever it returns.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Logout request failed: {}", e);
        }
        self.state.store(Arc::new(Session::default()));
        info!("Session cleared");
    }

    fn record_failure(&self, operation: &str, error: AppError) -> AppError {
        let message = error.user_message();
        warn!("{} failed: {}", operation, message);
        self.transition(|s| s.failed(&message));
        error
    }
}
