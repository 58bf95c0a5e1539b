//! Route table and navigation
//!
//! | Path            | Route         | Access        |
//! |-----------------|---------------|---------------|
//! | `/`             | Chat          | authenticated |
//! | `/login`        | Login         | guest only    |
//! | `/register`     | Register      | guest only    |
//! | `/me`           | Profile       | authenticated |
//! | `/admin`        | Admin         | `admin` role  |
//! | `/admin/config` | AdminConfig   | `admin` role  |
//! | anything else   | NotFound      | public        |

pub mod guard;

pub use guard::{guard, GuardDecision};

use crate::types::Role;
use parking_lot::RwLock;
use std::collections::VecDeque;
use tracing::debug;

/// Entries kept for [`Navigator::back`]
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Chat,
    Login,
    Register,
    Profile,
    Admin,
    AdminConfig,
    NotFound(String),
}

/// Who may render a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Only without a session; signed-in users are sent to the default route
    GuestOnly,
    Authenticated,
    Role(Role),
}

impl Route {
    /// Where signed-in users land
    pub const DEFAULT: Route = Route::Chat;

    /// Map a path to a route. Query strings, fragments and trailing slashes
    /// are ignored.
    pub fn resolve(path: &str) -> Route {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        match path {
            "" => Route::Chat,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/me" => Route::Profile,
            "/admin" => Route::Admin,
            "/admin/config" => Route::AdminConfig,
            other => Route::NotFound(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Chat => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Profile => "/me",
            Route::Admin => "/admin",
            Route::AdminConfig => "/admin/config",
            Route::NotFound(path) => path,
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Chat | Route::Profile => Access::Authenticated,
            Route::Login | Route::Register => Access::GuestOnly,
            Route::Admin | Route::AdminConfig => Access::Role(Role::Admin),
            Route::NotFound(_) => Access::Public,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug)]
struct NavState {
    current: String,
    history: VecDeque<String>,
}

/// Current path plus a bounded back-stack
#[derive(Debug)]
pub struct Navigator {
    state: RwLock<NavState>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::DEFAULT.path())
    }
}

impl Navigator {
    pub fn new(initial: &str) -> Self {
        Self {
            state: RwLock::new(NavState {
                current: initial.to_string(),
                history: VecDeque::new(),
            }),
        }
    }

    pub fn current_path(&self) -> String {
        self.state.read().current.clone()
    }

    pub fn current_route(&self) -> Route {
        Route::resolve(&self.state.read().current)
    }

    /// Go to `path`, pushing the current path onto the history
    pub fn navigate(&self, path: &str) {
        let mut state = self.state.write();
        if state.current == path {
            return;
        }
        let previous = std::mem::replace(&mut state.current, path.to_string());
        state.history.push_back(previous);
        if state.history.len() > MAX_HISTORY {
            state.history.pop_front();
        }
        debug!(path, "Navigated");
    }

    /// Go to `path` without recording the current one (redirects)
    pub fn replace(&self, path: &str) {
        self.state.write().current = path.to_string();
    }

    /// Pop the history. Returns the new current path, if any.
    pub fn back(&self) -> Option<String> {
        let mut state = self.state.write();
        let previous = state.history.pop_back()?;
        state.current = previous.clone();
        Some(previous)
    }

    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }
}
