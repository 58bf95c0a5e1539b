//! Real-time event hub
//!
//! Extension point for pushing chat, message and presence events into the
//! client. No wire transport is implemented: `connect` only records the
//! configuration and the service stays disconnected, so outgoing events are
//! dropped. Listeners can still be registered and fed through
//! [`SocketService::dispatch_local`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const EVENT_MESSAGE_SEND: &str = "message:send";
pub const EVENT_CHAT_JOIN: &str = "chat:join";
pub const EVENT_CHAT_LEAVE: &str = "chat:leave";
pub const EVENT_USER_STATUS: &str = "user:status";

/// Connection settings for a future transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Offline,
    Away,
}

/// Handle returned by [`SocketService::on`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
pub struct SocketService {
    config: Mutex<Option<SocketConfig>>,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl SocketService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the connection settings. No transport is opened.
    pub async fn connect(&self, config: SocketConfig) {
        debug!(url = %config.url, "Real-time transport not available; staying disconnected");
        *self.config.lock() = Some(config);
    }

    pub fn config(&self) -> Option<SocketConfig> {
        self.config.lock().clone()
    }

    /// Always false: there is no transport to be connected through
    pub fn is_connected(&self) -> bool {
        false
    }

    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(callbacks) = listeners.get_mut(event) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Send an event to the server.
    ///
    /// Without a transport every event is dropped and `false` is returned.
    /// A transport implementation hooks in here.
    pub fn emit(&self, event: &str, data: Value) -> bool {
        debug!(event, payload = %data, "Dropping event while disconnected");
        false
    }

    /// Deliver an event to local listeners as if it came from the server.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch_local(&self, event: &str, data: &Value) -> usize {
        // Clone the callbacks so a listener may (un)register without deadlocking
        let callbacks: Vec<Listener> = self
            .listeners
            .lock()
            .get(event)
            .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(data);
        }
        callbacks.len()
    }

    pub fn disconnect(&self) {
        *self.config.lock() = None;
        self.listeners.lock().clear();
    }

    // ============= Chat helpers =============

    pub fn send_message(&self, chat_id: &str, content: &str) -> bool {
        self.emit(
            EVENT_MESSAGE_SEND,
            json!({ "chatId": chat_id, "content": content }),
        )
    }

    pub fn join_chat(&self, chat_id: &str) -> bool {
        self.emit(EVENT_CHAT_JOIN, json!({ "chatId": chat_id }))
    }

    pub fn leave_chat(&self, chat_id: &str) -> bool {
        self.emit(EVENT_CHAT_LEAVE, json!({ "chatId": chat_id }))
    }

    pub fn set_user_status(&self, status: UserStatus) -> bool {
        self.emit(EVENT_USER_STATUS, json!({ "status": status }))
    }
}
