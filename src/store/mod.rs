//! Application stores
//!
//! Each store owns one `ArcSwap` snapshot. Operations compute the next
//! snapshot from the current one and publish it atomically, so readers never
//! see a half-applied change and there is no `&mut` access from outside.

pub mod auth;
pub mod chat;

pub use auth::{AuthStore, Session, SessionPhase};
pub use chat::{ChatState, ChatStore, ChatStoreOptions};
