//! Field validators shared by the forms and the stores

use regex::Regex;
use std::sync::LazyLock;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Username length bounds (inclusive)
pub const USERNAME_LEN: (usize, usize) = (3, 20);

/// Maximum chat name length
pub const MAX_CHAT_NAME_LEN: usize = 100;

/// Maximum message length
pub const MAX_MESSAGE_LEN: usize = 5000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    len >= USERNAME_LEN.0 && len <= USERNAME_LEN.1
}

pub fn is_valid_chat_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().count() <= MAX_CHAT_NAME_LEN
}

pub fn is_valid_message(message: &str) -> bool {
    !message.trim().is_empty() && message.chars().count() <= MAX_MESSAGE_LEN
}

/// Avatar references must be hosted (http/https) or inline data URLs
pub fn is_valid_avatar_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with("data:")
}
