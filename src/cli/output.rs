//! Colored output helpers for CLI
//!
//! Consistent terminal rendering for the Parlor screens: status lines,
//! chat lists, message transcripts and user cards.

use crate::types::{Chat, Message, User};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the Parlor banner
    pub fn banner(&self) {
        let title = format!("parlor v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!("\n   {}", title.bright_cyan().bold());
            println!("   {}\n", "Terminal chat client".bright_white().bold());
        } else {
            println!("\n   {}\n   Terminal chat client\n", title);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a file skipped message
    pub fn skipped(&self, path: &str, reason: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "○".yellow(),
                path.dimmed(),
                format!("({})", reason).yellow()
            );
        } else {
            println!("  [SKIPPED] {} ({})", path, reason);
        }
    }

    /// Print a directory creation message
    pub fn created_dir(&self, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                "directory".dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] directory {}", path);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Print completion message with next steps
    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// Prompt for confirmation (returns true if user confirms)
    pub fn confirm(&self, message: &str) -> bool {
        if self.colored {
            print!(
                "  {} {} [y/N]: ",
                "?".bright_yellow().bold(),
                message.bright_white()
            );
        } else {
            print!("  [?] {} [y/N]: ", message);
        }

        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            let input = input.trim().to_lowercase();
            input == "y" || input == "yes"
        } else {
            false
        }
    }

    /// Prompt for a line of input. Returns None on EOF or empty input.
    pub fn prompt(&self, message: &str) -> Option<String> {
        if self.colored {
            print!("  {} {}: ", "?".bright_yellow().bold(), message.bright_white());
        } else {
            print!("  [?] {}: ", message);
        }

        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let input = input.trim_end_matches(['\r', '\n']).to_string();
                (!input.is_empty()).then_some(input)
            }
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        if self.colored {
            let header: String = columns
                .iter()
                .map(|c| format!("{:<15}", c))
                .collect::<Vec<_>>()
                .join(" ");
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(columns.len() * 16).dimmed());
        } else {
            let header: String = columns
                .iter()
                .map(|c| format!("{:<15}", c))
                .collect::<Vec<_>>()
                .join(" ");
            println!("    {}", header);
            println!("    {}", "-".repeat(columns.len() * 16));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        let row: String = values
            .iter()
            .map(|v| format!("{:<15}", v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("    {}", row);
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }

    // ============= Domain renderers =============

    /// One line per chat; `selected` marks the current chat
    pub fn chat_list(&self, chats: &[Chat], selected: Option<&str>) {
        if chats.is_empty() {
            self.info("No conversations yet");
            return;
        }

        self.table_header(&["Id", "Kind", "Name", "Unread", "Last message"]);
        for chat in chats {
            let marker = if selected == Some(chat.id()) { "*" } else { " " };
            let id = format!("{}{}", marker, chat.id());
            let kind = if chat.is_group() { "group" } else { "private" };
            let unread = chat.unread_count().to_string();
            let preview = chat
                .last_message()
                .map(|m| truncate(&m.content, 40))
                .unwrap_or_default();
            self.table_row(&[&id, kind, chat.display_name(), &unread, &preview]);
        }
    }

    /// Render a transcript; the signed-in user's messages are highlighted
    pub fn messages(&self, messages: &[Message], own_user_id: Option<&str>) {
        if messages.is_empty() {
            self.info("No messages yet");
            return;
        }

        for message in messages {
            let time = message.timestamp.format("%Y-%m-%d %H:%M").to_string();
            let own = own_user_id == Some(message.sender_id.as_str());
            if self.colored {
                let sender = if own {
                    message.sender_name.bright_green().bold().to_string()
                } else {
                    message.sender_name.bright_cyan().bold().to_string()
                };
                println!("    {} {} {}", time.dimmed(), sender, message.content);
            } else {
                println!("    {} {}: {}", time, message.sender_name, message.content);
            }
        }
    }

    pub fn user(&self, user: &User) {
        self.kv("Id", &user.id);
        self.kv("Name", &user.name);
        self.kv("Username", &user.username);
        self.kv("Email", &user.email);
        let roles = user
            .roles
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.kv("Roles", if roles.is_empty() { "-" } else { &roles });
        if let Some(avatar) = &user.avatar {
            self.kv("Avatar", &truncate(avatar, 60));
        }
        self.kv("Member since", &user.created_at.format("%Y-%m-%d").to_string());
    }

    pub fn user_list(&self, users: &[User]) {
        if users.is_empty() {
            self.info("No users found");
            return;
        }
        self.table_header(&["Id", "Username", "Name"]);
        for user in users {
            self.table_row(&[&user.id, &user.username, &user.name]);
        }
    }
}

/// Shorten to `max` characters, appending an ellipsis when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
