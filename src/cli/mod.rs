//! CLI module for Parlor
//!
//! Command-line parsing and the terminal screens of the `parlor` binary.
//! Uses clap for argument parsing and owo-colors for colored output.

pub mod commands;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parlor - terminal chat client
#[derive(Parser, Debug)]
#[command(
    name = "parlor",
    version,
    about = "Parlor - terminal chat client",
    long_about = "Sign in, browse conversations, read and send messages against a Parlor chat API.\n\n\
                  Use 'init' to write a parlor.toml next to you, then 'login'.",
    after_help = "EXAMPLES:\n    \
                  parlor init                          # Write parlor.toml and .env.example\n    \
                  parlor login ada                     # Sign in (prompts for the password)\n    \
                  parlor chats                         # List conversations\n    \
                  parlor send <chat-id> \"hello\"        # Send a message\n    \
                  parlor route /admin                  # Show what a route renders"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "parlor.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write parlor.toml, .env.example and .gitignore
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// API base URL to write into parlor.toml
        #[arg(long, default_value = "http://localhost:3000/api")]
        api_url: String,
    },

    /// Sign in with a username or email
    Login {
        /// Username or email
        identifier: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "PARLOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "PARLOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or update your profile
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New avatar URL (http, https or data URL)
        #[arg(long, conflicts_with = "avatar_file")]
        avatar: Option<String>,

        /// Upload an image file as the new avatar
        #[arg(long)]
        avatar_file: Option<PathBuf>,
    },

    /// List conversations
    Chats,

    /// Select a conversation and show its messages
    Open {
        chat_id: String,
    },

    /// Print the messages of a conversation
    Messages {
        chat_id: String,
    },

    /// Send a message to a conversation
    Send {
        chat_id: String,

        /// Message text
        content: String,
    },

    /// Start a one-to-one conversation
    NewPrivate {
        /// User id of the other participant
        participant_id: String,
    },

    /// Create a group conversation
    NewGroup {
        /// Group name
        name: String,

        /// Member user ids, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        members: Vec<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a conversation
    Delete {
        chat_id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Search users by name, username or email
    Search {
        query: String,
    },

    /// Administration screens (admin role required)
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Show what a path renders for the current session
    Route {
        /// Path such as /, /login, /me or /admin
        path: String,
    },
}

/// Administration subcommands
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Show the administration overview
    Show,

    /// Show or change client limits
    Config {
        /// Largest accepted avatar upload, in MiB
        #[arg(long)]
        max_upload_mb: Option<u64>,

        /// Largest accepted group size
        #[arg(long)]
        max_group_members: Option<usize>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_new_group_splits_members() {
        let cli = Cli::parse_from(["parlor", "new-group", "Team", "--members", "u1,u2"]);
        match cli.command {
            Commands::NewGroup { name, members, .. } => {
                assert_eq!(name, "Team");
                assert_eq!(members, vec!["u1", "u2"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["parlor", "chats", "--no-color", "--json-logs"]);
        assert!(cli.no_color);
        assert!(cli.json_logs);
        assert_eq!(cli.config, PathBuf::from("parlor.toml"));
    }
}
