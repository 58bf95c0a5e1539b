//! Init command implementation
//!
//! Writes a commented `parlor.toml`, a `.env.example` with the upload
//! credentials, and a `.gitignore` that keeps `.env` out of version control.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq)]
pub enum InitResult {
    Success,
    /// parlor.toml already exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// API base URL written to parlor.toml
    pub api_url: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Parlor");

    let base_path = &config.path;
    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.created_dir(&base_path.display().to_string());
    }

    let config_path = base_path.join("parlor.toml");
    if config_path.exists() && !config.force {
        output.warning("parlor.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating configuration files");

    if let Err(e) = write_file(&config_path, &generate_parlor_toml(&config), config.force) {
        output.error(&format!("Failed to create parlor.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "parlor.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if gitignore_path.exists() {
        output.skipped(".gitignore", "already exists");
    } else if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
        output.warning(&format!("Failed to create .gitignore: {}", e));
    } else {
        output.created("file", ".gitignore");
    }

    output.complete("Parlor initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Optional: configure avatar uploads");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set CLOUDINARY_CLOUD_NAME / CLOUDINARY_UPLOAD_PRESET");
    output.newline();
    output.info("2. Sign in:");
    output.command("parlor login <username-or-email>");
    output.newline();

    output.hint(&format!("Requests go to {}", config.api_url));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_parlor_toml(config: &InitConfig) -> String {
    format!(
        r#"# Parlor client configuration
# Every value below is optional; the defaults are shown.

[api]
# REST API root. PARLOR_API_URL overrides this value.
base_url = "{api_url}"
timeout_secs = 30

[upload]
# Names of the environment variables holding the Cloudinary credentials.
# Without them avatars are stored inline as data URLs.
cloud_name_env = "CLOUDINARY_CLOUD_NAME"
upload_preset_env = "CLOUDINARY_UPLOAD_PRESET"

[session]
# credentials_file = "~/.local/share/parlor/credentials.json"

[logging]
# trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"

[limits]
max_upload_mb = 10
max_group_members = 50
"#,
        api_url = config.api_url
    )
}

fn generate_env_example() -> String {
    r#"# Parlor Environment Variables
# ============================
# Copy this file to .env and fill in the values.

# Optional: API root (overrides [api].base_url)
# PARLOR_API_URL=http://localhost:3000/api

# Optional: Cloudinary unsigned uploads for avatars
CLOUDINARY_CLOUD_NAME=your_cloud_name
CLOUDINARY_UPLOAD_PRESET=your_upload_preset

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,parlor=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Environment
.env
.env.local
.env.*.local

# Rust
/target/
"#
    .to_string()
}
