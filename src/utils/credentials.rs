//! Bearer token persistence between CLI runs

use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub token: String,
    /// API the token was issued by
    pub base_url: String,
    pub saved_at: DateTime<Utc>,
}

/// JSON file holding the current token
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token for `base_url`, if one was saved for that API
    pub fn load(&self, base_url: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Internal(format!("Failed to read credentials: {}", e)))?;
        let stored: StoredCredentials = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                debug!("Ignoring unreadable credentials file: {}", e);
                return Ok(None);
            }
        };

        Ok((stored.base_url == base_url).then_some(stored.token))
    }

    pub fn save(&self, base_url: &str, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let stored = StoredCredentials {
            token: token.to_string(),
            base_url: base_url.to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| AppError::Internal(format!("Failed to encode credentials: {}", e)))?;
        write_private(&self.path, json.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to write credentials: {}", e)))?;

        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to remove credentials: {}",
                e
            ))),
        }
    }
}

/// Write `contents` readable by the owner only
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by an older run
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
