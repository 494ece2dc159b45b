//! A small JSON file remembering who signed in last, and the session
//! cookie the service handed out. It is only a convenience: a missing or
//! unreadable file just means signing in again.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use serde::{Deserialize, Serialize};

use crate::api::public::User;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedUser {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UserCache {
    path: PathBuf,
}

impl UserCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<CachedUser> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Unable to read user cache {}: {}", self.path.display(), e);
                return None;
            }
        };
        serde_json::from_str(&contents)
            .inspect_err(|e| {
                tracing::warn!("Ignoring invalid user cache {}: {}", self.path.display(), e)
            })
            .ok()
    }

    pub fn store(&self, cached: &CachedUser) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let data = serde_json::to_string_pretty(cached)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write user cache {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Unable to remove user cache {}: {}", self.path.display(), e),
        }
    }
}
