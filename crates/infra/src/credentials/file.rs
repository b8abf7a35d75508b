//! JSON-file credential store
//!
//! The whole credential set is rewritten on every change through a sibling
//! temp file and a rename, so a crash never leaves a half-written file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use relay_core::CredentialStore;
use relay_domain::{RelayError, Result, TokenPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokens: Option<TokenPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    csrf_token: Option<String>,
}

/// Credential store persisted as JSON at a fixed path
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: RwLock<StoredCredentials>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading existing credentials if the file
    /// exists.
    ///
    /// # Errors
    /// Returns `RelayError::Storage` if the file exists but cannot be read,
    /// or `RelayError::Serialization` if its contents are not valid JSON.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let cached = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                RelayError::Serialization(format!(
                    "invalid credential file {}: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no credential file yet");
                StoredCredentials::default()
            }
            Err(err) => {
                return Err(RelayError::Storage(format!(
                    "failed to read {}: {err}",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), has_session = cached.tokens.is_some(), "credential store opened");
        Ok(Self { path, cached: RwLock::new(cached) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credentials: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                RelayError::Storage(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let contents = serde_json::to_vec_pretty(credentials)
            .map_err(|err| RelayError::Serialization(err.to_string()))?;

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, contents).map_err(|err| {
            RelayError::Storage(format!("failed to write {}: {err}", staging.display()))
        })?;
        fs::rename(&staging, &self.path).map_err(|err| {
            RelayError::Storage(format!("failed to replace {}: {err}", self.path.display()))
        })
    }

    /// Apply `change` to a copy, persist it, then publish it to readers.
    fn update(&self, change: impl FnOnce(&mut StoredCredentials)) -> Result<()> {
        let mut cached = self.cached.write();
        let mut next = cached.clone();
        change(&mut next);
        self.persist(&next)?;
        *cached = next;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_access_token(&self) -> Option<String> {
        self.cached.read().tokens.as_ref().map(|pair| pair.access_token.clone())
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.cached
            .read()
            .tokens
            .as_ref()
            .filter(|pair| pair.has_refresh_token())
            .map(|pair| pair.refresh_token.clone())
    }

    fn get_csrf_token(&self) -> Option<String> {
        self.cached.read().csrf_token.clone()
    }

    fn store_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.update(|credentials| credentials.tokens = Some(pair.clone()))
    }

    fn store_csrf_token(&self, token: &str) -> Result<()> {
        self.update(|credentials| credentials.csrf_token = Some(token.to_string()))
    }

    fn clear_tokens(&self) -> Result<()> {
        let mut cached = self.cached.write();
        *cached = StoredCredentials::default();

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RelayError::Storage(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn clear_session(&self) -> Result<()> {
        self.update(|credentials| credentials.tokens = None)
    }
}
