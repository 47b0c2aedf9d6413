//! Access-token capabilities handed to controllers instead of reading a global store.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::warn;

pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Fixed token, or none at all. Used by tests and one-shot tools.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<String>);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialStore for StaticCredentials {
    fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTokens {
    access_token: String,
}

/// Reads the persisted tokens file on every lookup.
///
/// The file holds either `{"accessToken": "..."}` or the bare token. A missing,
/// empty or unreadable file means "not signed in".
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read persisted tokens");
                return None;
            }
        };
        parse_persisted_tokens(&raw)
    }
}

fn parse_persisted_tokens(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('{') {
        return serde_json::from_str::<PersistedTokens>(raw)
            .ok()
            .map(|tokens| tokens.access_token)
            .filter(|token| !token.is_empty());
    }
    Some(raw.to_string())
}
