//! Client-side authentication state.
//!
//! A [`SessionContext`] holds the signed-in identity for one client instance and
//! mirrors it into a durable key-value record so it survives restarts. The record
//! backend is a [`RecordStore`], so tests and embedders can swap the file-backed
//! store for [`MemoryRecordStore`].

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

/// Key of the durable auth record.
pub const AUTH_RECORD_KEY: &str = "xtech_auth";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("record store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("auth record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated(User),
    Anonymous,
}

/// Serialized form of the session, `{ "user", "isAuthenticated", "isLoading" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// Durable string key-value storage.
pub trait RecordStore: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl RecordStore for FileRecordStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for MemoryRecordStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Authentication state for a single client instance.
pub struct SessionContext {
    records: Arc<dyn RecordStore>,
    state: SessionState,
}

impl SessionContext {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            state: SessionState::Uninitialized,
        }
    }

    /// Restore the session from the durable record.
    ///
    /// Anything other than a well-formed record with `isAuthenticated = true` and a
    /// user, including unreadable or malformed data, yields [`SessionState::Anonymous`].
    pub fn initialize(&mut self) -> &SessionState {
        self.state = SessionState::Loading;

        let stored = match self.records.read(AUTH_RECORD_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "auth record unreadable, starting anonymous");
                None
            }
        };

        self.state = match stored.map(|raw| serde_json::from_str::<AuthRecord>(&raw)) {
            Some(Ok(AuthRecord {
                user: Some(user),
                is_authenticated: true,
                ..
            })) => SessionState::Authenticated(user),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "auth record malformed, starting anonymous");
                SessionState::Anonymous
            }
            _ => SessionState::Anonymous,
        };
        &self.state
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            SessionState::Uninitialized | SessionState::Loading
        )
    }

    pub fn snapshot(&self) -> AuthRecord {
        AuthRecord {
            user: self.current_user().cloned(),
            is_authenticated: self.is_authenticated(),
            is_loading: self.is_loading(),
        }
    }

    pub fn login(&mut self, user: User) -> Result<(), SessionError> {
        self.state = SessionState::Authenticated(user);
        self.persist()
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Anonymous;
        self.records.remove(AUTH_RECORD_KEY)?;
        Ok(())
    }

    /// Replace the held user after a profile edit, without re-fetching it.
    pub fn update_user(&mut self, user: User) -> Result<(), SessionError> {
        self.state = SessionState::Authenticated(user);
        self.persist()
    }

    fn persist(&self) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(&self.snapshot())?;
        self.records.write(AUTH_RECORD_KEY, &encoded)?;
        tracing::debug!(key = AUTH_RECORD_KEY, "auth record persisted");
        Ok(())
    }
}
