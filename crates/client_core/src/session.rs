//! Process-wide authentication state and its persistence.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::domain::UserProfile;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Announced to the UI layer whenever the session changes hands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user: Option<UserProfile> },
    SignedOut,
    /// The server rejected the current token; the UI should return to sign-in.
    Expired,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore;

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        Ok(None)
    }

    fn save(&self, _record: &SessionRecord) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// Keeps the session as JSON on disk so it outlives a single console invocation.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file '{}'", self.path.display()))?;
        let record: SessionRecord = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt session file '{}'", self.path.display()))?;
        Ok(Some(record).filter(|record| !record.token.is_empty()))
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create session directory '{}'", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file '{}'", self.path.display()))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove session file '{}'", self.path.display())
            }),
        }
    }
}

/// The in-memory copy is authoritative; store failures are logged and do not
/// block sign-in or sign-out.
pub struct Session {
    current: RwLock<Option<SessionRecord>>,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let current = match store.load() {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable persisted session");
                None
            }
        };
        Self {
            current: RwLock::new(current),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore))
    }

    pub fn get_token(&self) -> Option<String> {
        self.read().as_ref().map(|record| record.token.clone())
    }

    pub fn get_user(&self) -> Option<UserProfile> {
        self.read().as_ref().and_then(|record| record.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn set_session(&self, token: impl Into<String>, user: Option<UserProfile>) {
        let record = SessionRecord {
            token: token.into(),
            user,
        };
        if let Err(err) = self.store.save(&record) {
            warn!(error = %err, "failed to persist session");
        }
        *self.write() = Some(record);
        debug!("session established");
    }

    /// Returns whether there was a session to clear.
    pub fn clear_session(&self) -> bool {
        let previous = self.write().take();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        previous.is_some()
    }

    /// Clears the session only if it still holds `token`, so a 401 for a
    /// request sent before a fresh sign-in cannot destroy the new session.
    pub(crate) fn invalidate_if_current(&self, token: &str) -> bool {
        let mut guard = self.write();
        let is_current = guard
            .as_ref()
            .is_some_and(|record| record.token == token);
        if !is_current {
            return false;
        }
        *guard = None;
        drop(guard);
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        true
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<SessionRecord>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<SessionRecord>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
