use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::Session;

pub const STORAGE_KEY: &str = "financial_warrior_progress";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait SnapshotStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&self, raw: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, raw: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot().clone())
    }

    fn write(&self, raw: &str) -> Result<(), StoreError> {
        *self.slot() = Some(raw.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

pub fn encode_snapshot(session: &Session) -> Result<String, StoreError> {
    Ok(serde_json::to_string(session)?)
}

pub fn decode_snapshot(raw: &str) -> Result<Session, StoreError> {
    let mut session: Session = serde_json::from_str(raw)?;
    session.normalize();
    Ok(session)
}

pub fn load_session(store: &dyn SnapshotStore) -> Session {
    let raw = match store.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return Session::default(),
        Err(e) => {
            warn!("could not read saved progress, starting fresh: {e}");
            return Session::default();
        }
    };

    match decode_snapshot(&raw) {
        Ok(session) => {
            debug!(
                step = session.current_step(),
                power = session.power_level(),
                "restored saved progress"
            );
            session
        }
        Err(e) => {
            warn!("saved progress is unreadable, starting fresh: {e}");
            Session::default()
        }
    }
}

// Writes the session snapshot. Failures are logged and otherwise ignored.
pub fn save_session(store: &dyn SnapshotStore, session: &Session) {
    let result = encode_snapshot(session).and_then(|raw| store.write(&raw));
    if let Err(e) = result {
        warn!("could not save progress: {e}");
    }
}
