//! Local file backend for state storage
//!
//! State lives in a JSON file (default: prism.state.json) next to a `.lock`
//! file holding the current [`LockInfo`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "prism.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    /// Create a LocalBackend from the `path` attribute of the configuration
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        if let Some(value) = config.attributes.get("path")
            && value.as_str().is_none()
        {
            return Err(BackendError::configuration("path must be a string"));
        }
        let path = config
            .get_string("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STATE_FILE));

        Ok(Self::with_path(path))
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        let content = match tokio::fs::read_to_string(&self.lock_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read lock file: {}", e))),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))
    }

    async fn remove_lock(&self) -> BackendResult<()> {
        tokio::fs::remove_file(&self.lock_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }

    /// Create the lock file, failing if one already exists
    async fn create_lock(&self, lock: &LockInfo) -> BackendResult<bool> {
        let content = serde_json::to_string_pretty(lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .await;
        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(BackendError::Io(format!("Failed to create lock file: {}", e))),
        };
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;
        Ok(true)
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read state file: {}", e))),
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(stored) = self.read_state().await? {
            if stored.lineage != state.lineage {
                return Err(BackendError::LineageMismatch {
                    expected: stored.lineage,
                    actual: state.lineage.clone(),
                });
            }
            if stored.serial >= state.serial {
                return Err(BackendError::StaleSerial {
                    stored: stored.serial,
                    writing: state.serial,
                });
            }
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        // Write next to the target and rename so readers never see a partial file
        let tmp_path = self.state_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        tokio::fs::rename(&tmp_path, &self.state_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;

        log::debug!(
            "Wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        let lock = LockInfo::new(operation);
        if self.create_lock(&lock).await? {
            return Ok(lock);
        }

        // An unparsable lock file may still be being written by its owner, so
        // read errors count as held
        if let Some(existing) = self.read_lock().await? {
            if !existing.is_expired() {
                return Err(BackendError::locked(&existing));
            }
            log::warn!("Replacing expired lock {} held by {}", existing.id, existing.who);

            // Remove only the lock that was seen expired
            match self.read_lock().await? {
                Some(current) if current.id == existing.id => match self.remove_lock().await {
                    Ok(()) => {}
                    Err(BackendError::Io(_)) if !self.lock_path.exists() => {}
                    Err(e) => return Err(e),
                },
                Some(current) => return Err(BackendError::locked(&current)),
                None => {}
            }
        }

        if self.create_lock(&lock).await? {
            Ok(lock)
        } else {
            match self.read_lock().await? {
                Some(existing) => Err(BackendError::locked(&existing)),
                None => Err(BackendError::Io(
                    "Lock file changed while acquiring lock".to_string(),
                )),
            }
        }
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        if !self.lock_path.exists() {
            return Err(BackendError::LockNotFound(lock_id.to_string()));
        }

        // An unreadable lock file is removed regardless
        if let Ok(Some(existing)) = self.read_lock().await
            && existing.id != lock_id
        {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceState;
    use tempfile::tempdir;

    fn backend_in(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::with_path(dir.path().join("test.state.json"))
    }

    #[tokio::test]
    async fn test_local_backend_read_write() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        assert!(backend.read_state().await.unwrap().is_none());

        let mut state_file = StateFile::new();
        state_file.upsert_resource(ResourceState::new(
            "quicksight.template",
            "monthly",
            "quicksight",
        ));
        state_file.increment_serial();
        backend.write_state(&state_file).await.unwrap();

        let read_state = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read_state, state_file);
        assert!(!dir.path().join("test.state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_rejects_other_lineage() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let mut first = StateFile::with_lineage("a");
        first.increment_serial();
        backend.write_state(&first).await.unwrap();

        let mut other = StateFile::with_lineage("b");
        other.serial = 10;
        let result = backend.write_state(&other).await;
        assert!(matches!(
            result,
            Err(BackendError::LineageMismatch { expected, actual })
                if expected == "a" && actual == "b"
        ));
    }

    #[tokio::test]
    async fn test_write_rejects_stale_serial() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let mut state = StateFile::new();
        state.increment_serial();
        backend.write_state(&state).await.unwrap();

        let result = backend.write_state(&state).await;
        assert!(matches!(
            result,
            Err(BackendError::StaleSerial {
                stored: 1,
                writing: 1
            })
        ));

        state.increment_serial();
        backend.write_state(&state).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_state_file() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);
        std::fs::write(backend.state_path(), "not json").unwrap();

        let result = backend.read_state().await;
        assert!(matches!(result, Err(BackendError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_local_backend_locking() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let lock = backend.acquire_lock("apply").await.unwrap();
        assert_eq!(lock.operation, "apply");

        let second = backend.acquire_lock("apply").await;
        assert!(matches!(second, Err(BackendError::Locked { .. })));

        backend.release_lock(&lock).await.unwrap();

        let lock2 = backend.acquire_lock("apply").await.unwrap();
        backend.release_lock(&lock2).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_lock_is_replaced() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let stale = LockInfo::with_timeout("apply", -10);
        assert!(backend.create_lock(&stale).await.unwrap());

        let lock = backend.acquire_lock("apply").await.unwrap();
        assert_ne!(lock.id, stale.id);
        assert_eq!(backend.read_lock().await.unwrap(), Some(lock));
    }

    #[tokio::test]
    async fn test_unreadable_lock_is_held() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);
        std::fs::write(&backend.lock_path, "{\"id\": ").unwrap();

        let result = backend.acquire_lock("apply").await;
        assert!(matches!(result, Err(BackendError::InvalidState(_))));
        assert!(backend.lock_path.exists());

        backend.force_unlock("any").await.unwrap();
        assert!(backend.acquire_lock("apply").await.is_ok());
    }

    #[tokio::test]
    async fn test_live_lock_is_not_replaced() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let held = LockInfo::with_timeout("apply", 60);
        assert!(backend.create_lock(&held).await.unwrap());

        let result = backend.acquire_lock("apply").await;
        assert!(matches!(
            result,
            Err(BackendError::Locked { lock_id, .. }) if lock_id == held.id
        ));
        assert_eq!(backend.read_lock().await.unwrap(), Some(held));
    }

    #[tokio::test]
    async fn test_release_lock_mismatch() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let _lock = backend.acquire_lock("apply").await.unwrap();
        let other = LockInfo::new("apply");

        let result = backend.release_lock(&other).await;
        assert!(matches!(result, Err(BackendError::LockMismatch { .. })));
    }

    #[tokio::test]
    async fn test_release_missing_lock() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let result = backend.release_lock(&LockInfo::new("apply")).await;
        assert!(matches!(result, Err(BackendError::LockNotFound(_))));
    }

    #[tokio::test]
    async fn test_force_unlock() {
        let dir = tempdir().unwrap();
        let backend = backend_in(&dir);

        let lock = backend.acquire_lock("apply").await.unwrap();

        let wrong = backend.force_unlock("not-the-id").await;
        assert!(matches!(wrong, Err(BackendError::LockMismatch { .. })));

        backend.force_unlock(&lock.id).await.unwrap();
        assert!(backend.acquire_lock("apply").await.is_ok());
    }

    #[test]
    fn test_from_config() {
        let backend = LocalBackend::from_config(&BackendConfig::local("custom.json")).unwrap();
        assert_eq!(backend.state_path(), Path::new("custom.json"));
        assert_eq!(backend.lock_path, PathBuf::from("custom.lock"));

        let backend = LocalBackend::from_config(&BackendConfig::default()).unwrap();
        assert_eq!(
            backend.state_path(),
            Path::new(LocalBackend::DEFAULT_STATE_FILE)
        );
    }
}
