//! State backend trait and error types

use std::collections::HashMap;

use async_trait::async_trait;
use prism_core::resource::Value;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

/// Errors that can occur when interacting with a state backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The state is locked by another process
    #[error("State is locked by {who} (lock ID: {lock_id}, operation: {operation})")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Lock ID mismatch: expected {expected}, got {actual}")]
    LockMismatch { expected: String, actual: String },

    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// State file is corrupted or invalid
    #[error("Invalid state file: {0}")]
    InvalidState(String),

    /// The stored state belongs to a different lineage
    #[error("State lineage mismatch: expected {expected}, got {actual}")]
    LineageMismatch { expected: String, actual: String },

    /// The stored state is newer than the one being written
    #[error("Stale state: stored serial {stored} is not older than {writing}")]
    StaleSerial { stored: u64, writing: u64 },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    /// Create a Locked error from a LockInfo
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Storage for the state file plus an advisory lock
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current state
    ///
    /// Returns `None` if no state exists yet
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Write the state
    ///
    /// The caller increments the serial first. Writing over a state of another
    /// lineage or with a serial that is not newer fails.
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Acquire a lock for the given operation
    ///
    /// Fails while an unexpired lock is held by someone else
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    /// Release a previously acquired lock
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Remove a lock by ID regardless of who holds it
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;
}

/// Configuration for a state backend, read from the `backend` block of the
/// configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Backend type; only "local" is supported
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, Value>,
}

impl BackendConfig {
    /// Local backend writing to `path`
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::from([("path".to_string(), Value::String(path.into()))]),
        }
    }

    /// Parse `{ "type": "...", ...attributes }`
    pub fn from_json(value: &serde_json::Value) -> BackendResult<Self> {
        let mut attributes = prism_core::resource::attributes_from_json(value);
        let backend_type = match attributes.remove("type") {
            Some(Value::String(backend_type)) => backend_type,
            Some(_) => return Err(BackendError::configuration("backend type must be a string")),
            None => return Err(BackendError::configuration("backend type is required")),
        };
        Ok(Self {
            backend_type,
            attributes,
        })
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockInfo;

    #[test]
    fn test_backend_error_locked() {
        let lock = LockInfo::new("apply");
        let error = BackendError::locked(&lock);

        match error {
            BackendError::Locked {
                lock_id,
                who,
                operation,
            } => {
                assert_eq!(lock_id, lock.id);
                assert_eq!(who, lock.who);
                assert_eq!(operation, "apply");
            }
            _ => panic!("Expected Locked error"),
        }
    }

    #[test]
    fn test_backend_error_display() {
        let error = BackendError::unsupported_backend("s3");
        assert_eq!(error.to_string(), "Unsupported backend type: s3");

        let error = BackendError::StaleSerial {
            stored: 4,
            writing: 3,
        };
        assert_eq!(
            error.to_string(),
            "Stale state: stored serial 4 is not older than 3"
        );
    }

    #[test]
    fn test_backend_config_from_json() {
        let config = BackendConfig::from_json(&serde_json::json!({
            "type": "local",
            "path": "infra/prism.state.json"
        }))
        .unwrap();
        assert_eq!(config, BackendConfig::local("infra/prism.state.json"));
        assert_eq!(config.get_string("path"), Some("infra/prism.state.json"));
    }

    #[test]
    fn test_backend_config_requires_type() {
        let err = BackendConfig::from_json(&serde_json::json!({"path": "x"})).unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }
}
