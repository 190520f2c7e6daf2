//! Lock information for state backend locking

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lock timeout in seconds (15 minutes)
pub const DEFAULT_LOCK_TIMEOUT_SECS: i64 = 900;

/// Information about a state lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    /// The operation being performed (e.g., "apply")
    pub operation: String,
    /// username@hostname
    pub who: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_timeout(operation, DEFAULT_LOCK_TIMEOUT_SECS)
    }

    pub fn with_timeout(operation: impl Into<String>, timeout_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            who: lock_owner(),
            created: now,
            expires: now + Duration::seconds(timeout_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires
    }

    pub fn time_remaining(&self) -> Duration {
        self.expires - Utc::now()
    }
}

fn lock_owner() -> String {
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{}@{}", username, hostname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_info_new() {
        let lock = LockInfo::new("apply");
        assert_eq!(lock.operation, "apply");
        assert!(!lock.id.is_empty());
        assert!(lock.who.contains('@'));
        assert!(!lock.is_expired());
    }

    #[test]
    fn test_expired_lock() {
        let lock = LockInfo::with_timeout("apply", -1);
        assert!(lock.is_expired());
        assert!(lock.time_remaining().num_seconds() <= 0);
    }

    #[test]
    fn test_lock_info_serialization() {
        let lock = LockInfo::with_timeout("plan", 60);
        let json = serde_json::to_string(&lock).unwrap();
        let deserialized: LockInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, lock);
    }
}
