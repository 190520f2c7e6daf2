//! State backend implementations

mod local;

pub use local::LocalBackend;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};

/// Create a backend from configuration
pub async fn create_backend(config: &BackendConfig) -> BackendResult<Box<dyn StateBackend>> {
    match config.backend_type.as_str() {
        "local" => Ok(Box::new(LocalBackend::from_config(config)?)),
        other => Err(BackendError::unsupported_backend(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_unsupported_backend() {
        let config = BackendConfig {
            backend_type: "s3".to_string(),
            ..Default::default()
        };
        let result = create_backend(&config).await;
        assert!(matches!(result, Err(BackendError::UnsupportedBackend(t)) if t == "s3"));
    }

    #[tokio::test]
    async fn test_create_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let backend = create_backend(&BackendConfig::local(path.to_string_lossy()))
            .await
            .unwrap();
        assert!(backend.read_state().await.unwrap().is_none());
    }
}
