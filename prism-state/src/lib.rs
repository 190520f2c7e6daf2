//! Prism State Management
//!
//! Records which QuickSight resources Prism manages, the provider-side
//! identifier of each one and the attributes last read back from the service.
//!
//! # Overview
//!
//! - **StateFile**: The state document holding every managed resource
//! - **StateBackend**: A trait for state storage backends
//! - **LockInfo**: Information about state locks for concurrent access control
//!
//! # Example
//!
//! ```ignore
//! use prism_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("prism.state.json")).await?;
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... apply changes, upsert/remove resources ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
