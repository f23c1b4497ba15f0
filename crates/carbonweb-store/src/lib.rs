//! Registry persistence backends
//!
//! The registry works on an in-memory data set and snapshots it through a
//! [`StoreBackend`]. Snapshots travel as `serde_json::Value` so the backend
//! stays agnostic of the domain types that produce them.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod error;

pub use error::StoreError;

/// Backend reference type
pub type StoreRef = Arc<dyn StoreBackend>;

/// Trait for registry persistence backends
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Load the last saved snapshot
    async fn load(&self) -> Result<serde_json::Value, StoreError>;

    /// Save a snapshot, replacing any previous one
    async fn save(&self, snapshot: &serde_json::Value) -> Result<(), StoreError>;

    /// Whether a snapshot exists to load
    async fn exists(&self) -> bool;

    /// Human-readable backend location for logs
    fn location(&self) -> String;
}

/// JSON file backend
///
/// Stores the snapshot as pretty-printed JSON at a fixed path, creating the
/// parent directory on first save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl StoreBackend for JsonFileStore {
    async fn load(&self) -> Result<serde_json::Value, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound { location: self.location() }
            } else {
                StoreError::Io(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|e| StoreError::InvalidSnapshot {
            location: self.location(),
            message: e.to_string(),
        })
    }

    async fn save(&self, snapshot: &serde_json::Value) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(StoreError::Io)?;
        }

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::InvalidSnapshot {
                location: self.location(),
                message: e.to_string(),
            })?;

        tokio::fs::write(&self.path, content).await.map_err(StoreError::Io)?;
        log::debug!(target: "carbonweb::store", "Snapshot written to {}", self.location());
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.path.exists()
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// In-memory backend, used by tests and ephemeral deployments
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn load(&self) -> Result<serde_json::Value, StoreError> {
        self.snapshot
            .lock()
            .await
            .clone()
            .ok_or_else(|| StoreError::NotFound { location: self.location() })
    }

    async fn save(&self, snapshot: &serde_json::Value) -> Result<(), StoreError> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.snapshot.lock().await.is_some()
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

// ==================== Tests ====================
