//! JSON snapshot storage for the call group registry.
//!
//! One document per server instance, rewritten in full after every mutation.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write can never leave a truncated snapshot behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beacon_domain::CallGroupRegistry;

use super::ports::{ClockPort, GroupStorePort, StoreError};

/// Current snapshot document version.
const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope around the registry.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    registry: CallGroupRegistry,
}

/// File-backed registry store.
pub struct JsonFileGroupStore {
    path: PathBuf,
    clock: Arc<dyn ClockPort>,
}

impl JsonFileGroupStore {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl GroupStorePort for JsonFileGroupStore {
    async fn load(&self) -> Result<Option<CallGroupRegistry>, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let snapshot: Snapshot =
            serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.version));
        }

        tracing::debug!(path = %self.path.display(), "Loaded call group snapshot");
        Ok(Some(snapshot.registry))
    }

    async fn save(&self, registry: &CallGroupRegistry) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: self.clock.now(),
            registry: registry.clone(),
        };
        let data = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        // Write-temp-then-rename keeps the previous snapshot intact until the
        // new one is fully on disk.
        let temp = self.temp_path();
        tokio::fs::write(&temp, data)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Saved call group snapshot");
        Ok(())
    }
}
