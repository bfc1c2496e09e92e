// # File Sync State Store
//
// File-backed implementation of SyncStateStore.
//
// ## Purpose
//
// Persists the last synced IP across daemon restarts so the first pass
// after a restart can still short-circuit when nothing has changed.
//
// ## Durability model
//
// - Atomic writes: new state goes to a temporary file, then rename
// - Corruption handling: an unreadable or unparseable file is logged and
//   treated as absent — the agent cold-starts and re-verifies against DNS,
//   which is safe and costs exactly one extra provider lookup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "last_synced_ip": "203.0.113.7",
//   "last_synced_at": "2026-08-06T12:00:00Z"
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::SyncStateStore;

/// State file format version
/// Used for future migration if format changes
const STATE_FILE_VERSION: &str = "1.0";

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    last_synced_ip: Option<IpAddr>,
    last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// File-backed sync state store
///
/// Holds a single optional IP address in a small versioned JSON document.
/// All read and write faults are absorbed and logged here, per the
/// [`SyncStateStore`] contract: a fault only ever degrades the
/// short-circuit optimization, never correctness.
///
/// # Example
///
/// ```rust,no_run
/// use dnspin_core::state::FileSyncStateStore;
/// use dnspin_core::traits::SyncStateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSyncStateStore::new("/var/lib/dnspin/state.json").await?;
///
///     store.save("203.0.113.7".parse()?).await;
///     assert_eq!(store.load().await, Some("203.0.113.7".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSyncStateStore {
    path: PathBuf,
}

impl FileSyncStateStore {
    /// Create a store backed by the given path
    ///
    /// Creates parent directories if needed. The file itself is created on
    /// the first `save`.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Read and parse the state file
    async fn read_state(&self) -> Result<Option<StateFileFormat>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::state_store(format!(
                "failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let state: StateFileFormat = serde_json::from_str(&content).map_err(|e| {
            Error::state_store(format!(
                "failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if state.version != STATE_FILE_VERSION {
            tracing::warn!(
                expected = STATE_FILE_VERSION,
                got = %state.version,
                "state file version mismatch, loading anyway"
            );
        }

        Ok(Some(state))
    }

    /// Write state to file atomically (write-temp-then-rename)
    async fn write_state(&self, ip: IpAddr) -> Result<(), Error> {
        let state = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            last_synced_ip: Some(ip),
            last_synced_at: Some(chrono::Utc::now()),
        };

        let json = serde_json::to_string_pretty(&state)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), "sync state written");
        Ok(())
    }

    /// Path of the temporary file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl SyncStateStore for FileSyncStateStore {
    async fn load(&self) -> Option<IpAddr> {
        match self.read_state().await {
            Ok(Some(state)) => state.last_synced_ip,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "state file not found");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load sync state, treating as absent");
                None
            }
        }
    }

    async fn save(&self, ip: IpAddr) {
        match self.write_state(ip).await {
            Ok(()) => tracing::debug!(%ip, "saved last synced IP"),
            Err(e) => {
                // Best-effort: the next pass redoes the comparison work.
                tracing::warn!(%ip, error = %e, "failed to save sync state");
            }
        }
    }
}
