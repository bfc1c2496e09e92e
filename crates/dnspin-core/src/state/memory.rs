// # Memory Sync State Store
//
// In-memory implementation of SyncStateStore.
//
// ## Crash Behavior
//
// The value is lost on restart: the first pass after a restart performs
// the full DNS check, which is safe. Useful for tests and container
// deployments where that one extra lookup is acceptable.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::traits::SyncStateStore;

/// In-memory sync state store
///
/// # Example
///
/// ```rust,no_run
/// use dnspin_core::state::MemorySyncStateStore;
/// use dnspin_core::traits::SyncStateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySyncStateStore::new();
///     store.save("203.0.113.7".parse()?).await;
///     assert_eq!(store.load().await, Some("203.0.113.7".parse()?));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySyncStateStore {
    inner: Arc<Mutex<Option<IpAddr>>>,
}

impl MemorySyncStateStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the stored value
    pub async fn clear(&self) {
        *self.inner.lock().await = None;
    }
}

#[async_trait]
impl SyncStateStore for MemorySyncStateStore {
    async fn load(&self) -> Option<IpAddr> {
        *self.inner.lock().await
    }

    async fn save(&self, ip: IpAddr) {
        *self.inner.lock().await = Some(ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty_and_stores_last_value() {
        let store = MemorySyncStateStore::new();
        assert_eq!(store.load().await, None);

        store.save("203.0.113.7".parse().unwrap()).await;
        store.save("198.51.100.2".parse().unwrap()).await;
        assert_eq!(store.load().await, Some("198.51.100.2".parse().unwrap()));

        store.clear().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemorySyncStateStore::new();
        let view = store.clone();

        store.save("203.0.113.7".parse().unwrap()).await;
        assert_eq!(view.load().await, Some("203.0.113.7".parse().unwrap()));
    }
}
