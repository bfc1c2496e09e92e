// # Sync State Store Trait
//
// Defines the interface for the durable last-synced-IP cache.
//
// ## Purpose
//
// The store holds a single value: the last public IP the engine confirmed
// to be correctly published in DNS. It exists purely to short-circuit
// reconciliation passes — the source of truth is always the live DNS
// record and the live public IP.
//
// ## Failure model
//
// Both operations absorb their own failures:
// - `load()` reports any read error as "absent" (and logs it); the engine
//   then performs a full check, which is safe
// - `save()` is best-effort; a lost write only means the next pass redoes
//   the comparison work, which is idempotent
//
// Implementations log their own faults so the engine never has to care.
//
// ## Implementations
//
// - File-based: [`crate::state::FileSyncStateStore`]
// - In-memory: [`crate::state::MemorySyncStateStore`]

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for sync-state store implementations
///
/// Implementations must be thread-safe and usable across async tasks,
/// although the engine only ever drives one pass at a time.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Load the last synced IP
    ///
    /// # Returns
    ///
    /// - `Some(IpAddr)`: The stored value
    /// - `None`: Never written, or unreadable (the error is logged by the
    ///   implementation, not propagated)
    async fn load(&self) -> Option<IpAddr>;

    /// Overwrite the stored value
    ///
    /// Best-effort: write errors are logged by the implementation and not
    /// propagated.
    async fn save(&self, ip: IpAddr);
}
