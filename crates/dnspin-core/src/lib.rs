// # dnspin-core
//
// Core library for the dnspin dynamic DNS agent.
//
// ## Architecture Overview
//
// This library provides the reconciliation core that keeps one DNS "A"
// record pointed at the machine's current public IP:
// - **PublicIpProvider**: Trait for fetching the externally visible address
// - **DnsProvider**: Trait for looking up and updating one record via a provider API
// - **SyncStateStore**: Trait for the durable last-synced-IP cache
// - **ReconciliationEngine**: One verify-and-correct pass per invocation
// - **Scheduler**: Drives passes on a fixed interval with cooperative shutdown
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine knows nothing about any concrete
//    provider SDK, HTTP client, or process supervisor
// 2. **Failure Tolerance**: A pass absorbs and logs every error; only an
//    explicit stop request ends the loop
// 3. **Bounded API traffic**: The cached last-synced IP short-circuits a pass
//    before any remote DNS call when nothing has changed
// 4. **Library-First**: All core functionality is usable (and testable with
//    fakes) without the daemon

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::ReconciliationConfig;
pub use engine::{ReconciliationEngine, Reconciler};
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use state::{FileSyncStateStore, MemorySyncStateStore};
pub use traits::{DnsProvider, PublicIpProvider, SyncStateStore};
