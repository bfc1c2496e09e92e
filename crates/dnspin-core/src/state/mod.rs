// # Sync State Store Implementations
//
// This module provides implementations of the SyncStateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileSyncStateStore;
pub use memory::MemorySyncStateStore;
