//! Core traits for the dnspin system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PublicIpProvider`]: Fetch the current externally visible IP address
//! - [`DnsProvider`]: Look up and update one DNS record via a provider API
//! - [`SyncStateStore`]: Durable cache of the last IP confirmed live in DNS

pub mod dns_provider;
pub mod public_ip;
pub mod state_store;

pub use dns_provider::{DnsProvider, DnsRecordSnapshot, RecordType, Zone};
pub use public_ip::PublicIpProvider;
pub use state_store::SyncStateStore;
