// # DNS Provider Trait
//
// Defines the interface for resolving a zone, reading one address record
// within it, and rewriting that record's content.
//
// ## Implementations
//
// - Cloudflare: `dnspin-provider-cloudflare` crate
// - Future: Route53, DigitalOcean, GoDaddy, etc.
//
// ## Shape
//
// The engine drives three calls per updating pass:
//
// ```text
// find_zone(zone_name)                  -> Zone        (or NotFound)
// find_record(zone_id, name, type)      -> snapshot    (or NotFound)
// update_record(&snapshot, new_content) -> ()          (content only)
// ```
//
// "Not found" is `Ok(None)` — a distinct outcome from `Err`, which means
// the transport or the API itself failed.
//
// ## Trust level
//
// Providers are isolated, stateless, single-shot API adapters:
// - ✅ Perform HTTPS calls to their endpoints only
// - ✅ Parse provider-specific responses into the neutral types below
// - ❌ NO retry or backoff logic (the scheduler's fixed interval is the policy)
// - ❌ NO caching across calls (the sync state is owned by `SyncStateStore`)
// - ❌ NO spawned tasks (would break deterministic shutdown)
// - ❌ NO decisions about whether an update is needed (engine-owned)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A DNS provider's administrative grouping of records for a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone name (e.g., "example.com")
    pub name: String,
}

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::invalid_input(format!(
                "unknown record type: {other}"
            ))),
        }
    }
}

/// One address record as read from the provider at a point in time
///
/// Read-only within a reconciliation pass: an update call replaces the
/// record's content and carries every other field over unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordSnapshot {
    /// Provider-assigned record identifier
    pub id: String,
    /// Identifier of the owning zone
    pub zone_id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Address the record currently resolves to
    pub content: IpAddr,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Whether the record is proxied through the provider's edge
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # First match wins
///
/// Provider APIs may return several zones or records for one name filter.
/// Implementations take the first match, mirroring the behavior this agent
/// has always had; they never infer stricter uniqueness semantics.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone by name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Zone))`: The (first) matching zone
    /// - `Ok(None)`: No zone with that name is visible to the credentials
    /// - `Err(Error)`: Transport or API failure
    async fn find_zone(&self, zone_name: &str) -> Result<Option<Zone>, crate::Error>;

    /// Resolve an address record by zone, name, and type
    ///
    /// # Returns
    ///
    /// - `Ok(Some(DnsRecordSnapshot))`: The (first) matching record
    /// - `Ok(None)`: The zone holds no such record
    /// - `Err(Error)`: Transport or API failure
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<DnsRecordSnapshot>, crate::Error>;

    /// Rewrite a record's content, carrying all other fields over unchanged
    ///
    /// # Idempotency
    ///
    /// Submitting the content the record already has must be safe; the
    /// engine avoids the call in that case but does not rely on it.
    ///
    /// # Parameters
    ///
    /// - `record`: The snapshot read earlier in the same pass
    /// - `new_content`: The address to publish
    async fn update_record(
        &self,
        record: &DnsRecordSnapshot,
        new_content: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
