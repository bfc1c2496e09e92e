//! Core reconciliation engine
//!
//! The ReconciliationEngine is responsible for:
//! - Fetching the current public IP via PublicIpProvider
//! - Short-circuiting against the cached last-synced IP
//! - Verifying and correcting the live DNS record via DnsProvider
//! - Persisting the sync state after verified-consistent outcomes
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Scheduler     │──── tick ────┐
//! └──────────────────┘              │
//!                                   ▼
//!                       ┌──────────────────────┐
//!                       │ ReconciliationEngine │
//!                       └──────────────────────┘
//!                                   │
//!         ┌─────────────────────────┼─────────────────────────┐
//!         │                         │                         │
//!         ▼                         ▼                         ▼
//! ┌────────────────┐      ┌────────────────┐       ┌────────────────┐
//! │PublicIpProvider│      │  DnsProvider   │       │ SyncStateStore │
//! │ (fetch)        │      │ (read/update)  │       │ (cache)        │
//! └────────────────┘      └────────────────┘       └────────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Fetch the current public IP (soft failure: log and return)
//! 2. If it equals the cached last-synced IP, return — no DNS API call.
//!    This bounds provider traffic to one lookup sequence per actual IP
//!    change, plus one after every cold start
//! 3. Validate configuration
//! 4. Resolve the zone, then the record (NotFound aborts the pass)
//! 5. If the live record already matches, persist the sync state; otherwise
//!    update the record and persist only on success
//!
//! A pass never raises to the caller: every external call is fault-isolated
//! at its boundary, logged with context, and aborts the current pass leaving
//! state untouched. The next tick retries the whole sequence.

use crate::config::ReconciliationConfig;
use crate::traits::{DnsProvider, PublicIpProvider, RecordType, SyncStateStore};
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// A unit of periodically repeatable work driven by [`crate::Scheduler`]
///
/// The scheduler is generic over this trait so it can be exercised with
/// lightweight fakes; [`ReconciliationEngine`] is the production impl.
#[async_trait]
pub trait Reconciler: Send {
    /// Execute one pass. Must absorb its own failures.
    async fn reconcile(&mut self);
}

/// Core reconciliation engine
///
/// Executes exactly one reconciliation attempt per [`reconcile`] call.
/// The cached last-synced IP is an explicit field owned by the engine,
/// loaded once at construction and updated only through the single persist
/// path — there is no hidden global state.
///
/// ## Invariant
///
/// `last_synced`, when set, equals the DNS record's content at the time it
/// was last written: the engine never persists an IP it has not just
/// confirmed to be live in DNS.
///
/// [`reconcile`]: ReconciliationEngine::reconcile
pub struct ReconciliationEngine {
    /// Source of the current externally visible address
    ip_provider: Box<dyn PublicIpProvider>,

    /// DNS provider for zone/record lookup and update
    dns_provider: Box<dyn DnsProvider>,

    /// Durable cache of the last IP confirmed live in DNS
    state_store: Box<dyn SyncStateStore>,

    /// Resolved configuration, immutable for the process lifetime
    config: ReconciliationConfig,

    /// Last IP confirmed to be correctly published in DNS
    last_synced: Option<IpAddr>,
}

impl ReconciliationEngine {
    /// Create a new engine, loading the cached sync state from the store
    ///
    /// An absent or unreadable state simply means the first pass performs
    /// the full DNS check.
    pub async fn new(
        ip_provider: Box<dyn PublicIpProvider>,
        dns_provider: Box<dyn DnsProvider>,
        state_store: Box<dyn SyncStateStore>,
        config: ReconciliationConfig,
    ) -> Self {
        let last_synced = state_store.load().await;
        match last_synced {
            Some(ip) => info!(%ip, "loaded last synced IP"),
            None => info!("no last synced IP on record, first pass will perform a full check"),
        }

        Self {
            ip_provider,
            dns_provider,
            state_store,
            config,
            last_synced,
        }
    }

    /// The last IP confirmed live in DNS, if any (status surface)
    pub fn last_synced(&self) -> Option<IpAddr> {
        self.last_synced
    }

    /// Execute one reconciliation pass
    ///
    /// Never returns an error: failures are logged and abort the current
    /// pass, leaving the sync state untouched for the next tick to retry.
    pub async fn reconcile(&mut self) {
        debug!("starting reconciliation pass");

        let current_ip = match self.ip_provider.current_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    source = self.ip_provider.source_name(),
                    error = %e,
                    "could not determine public IP, skipping pass"
                );
                return;
            }
        };
        debug!(%current_ip, "current public IP");

        if self.last_synced == Some(current_ip) {
            debug!(%current_ip, "public IP matches last synced IP, no DNS check needed");
            return;
        }

        info!(
            %current_ip,
            last_synced = ?self.last_synced,
            "public IP differs from last synced IP, checking DNS"
        );

        if let Err(e) = self.config.validate() {
            error!(error = %e, "configuration incomplete, aborting pass");
            return;
        }

        let zone = match self.dns_provider.find_zone(&self.config.zone_name).await {
            Ok(Some(zone)) => zone,
            Ok(None) => {
                error!(zone = %self.config.zone_name, "zone not found");
                return;
            }
            Err(e) => {
                error!(zone = %self.config.zone_name, error = %e, "zone lookup failed");
                return;
            }
        };
        debug!(zone = %zone.name, zone_id = %zone.id, "found zone");

        let record = match self
            .dns_provider
            .find_record(&zone.id, &self.config.record_name, RecordType::A)
            .await
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!(record = %self.config.record_name, "DNS record not found");
                return;
            }
            Err(e) => {
                error!(record = %self.config.record_name, error = %e, "record lookup failed");
                return;
            }
        };
        debug!(record = %record.name, content = %record.content, "found DNS record");

        if record.content == current_ip {
            // DNS already reflects reality (state file lost or stale);
            // comparing first avoids a redundant write.
            info!(
                %current_ip,
                "DNS record already current, updating last synced IP"
            );
            self.persist(current_ip).await;
            return;
        }

        info!(
            record = %record.name,
            dns_content = %record.content,
            %current_ip,
            "IP has changed, updating DNS record"
        );

        match self.dns_provider.update_record(&record, current_ip).await {
            Ok(()) => {
                info!(record = %record.name, %current_ip, "DNS record updated");
                self.persist(current_ip).await;
            }
            Err(e) => {
                // State untouched: the next tick sees the same mismatch and
                // retries the whole sequence.
                error!(record = %record.name, error = %e, "DNS update failed, will retry next tick");
            }
        }
    }

    /// Persist a verified-consistent IP to the store and the in-memory cache
    ///
    /// The single write path for the sync state.
    async fn persist(&mut self, ip: IpAddr) {
        self.state_store.save(ip).await;
        self.last_synced = Some(ip);
    }
}

#[async_trait]
impl Reconciler for ReconciliationEngine {
    async fn reconcile(&mut self) {
        ReconciliationEngine::reconcile(self).await;
    }
}
