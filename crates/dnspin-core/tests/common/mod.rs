//! Test doubles and common utilities for the reconciliation contract tests
//!
//! The doubles count calls and share their state across clones so a test
//! can hand ownership to the engine and still observe what happened.

use async_trait::async_trait;
use dnspin_core::config::ReconciliationConfig;
use dnspin_core::error::Result;
use dnspin_core::traits::{
    DnsProvider, DnsRecordSnapshot, PublicIpProvider, RecordType, SyncStateStore, Zone,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A public-IP source that always returns the same address
#[derive(Clone)]
pub struct StaticIpProvider {
    ip: IpAddr,
    calls: Arc<AtomicUsize>,
}

impl StaticIpProvider {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublicIpProvider for StaticIpProvider {
    async fn current_ip(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A public-IP source whose every lookup fails
pub struct FailingIpProvider;

#[async_trait]
impl PublicIpProvider for FailingIpProvider {
    async fn current_ip(&self) -> Result<IpAddr> {
        Err(dnspin_core::Error::public_ip("lookup unavailable"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

struct MockDnsInner {
    zone: Mutex<Option<Zone>>,
    record: Mutex<Option<DnsRecordSnapshot>>,
    fail_updates: AtomicBool,
    find_zone_calls: AtomicUsize,
    find_record_calls: AtomicUsize,
    update_calls: AtomicUsize,
    updates: Mutex<Vec<(DnsRecordSnapshot, IpAddr)>>,
}

/// A DNS provider double with a scriptable zone/record and call counters
///
/// Successful updates are applied to the held record, so consecutive
/// passes observe the same drift a live zone would show.
#[derive(Clone)]
pub struct MockDnsProvider {
    inner: Arc<MockDnsInner>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockDnsInner {
                zone: Mutex::new(None),
                record: Mutex::new(None),
                fail_updates: AtomicBool::new(false),
                find_zone_calls: AtomicUsize::new(0),
                find_record_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
                updates: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_zone(self, zone: Zone) -> Self {
        *self.inner.zone.lock().unwrap() = Some(zone);
        self
    }

    pub fn with_record(self, record: DnsRecordSnapshot) -> Self {
        *self.inner.record.lock().unwrap() = Some(record);
        self
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.inner.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn find_zone_calls(&self) -> usize {
        self.inner.find_zone_calls.load(Ordering::SeqCst)
    }

    pub fn find_record_calls(&self) -> usize {
        self.inner.find_record_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.inner.update_calls.load(Ordering::SeqCst)
    }

    /// Snapshot/content pairs submitted to update_record
    pub fn updates(&self) -> Vec<(DnsRecordSnapshot, IpAddr)> {
        self.inner.updates.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.find_zone_calls() + self.find_record_calls() + self.update_calls()
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn find_zone(&self, zone_name: &str) -> Result<Option<Zone>> {
        self.inner.find_zone_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .inner
            .zone
            .lock()
            .unwrap()
            .as_ref()
            .filter(|z| z.name == zone_name)
            .cloned())
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<DnsRecordSnapshot>> {
        self.inner.find_record_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .inner
            .record
            .lock()
            .unwrap()
            .as_ref()
            .filter(|r| {
                r.zone_id == zone_id && r.name == record_name && r.record_type == record_type
            })
            .cloned())
    }

    async fn update_record(&self, record: &DnsRecordSnapshot, new_content: IpAddr) -> Result<()> {
        self.inner.update_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .updates
            .lock()
            .unwrap()
            .push((record.clone(), new_content));

        if self.inner.fail_updates.load(Ordering::SeqCst) {
            return Err(dnspin_core::Error::provider("mock", "update rejected"));
        }

        if let Some(held) = self.inner.record.lock().unwrap().as_mut()
            && held.id == record.id
        {
            held.content = new_content;
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A sync-state store double with a call counter and an optional
/// drop-all-saves mode (simulating persistence faults)
#[derive(Clone)]
pub struct MockStateStore {
    value: Arc<Mutex<Option<IpAddr>>>,
    save_calls: Arc<AtomicUsize>,
    drop_saves: Arc<AtomicBool>,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
            save_calls: Arc::new(AtomicUsize::new(0)),
            drop_saves: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_value(ip: IpAddr) -> Self {
        let store = Self::new();
        *store.value.lock().unwrap() = Some(ip);
        store
    }

    /// Silently discard all subsequent saves
    pub fn dropping_saves(self) -> Self {
        self.drop_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn value(&self) -> Option<IpAddr> {
        *self.value.lock().unwrap()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncStateStore for MockStateStore {
    async fn load(&self) -> Option<IpAddr> {
        *self.value.lock().unwrap()
    }

    async fn save(&self, ip: IpAddr) {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if !self.drop_saves.load(Ordering::SeqCst) {
            *self.value.lock().unwrap() = Some(ip);
        }
    }
}

/// Zone fixture matching [`test_config`]
pub fn test_zone() -> Zone {
    Zone {
        id: "zone-1".to_string(),
        name: "example.com".to_string(),
    }
}

/// Record fixture inside [`test_zone`] with the given content
pub fn test_record(content: IpAddr) -> DnsRecordSnapshot {
    DnsRecordSnapshot {
        id: "rec-1".to_string(),
        zone_id: "zone-1".to_string(),
        name: "home.example.com".to_string(),
        record_type: RecordType::A,
        content,
        ttl: 300,
        proxied: false,
    }
}

/// Helper to create a minimal ReconciliationConfig for testing
pub fn test_config() -> ReconciliationConfig {
    ReconciliationConfig::new("test-token", "example.com", "home.example.com")
        .with_poll_interval_secs(1)
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test IP")
}
