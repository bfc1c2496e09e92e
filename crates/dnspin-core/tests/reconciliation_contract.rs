//! Contract tests for the reconciliation pass
//!
//! These verify the decision logic that bounds DNS API traffic and the
//! failure handling that keeps the sync state honest:
//! - A pass never touches the DNS API when the cached IP matches reality
//! - The sync state is written only after a verified-consistent DNS outcome
//! - Any failure aborts the pass with state untouched; the next pass retries
//!
//! If these fail, the agent either hammers the provider API or caches an IP
//! it never confirmed.

mod common;

use common::*;
use dnspin_core::ReconciliationEngine;
use dnspin_core::traits::RecordType;

async fn engine_with(
    ip_provider: StaticIpProvider,
    dns: &MockDnsProvider,
    store: &MockStateStore,
) -> ReconciliationEngine {
    ReconciliationEngine::new(
        Box::new(ip_provider),
        Box::new(dns.clone()),
        Box::new(store.clone()),
        test_config(),
    )
    .await
}

#[tokio::test]
async fn matching_cached_ip_short_circuits_without_dns_calls() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("1.2.3.4")));

    let ip_provider = StaticIpProvider::new(ip("1.2.3.4"));
    let mut engine = engine_with(ip_provider.clone(), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(ip_provider.call_count(), 1, "the public IP is still observed");
    assert_eq!(dns.total_calls(), 0, "no DNS API call on the no-op path");
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
    assert_eq!(store.save_calls(), 0, "state not rewritten on no-op");
}

#[tokio::test]
async fn cold_start_always_checks_the_live_record() {
    // Absent state must never short-circuit, whatever the fetched IP is
    let store = MockStateStore::new();
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("1.2.3.4")));

    let mut engine = engine_with(StaticIpProvider::new(ip("1.2.3.4")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.find_zone_calls(), 1);
    assert_eq!(dns.find_record_calls(), 1);
    assert_eq!(dns.update_calls(), 0, "record already correct, no update");
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn converges_without_update_when_dns_already_matches() {
    // State file was stale; live DNS already has the new address
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("5.6.7.8")));

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.update_calls(), 0);
    assert_eq!(store.value(), Some(ip("5.6.7.8")));
    assert_eq!(engine.last_synced(), Some(ip("5.6.7.8")));
}

#[tokio::test]
async fn drift_triggers_exactly_one_update_with_fields_carried_over() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("9.9.9.9")));

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.update_calls(), 1);
    let updates = dns.updates();
    let (snapshot, new_content) = &updates[0];
    assert_eq!(*new_content, ip("5.6.7.8"));

    // Everything but the content comes from the snapshot, unchanged
    assert_eq!(snapshot.id, "rec-1");
    assert_eq!(snapshot.zone_id, "zone-1");
    assert_eq!(snapshot.name, "home.example.com");
    assert_eq!(snapshot.record_type, RecordType::A);
    assert_eq!(snapshot.ttl, 300);
    assert!(!snapshot.proxied);

    assert_eq!(store.value(), Some(ip("5.6.7.8")));
}

#[tokio::test]
async fn failed_update_leaves_state_untouched() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("9.9.9.9")));
    dns.set_fail_updates(true);

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.update_calls(), 1);
    assert_eq!(store.value(), Some(ip("1.2.3.4")), "pre-pass value survives");
    assert_eq!(store.save_calls(), 0);
    assert_eq!(engine.last_synced(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn next_pass_retries_the_whole_sequence_after_a_failed_update() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("9.9.9.9")));
    dns.set_fail_updates(true);

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;
    assert_eq!(store.value(), Some(ip("1.2.3.4")));

    // The fault clears; the same mismatch is detected and corrected
    dns.set_fail_updates(false);
    engine.reconcile().await;

    assert_eq!(dns.find_zone_calls(), 2, "full sequence re-ran");
    assert_eq!(dns.update_calls(), 2);
    assert_eq!(store.value(), Some(ip("5.6.7.8")));
}

#[tokio::test]
async fn failed_ip_lookup_skips_the_pass() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("9.9.9.9")));

    let mut engine = ReconciliationEngine::new(
        Box::new(FailingIpProvider),
        Box::new(dns.clone()),
        Box::new(store.clone()),
        test_config(),
    )
    .await;
    engine.reconcile().await;

    assert_eq!(dns.total_calls(), 0);
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn missing_zone_aborts_the_pass() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new(); // no zone configured

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.find_zone_calls(), 1);
    assert_eq!(dns.find_record_calls(), 0, "no record lookup without a zone");
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn missing_record_aborts_the_pass() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new().with_zone(test_zone()); // zone but no record

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.find_record_calls(), 1);
    assert_eq!(dns.update_calls(), 0);
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn incomplete_config_aborts_before_any_dns_call() {
    let store = MockStateStore::with_value(ip("1.2.3.4"));
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("9.9.9.9")));

    let mut config = test_config();
    config.api_token.clear();

    let mut engine = ReconciliationEngine::new(
        Box::new(StaticIpProvider::new(ip("5.6.7.8"))),
        Box::new(dns.clone()),
        Box::new(store.clone()),
        config,
    )
    .await;
    engine.reconcile().await;

    assert_eq!(dns.total_calls(), 0);
    assert_eq!(store.value(), Some(ip("1.2.3.4")));
}

#[tokio::test]
async fn lost_saves_only_weaken_the_short_circuit() {
    // A store that drops writes simulates a persistence fault: after a
    // restart the agent redoes the DNS comparison, which is safe, and it
    // never invents state it did not confirm.
    let store = MockStateStore::new().dropping_saves();
    let dns = MockDnsProvider::new()
        .with_zone(test_zone())
        .with_record(test_record(ip("5.6.7.8")));

    let mut engine = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    engine.reconcile().await;

    assert_eq!(dns.update_calls(), 0);
    assert_eq!(store.save_calls(), 1);
    assert_eq!(store.value(), None, "save was dropped");
    // Within the process the engine still short-circuits on its own cache
    assert_eq!(engine.last_synced(), Some(ip("5.6.7.8")));
    engine.reconcile().await;
    assert_eq!(dns.find_zone_calls(), 1, "second in-process pass short-circuits");

    // A restart reloads from the (empty) store and redoes the full check
    let mut restarted = engine_with(StaticIpProvider::new(ip("5.6.7.8")), &dns, &store).await;
    restarted.reconcile().await;
    assert_eq!(dns.find_zone_calls(), 2);
    assert_eq!(dns.update_calls(), 0, "still nothing to correct");
}
