// # Cloudflare DNS Provider
//
// Cloudflare API v4 implementation of the dnspin `DnsProvider` trait.
//
// ## Behavior
//
// - Zone and record lookups are name-filtered list calls; the first match
//   wins when the API returns several rows
// - `update_record` PUTs the full record body, carrying type, name, ttl and
//   proxied over from the snapshot and replacing only the content
// - Fixed 60-second HTTP timeout so a hung call cannot stall the agent
// - Specific error mapping for 401/403, 429 and 5xx responses
// - NO retry, backoff or caching — the reconciliation loop's fixed interval
//   is the retry policy
// - Dry-run mode: perform the GETs, log the intended PUT, skip the write
//
// ## Security
//
// - The API token never appears in logs
// - The Debug implementation redacts the token
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dnspin_core::traits::{DnsProvider, DnsRecordSnapshot, RecordType, Zone};
use dnspin_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Cloudflare API envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordRow {
    id: String,
    zone_id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    ttl: u32,
    #[serde(default)]
    proxied: bool,
}

/// PUT body for a record update
#[derive(Debug, Serialize)]
struct UpdateRecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}

/// Cloudflare DNS provider
///
/// Stateless, single-shot API adapter: one lookup or update per call, all
/// coordination owned by the reconciliation engine.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            client,
            dry_run,
        })
    }

    /// Create a provider in live mode
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, false)
    }

    /// Create a provider in dry-run mode
    ///
    /// In dry-run mode the provider performs all lookups but logs intended
    /// updates instead of sending them.
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, true)
    }

    /// Perform a GET and decode the Cloudflare envelope
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        let response = Self::check_status(response, context).await?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("failed to parse response: {e}")))?;

        Self::unwrap_envelope(envelope, context)
    }

    /// Map failure status codes to specific errors
    async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());

        Err(match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "invalid API token or insufficient permissions ({context}), status {status}"
            )),
            429 => Error::rate_limited(format!("{context}, status {status}")),
            500..=599 => Error::provider(
                "cloudflare",
                format!("server error (transient) during {context}: {status} - {body}"),
            ),
            _ => Error::provider("cloudflare", format!("{context} failed: {status} - {body}")),
        })
    }

    /// Reject `success: false` envelopes that arrived with a 2xx status
    fn unwrap_envelope<T>(envelope: ApiResponse<T>, context: &str) -> Result<T> {
        if !envelope.success {
            let detail = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::provider(
                "cloudflare",
                format!("{context} reported failure: {detail}"),
            ));
        }
        envelope.result.ok_or_else(|| {
            Error::provider("cloudflare", format!("{context}: response has no result"))
        })
    }

    /// Convert an API record row into the neutral snapshot type
    fn snapshot_from_row(row: RecordRow) -> Result<DnsRecordSnapshot> {
        let record_type: RecordType = row.record_type.parse()?;
        let content: IpAddr = row.content.parse().map_err(|e| {
            Error::provider(
                "cloudflare",
                format!("record {} has non-address content: {e}", row.name),
            )
        })?;

        Ok(DnsRecordSnapshot {
            id: row.id,
            zone_id: row.zone_id,
            name: row.name,
            record_type,
            content,
            ttl: row.ttl,
            proxied: row.proxied,
        })
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Resolve a zone by name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_zone(&self, zone_name: &str) -> Result<Option<Zone>> {
        tracing::debug!(zone = %zone_name, "looking up zone");

        let url = format!("{CLOUDFLARE_API_BASE}/zones?name={zone_name}");
        let rows: Vec<ZoneRow> = self.get_json(&url, "zone lookup").await?;

        // First match wins when the filter returns several rows.
        Ok(rows.into_iter().next().map(|row| {
            tracing::debug!(zone = %row.name, zone_id = %row.id, "found zone");
            Zone {
                id: row.id,
                name: row.name,
            }
        }))
    }

    /// Resolve an address record by zone, name, and type
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<DnsRecordSnapshot>> {
        tracing::debug!(record = %record_name, %record_type, "looking up record");

        let url = format!(
            "{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records?name={record_name}&type={}",
            record_type.as_str()
        );
        let rows: Vec<RecordRow> = self.get_json(&url, "record lookup").await?;

        match rows.into_iter().next() {
            Some(row) => {
                let snapshot = Self::snapshot_from_row(row)?;
                tracing::debug!(
                    record = %snapshot.name,
                    record_id = %snapshot.id,
                    content = %snapshot.content,
                    "found record"
                );
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Rewrite a record's content, carrying all other fields over unchanged
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "ttl": 300, "proxied": false }
    /// ```
    async fn update_record(&self, record: &DnsRecordSnapshot, new_content: IpAddr) -> Result<()> {
        let body = UpdateRecordBody {
            record_type: record.record_type.as_str(),
            name: &record.name,
            content: new_content.to_string(),
            ttl: record.ttl,
            proxied: record.proxied,
        };

        let url = format!(
            "{CLOUDFLARE_API_BASE}/zones/{}/dns_records/{}",
            record.zone_id, record.id
        );

        if self.dry_run {
            tracing::info!(
                record = %record.name,
                %new_content,
                payload = %serde_json::to_string(&body).unwrap_or_default(),
                "[DRY-RUN] would send PUT, skipping update"
            );
            return Ok(());
        }

        tracing::info!(
            record = %record.name,
            previous = %record.content,
            %new_content,
            "updating Cloudflare DNS record"
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        let response = Self::check_status(response, "record update").await?;

        let envelope: ApiResponse<RecordRow> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("failed to parse response: {e}")))?;
        Self::unwrap_envelope(envelope, "record update")?;

        tracing::info!(record = %record.name, %new_content, "DNS record updated");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
