// # dnspind - dnspin daemon
//
// Thin integration layer for the dnspin dynamic DNS agent:
// 1. Reads configuration from environment variables
// 2. Initializes the runtime and logging
// 3. Wires the public-IP source, DNS provider and state store into the
//    reconciliation engine
// 4. Runs the scheduler until SIGTERM/SIGINT, then stops gracefully
//
// All reconciliation logic lives in dnspin-core; this binary contains no
// DNS or retry logic of its own.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `DNSPIN_API_TOKEN`: DNS provider API token (required)
// - `DNSPIN_ZONE_NAME`: Zone the record lives in (required)
// - `DNSPIN_RECORD_NAME`: Fully qualified record name (required)
// - `DNSPIN_POLL_INTERVAL_SECS`: Seconds between passes (default 300)
// - `DNSPIN_STATE_STORE_TYPE`: State store type, file or memory (default file)
// - `DNSPIN_STATE_PATH`: Path to the state file (required for file store)
// - `DNSPIN_IP_URL`: Single IP echo endpoint overriding the default list
// - `DNSPIN_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `DNSPIN_MODE`: "dry-run" to log intended DNS updates without sending them
//
// ## Example
//
// ```bash
// export DNSPIN_API_TOKEN=your_token
// export DNSPIN_ZONE_NAME=example.com
// export DNSPIN_RECORD_NAME=home.example.com
// export DNSPIN_STATE_PATH=/var/lib/dnspin/state.json
//
// dnspind
// ```

use anyhow::Result;
use dnspin_core::{ReconciliationConfig, ReconciliationEngine, Scheduler};
use dnspin_core::{DnsProvider, PublicIpProvider, SyncStateStore};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DnspinExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnspinExitCode> for ExitCode {
    fn from(code: DnspinExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_token: String,
    zone_name: String,
    record_name: String,
    poll_interval_secs: u64,
    state_store_type: String,
    state_path: Option<String>,
    ip_url: Option<String>,
    log_level: String,
    dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            api_token: env::var("DNSPIN_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("DNSPIN_API_TOKEN is required"))?,
            zone_name: env::var("DNSPIN_ZONE_NAME")
                .map_err(|_| anyhow::anyhow!("DNSPIN_ZONE_NAME is required"))?,
            record_name: env::var("DNSPIN_RECORD_NAME")
                .map_err(|_| anyhow::anyhow!("DNSPIN_RECORD_NAME is required"))?,
            poll_interval_secs: env::var("DNSPIN_POLL_INTERVAL_SECS")
                .ok()
                .map(|s| s.parse().unwrap_or(300))
                .unwrap_or(300),
            state_store_type: env::var("DNSPIN_STATE_STORE_TYPE")
                .unwrap_or_else(|_| "file".to_string()),
            state_path: env::var("DNSPIN_STATE_PATH").ok(),
            ip_url: env::var("DNSPIN_IP_URL").ok(),
            log_level: env::var("DNSPIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dry_run: env::var("DNSPIN_MODE")
                .map(|m| m.to_lowercase() == "dry-run")
                .unwrap_or(false),
        })
    }

    /// Validate the configuration
    ///
    /// Checks required field presence, value formats (API token, domain
    /// names), numeric ranges and type enumerations before anything
    /// touches the network.
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "DNSPIN_API_TOKEN is required. \
                Set it via: export DNSPIN_API_TOKEN=your_token"
            );
        }

        // Cloudflare API tokens are typically 40 characters; other
        // providers vary, so only a lower bound is enforced.
        if self.api_token.len() < 20 {
            anyhow::bail!(
                "DNSPIN_API_TOKEN appears too short ({} chars). \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DNSPIN_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        validate_domain_name(&self.zone_name)
            .map_err(|e| anyhow::anyhow!("DNSPIN_ZONE_NAME: {e}"))?;
        validate_domain_name(&self.record_name)
            .map_err(|e| anyhow::anyhow!("DNSPIN_RECORD_NAME: {e}"))?;

        // The record must live inside the zone
        if self.record_name != self.zone_name
            && !self.record_name.ends_with(&format!(".{}", self.zone_name))
        {
            anyhow::bail!(
                "DNSPIN_RECORD_NAME '{}' is not within zone '{}'",
                self.record_name,
                self.zone_name
            );
        }

        if !(10..=86400).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "DNSPIN_POLL_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        match self.state_store_type.as_str() {
            "file" => {
                match &self.state_path {
                    Some(path) if !path.is_empty() => {}
                    _ => anyhow::bail!(
                        "DNSPIN_STATE_PATH is required when DNSPIN_STATE_STORE_TYPE=file. \
                        Set it via: export DNSPIN_STATE_PATH=/var/lib/dnspin/state.json"
                    ),
                }
            }
            "memory" => {}
            other => anyhow::bail!(
                "DNSPIN_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        }

        if let Some(url) = &self.ip_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("DNSPIN_IP_URL must use HTTP or HTTPS scheme. Got: {}", url);
            }
            if url.starts_with("http://") {
                eprintln!(
                    "WARNING: DNSPIN_IP_URL uses HTTP (not HTTPS). \
                    This is less secure. Consider using HTTPS."
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "DNSPIN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic DNS domain name validation per RFC 1035; not comprehensive but
/// catches common errors before the first API call.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!("domain name too long: {} chars (max 253)", domain.len());
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("domain name has empty label: '{domain}'");
        }

        if label.len() > 63 {
            anyhow::bail!(
                "domain label too long: {} chars (max 63). Label: '{label}'",
                label.len()
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "domain label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric and hyphen only."
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!("domain label cannot start or end with hyphen. Label: '{label}'");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DnspinExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return DnspinExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DnspinExitCode::ConfigError.into();
    }

    info!("starting dnspind daemon");
    info!(
        zone = %config.zone_name,
        record = %config.record_name,
        poll_interval_secs = config.poll_interval_secs,
        "configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DnspinExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("daemon error: {e}");
            DnspinExitCode::RuntimeError
        } else {
            DnspinExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the public-IP source
#[cfg(feature = "http")]
fn build_ip_provider(config: &Config) -> Result<Box<dyn PublicIpProvider>> {
    let provider = match &config.ip_url {
        Some(url) => dnspin_ip_http::HttpIpProvider::with_endpoints(vec![url.clone()])?,
        None => dnspin_ip_http::HttpIpProvider::new()?,
    };
    Ok(Box::new(provider))
}

#[cfg(not(feature = "http"))]
fn build_ip_provider(_config: &Config) -> Result<Box<dyn PublicIpProvider>> {
    anyhow::bail!("dnspind was built without an IP source; enable the 'http' feature")
}

/// Build the DNS provider
#[cfg(feature = "cloudflare")]
fn build_dns_provider(config: &Config) -> Result<Box<dyn DnsProvider>> {
    if config.dry_run {
        warn!("running in DRY-RUN mode - no DNS changes will be made");
    }
    let provider =
        dnspin_provider_cloudflare::CloudflareProvider::new(&config.api_token, config.dry_run)?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "cloudflare"))]
fn build_dns_provider(_config: &Config) -> Result<Box<dyn DnsProvider>> {
    anyhow::bail!("dnspind was built without a DNS provider; enable the 'cloudflare' feature")
}

/// Build the sync-state store
async fn build_state_store(config: &Config) -> Result<Box<dyn SyncStateStore>> {
    match config.state_store_type.as_str() {
        "file" => {
            let path = config
                .state_path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("DNSPIN_STATE_PATH is required"))?;
            Ok(Box::new(
                dnspin_core::FileSyncStateStore::new(path).await?,
            ))
        }
        "memory" => Ok(Box::new(dnspin_core::MemorySyncStateStore::new())),
        other => anyhow::bail!("unsupported state store type: {other}"),
    }
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let ip_provider = build_ip_provider(&config)?;
    let dns_provider = build_dns_provider(&config)?;
    let state_store = build_state_store(&config).await?;

    info!(
        ip_source = ip_provider.source_name(),
        dns_provider = dns_provider.provider_name(),
        state_store = %config.state_store_type,
        "components initialized"
    );

    let recon_config = ReconciliationConfig::new(
        &config.api_token,
        &config.zone_name,
        &config.record_name,
    )
    .with_poll_interval_secs(config.poll_interval_secs);
    let poll_interval = recon_config.poll_interval();

    let engine =
        ReconciliationEngine::new(ip_provider, dns_provider, state_store, recon_config).await;

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let scheduler_task = tokio::spawn(Scheduler::new(engine, poll_interval).run(stop_rx));

    let signal_name = wait_for_shutdown().await?;
    info!(signal = %signal_name, "received shutdown signal, stopping after the current pass");
    stop_tx.send(true).ok();

    let engine = scheduler_task
        .await
        .map_err(|e| anyhow::anyhow!("scheduler task failed: {e}"))?;

    match engine.last_synced() {
        Some(ip) => info!(last_synced_ip = %ip, "daemon stopped"),
        None => info!("daemon stopped"),
    }

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// The name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGTERM handler: {e}"))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGINT handler: {e}"))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to wait for CTRL-C: {e}"))?;
    Ok("SIGINT")
}
