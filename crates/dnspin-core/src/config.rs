//! Configuration types for the dnspin system
//!
//! The engine receives a fully resolved [`ReconciliationConfig`]; how it is
//! read (environment variables, flags) is the daemon's concern. The config
//! is immutable for the process lifetime — there is no dynamic reload.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved configuration for the reconciliation loop
///
/// `validate()` is cheap and is re-run by the engine on every pass: an
/// incomplete configuration aborts the pass with a logged error and recurs
/// each tick until fixed externally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// DNS provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Zone the managed record lives in (e.g., "example.com")
    pub zone_name: String,

    /// Fully qualified record name (e.g., "home.example.com")
    pub record_name: String,

    /// Seconds between reconciliation passes
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ReconciliationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationConfig")
            .field("api_token", &"<REDACTED>")
            .field("zone_name", &self.zone_name)
            .field("record_name", &self.record_name)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

impl ReconciliationConfig {
    /// Create a configuration with the default poll interval
    pub fn new(
        api_token: impl Into<String>,
        zone_name: impl Into<String>,
        record_name: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            zone_name: zone_name.into(),
            record_name: record_name.into(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    /// Set the poll interval in seconds
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        if self.zone_name.is_empty() {
            return Err(crate::Error::config("zone name cannot be empty"));
        }
        if self.record_name.is_empty() {
            return Err(crate::Error::config("record name cannot be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("poll interval must be > 0"));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_poll_interval_secs() -> u64 {
    300
}
