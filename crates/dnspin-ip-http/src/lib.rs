// # HTTP Public IP Source
//
// Fetches the machine's externally visible address from plain-text IP echo
// services over HTTPS.
//
// ## Failover
//
// Endpoints are tried in order until one yields a parseable IPv4 address.
// A single endpoint can be configured explicitly; the default list covers
// three independent services so one outage does not blind the agent.
//
// ## Constraints
//
// - One fetch per reconciliation pass, no caching (the engine owns the
//   sync state)
// - 10-second request timeout per endpoint
// - IPv6 answers are rejected: the agent manages "A" records

use async_trait::async_trait;
use dnspin_core::traits::PublicIpProvider;
use dnspin_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Request timeout per endpoint
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IP echo services, tried in order
pub const DEFAULT_IP_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",  // returns plain text IP
    "https://ifconfig.me/ip", // no rate limit documented
    "https://icanhazip.com",  // no rate limit documented
];

/// HTTP echo-service public IP source
pub struct HttpIpProvider {
    /// Endpoints to try, in order
    endpoints: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpProvider {
    /// Create a provider using the default endpoint list
    pub fn new() -> Result<Self> {
        Self::with_endpoints(DEFAULT_IP_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    /// Create a provider with an explicit endpoint list
    pub fn with_endpoints(endpoints: Vec<String>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::config("IP endpoint list cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoints, client })
    }

    /// Fetch and parse the address from one endpoint
    async fn fetch_from(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::public_ip(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::public_ip(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::public_ip(format!("failed to read response from {url}: {e}")))?;

        parse_ip(body.trim())
    }
}

/// Parse an echo-service response body into an IPv4 address
fn parse_ip(text: &str) -> Result<IpAddr> {
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::public_ip(format!("invalid IP address in response: {text:?}")))?;

    // A-record management: a v6 answer means the service saw us over the
    // wrong address family.
    if ip.is_ipv6() {
        return Err(Error::public_ip(format!("expected IPv4, got {ip}")));
    }

    Ok(ip)
}

#[async_trait]
impl PublicIpProvider for HttpIpProvider {
    async fn current_ip(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.endpoints {
            match self.fetch_from(url).await {
                Ok(ip) => {
                    tracing::debug!(%ip, endpoint = %url, "fetched public IP");
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!(endpoint = %url, error = %e, "IP endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::public_ip("no IP endpoints configured")))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_ipv4() {
        assert_eq!(
            parse_ip("203.0.113.7").unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn rejects_garbage_and_ipv6() {
        assert!(parse_ip("").is_err());
        assert!(parse_ip("<html>hi</html>").is_err());
        assert!(parse_ip("2001:db8::1").is_err());
    }

    #[test]
    fn empty_endpoint_list_is_rejected() {
        assert!(HttpIpProvider::with_endpoints(Vec::new()).is_err());
        assert!(HttpIpProvider::new().is_ok());
    }

    #[test]
    fn default_endpoints_are_https() {
        for url in DEFAULT_IP_ENDPOINTS {
            assert!(url.starts_with("https://"), "{url} must use HTTPS");
        }
    }
}
