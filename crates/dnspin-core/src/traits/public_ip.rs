// # Public IP Provider Trait
//
// Defines the interface for obtaining the machine's externally visible
// IP address.
//
// ## Implementations
//
// - HTTP echo services (api.ipify.org and friends): `dnspin-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dnspin_core::PublicIpProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* PublicIpProvider implementation */;
//     let ip = source.current_ip().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public-IP lookup implementations
///
/// One call per reconciliation pass; the engine does not cache the result
/// beyond the pass. Implementations must be thread-safe and usable across
/// async tasks.
///
/// Implementations are single-shot observers:
/// - Apply a bounded request timeout so a hung lookup cannot stall the loop
/// - Return only IPv4 addresses (the engine manages "A" records)
/// - Return an error instead of retrying; the next pass retries naturally
#[async_trait]
pub trait PublicIpProvider: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The externally visible address
    /// - `Err(Error)`: If the address could not be determined; the engine
    ///   logs this as a soft failure and retries on the next tick
    async fn current_ip(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
