use async_trait::async_trait;
use mockall::automock;
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use tracing::trace;

pub mod geolocation;
pub mod rpc;

/// Transport level reachability check of a node p2p endpoint.
#[automock]
#[async_trait]
pub trait Prober {
	/// Returns `true` if connection to the `host:port` address is established within the timeout.
	async fn probe(&self, address: &str, timeout: Duration) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
	async fn probe(&self, address: &str, duration: Duration) -> bool {
		match timeout(duration, TcpStream::connect(address)).await {
			Ok(Ok(_)) => true,
			Ok(Err(error)) => {
				trace!(address, "Connection failed: {error}");
				false
			},
			Err(_) => {
				trace!(address, "Connection timed out after {duration:?}");
				false
			},
		}
	}
}
