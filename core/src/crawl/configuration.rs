use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

use super::address::DEFAULT_P2P_PORT;
use crate::types::{duration_millis_format, duration_seconds_format};

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct CrawlConfig {
	/// RPC addresses of nodes to start crawling from, e.g. `http://10.0.0.1:26657` (required).
	pub seeds: Vec<String>,
	/// Maximum number of addresses kept for reseeding the crawl (default: 100).
	pub reseed_size: usize,
	/// Pause in seconds between exhausting the crawl pool and reseeding it (default: 15).
	#[serde(with = "duration_seconds_format")]
	pub crawl_interval: Duration,
	/// Interval in seconds after which known nodes are due for recheck (default: 3600).
	/// Currently accepted, but not used by the crawl loop.
	#[serde(with = "duration_seconds_format")]
	pub recheck_interval: Duration,
	/// Port of the p2p endpoint used for liveness probing (default: 26656).
	pub p2p_port: u16,
	/// Liveness probe timeout in milliseconds (default: 1000).
	#[serde(with = "duration_millis_format")]
	pub probe_timeout: Duration,
	/// Node RPC query timeout in milliseconds (default: 2000).
	#[serde(with = "duration_millis_format")]
	pub rpc_timeout: Duration,
	/// Seed of the random source used for picking nodes. Random if not set.
	pub rng_seed: Option<u64>,
}

impl Default for CrawlConfig {
	fn default() -> Self {
		Self {
			seeds: vec![],
			reseed_size: 100,
			crawl_interval: Duration::from_secs(15),
			recheck_interval: Duration::from_secs(3600),
			p2p_port: DEFAULT_P2P_PORT,
			probe_timeout: Duration::from_millis(1000),
			rpc_timeout: Duration::from_millis(2000),
			rng_seed: None,
		}
	}
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
	/// ipstack service endpoint (default: http://api.ipstack.com).
	pub ipstack_endpoint: String,
	/// ipstack access key (required).
	pub ipstack_key: String,
	/// Geolocation lookup timeout in milliseconds (default: 5000).
	#[serde(with = "duration_millis_format")]
	pub geolocation_timeout: Duration,
}

impl Default for GeolocationConfig {
	fn default() -> Self {
		Self {
			ipstack_endpoint: crate::network::geolocation::IPSTACK_ENDPOINT.to_string(),
			ipstack_key: String::new(),
			geolocation_timeout: Duration::from_millis(5000),
		}
	}
}

// access key is redacted so configuration can be logged
impl fmt::Debug for GeolocationConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let ipstack_key = if self.ipstack_key.is_empty() {
			""
		} else {
			"<redacted>"
		};
		f.debug_struct("GeolocationConfig")
			.field("ipstack_endpoint", &self.ipstack_endpoint)
			.field("ipstack_key", &ipstack_key)
			.field("geolocation_timeout", &self.geolocation_timeout)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::GeolocationConfig;

	#[test]
	fn debug_output_redacts_access_key() {
		let config = GeolocationConfig {
			ipstack_key: "s3cr3t-access-key".to_string(),
			..Default::default()
		};

		let output = format!("{config:?}");
		assert!(!output.contains("s3cr3t-access-key"));
		assert!(output.contains("<redacted>"));
		assert!(output.contains("http://api.ipstack.com"));
	}
}
