//! Helpers for RPC and p2p addresses of Tendermint nodes.
//!
//! Crawl addresses use the `http://<host>:<rpc port>` form, liveness probes
//! target `<host>:<p2p port>`.

use color_eyre::{eyre::eyre, Result};
use reqwest::Url;

/// Default Tendermint RPC port
pub const DEFAULT_RPC_PORT: u16 = 26657;
/// Default Tendermint p2p port
pub const DEFAULT_P2P_PORT: u16 = 26656;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcAddress {
	/// Host without IPv6 brackets
	pub host: String,
	pub port: Option<u16>,
}

impl RpcAddress {
	pub fn parse(address: &str) -> Result<Self> {
		let url = Url::parse(address).map_err(|error| eyre!("Invalid address {address}: {error}"))?;
		let host = url
			.host_str()
			.filter(|host| !host.is_empty())
			.ok_or_else(|| eyre!("Address {address} has no host"))?
			.trim_start_matches('[')
			.trim_end_matches(']')
			.to_string();
		Ok(RpcAddress {
			host,
			port: url.port(),
		})
	}

	/// Peer layer address of the node, used for liveness probing.
	pub fn p2p_address(&self, p2p_port: u16) -> String {
		socket_address(&self.host, p2p_port)
	}

	pub fn rpc_port(&self) -> String {
		self.port.map(|port| port.to_string()).unwrap_or_default()
	}
}

fn socket_address(host: &str, port: u16) -> String {
	if host.contains(':') {
		format!("[{host}]:{port}")
	} else {
		format!("{host}:{port}")
	}
}

/// Extracts port from addresses like `tcp://0.0.0.0:26657` or `0.0.0.0:26657`.
pub fn parse_port(address: &str) -> Option<u16> {
	if let Some(port) = Url::parse(address).ok().and_then(|url| url.port()) {
		return Some(port);
	}
	let (_, port) = address.rsplit_once(':')?;
	port.trim_end_matches('/').parse().ok()
}

/// Crawl address of a peer, built from its remote IP and the port of its advertised RPC address.
pub fn peer_rpc_address(remote_ip: &str, advertised_rpc_address: &str) -> String {
	let port = parse_port(advertised_rpc_address).unwrap_or(DEFAULT_RPC_PORT);
	format!("http://{}", socket_address(remote_ip, port))
}
