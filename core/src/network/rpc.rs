//! Tendermint RPC queries used for node discovery.
//!
//! Responses are decoded into fixed structures once, at this boundary.

use async_trait::async_trait;
use color_eyre::Result;
use mockall::automock;
use serde::Deserialize;

mod client;
pub use client::HttpClient;

#[automock]
#[async_trait]
pub trait NodeClient {
	/// Queries node identity and version over `/status`.
	async fn status(&self, rpc_address: &str) -> Result<Status>;

	/// Queries node peers over `/net_info`.
	async fn net_info(&self, rpc_address: &str) -> Result<NetInfo>;
}

#[derive(Deserialize, Debug)]
pub struct RpcError {
	pub code: i64,
	pub message: String,
	#[serde(default)]
	pub data: Option<String>,
}

/// JSON-RPC response envelope.
#[derive(Deserialize, Debug)]
pub struct RpcResponse<T> {
	pub result: Option<T>,
	pub error: Option<RpcError>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NodeInfoOther {
	pub tx_index: String,
	pub rpc_address: String,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NodeInfo {
	pub id: String,
	pub listen_addr: String,
	pub network: String,
	pub version: String,
	pub moniker: String,
	pub other: NodeInfoOther,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Status {
	pub node_info: NodeInfo,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Peer {
	pub node_info: NodeInfo,
	pub remote_ip: String,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NetInfo {
	#[serde(default)]
	pub peers: Vec<Peer>,
}

#[cfg(test)]
mod tests {
	use super::*;

	const STATUS: &str = r#"{
		"jsonrpc": "2.0",
		"id": -1,
		"result": {
			"node_info": {
				"protocol_version": { "p2p": "8", "block": "11", "app": "0" },
				"id": "abc123",
				"listen_addr": "tcp://0.0.0.0:26656",
				"network": "test-1",
				"version": "0.34.0",
				"channels": "40202122233038606100",
				"moniker": "alice",
				"other": { "tx_index": "on", "rpc_address": "tcp://0.0.0.0:26657" }
			},
			"sync_info": { "latest_block_height": "100", "catching_up": false }
		}
	}"#;

	const NET_INFO: &str = r#"{
		"jsonrpc": "2.0",
		"id": -1,
		"result": {
			"listening": true,
			"listeners": ["Listener(@)"],
			"n_peers": "1",
			"peers": [{
				"node_info": {
					"id": "def456",
					"network": "test-1",
					"moniker": "bob",
					"other": { "tx_index": "off", "rpc_address": "tcp://127.0.0.1:36657" }
				},
				"is_outbound": true,
				"remote_ip": "10.0.0.2"
			}]
		}
	}"#;

	#[test]
	fn decode_status() {
		let response: RpcResponse<Status> = serde_json::from_str(STATUS).unwrap();
		let node_info = response.result.unwrap().node_info;
		assert_eq!(node_info.id, "abc123");
		assert_eq!(node_info.moniker, "alice");
		assert_eq!(node_info.network, "test-1");
		assert_eq!(node_info.version, "0.34.0");
		assert_eq!(node_info.other.tx_index, "on");
		assert!(response.error.is_none());
	}

	#[test]
	fn decode_net_info() {
		let response: RpcResponse<NetInfo> = serde_json::from_str(NET_INFO).unwrap();
		let peers = response.result.unwrap().peers;
		assert_eq!(peers.len(), 1);
		assert_eq!(peers[0].remote_ip, "10.0.0.2");
		assert_eq!(peers[0].node_info.id, "def456");
		assert_eq!(peers[0].node_info.other.rpc_address, "tcp://127.0.0.1:36657");
	}

	#[test]
	fn decode_error() {
		let body = r#"{"jsonrpc":"2.0","id":-1,"error":{"code":-32603,"message":"Internal error","data":"node is not running"}}"#;
		let response: RpcResponse<Status> = serde_json::from_str(body).unwrap();
		assert!(response.result.is_none());
		assert_eq!(response.error.unwrap().code, -32603);
	}
}
