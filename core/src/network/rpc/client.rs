use async_trait::async_trait;
use color_eyre::{
	eyre::{eyre, WrapErr},
	Result,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{NetInfo, NodeClient, RpcResponse, Status};

/// Tendermint RPC client over HTTP GET endpoints.
#[derive(Clone)]
pub struct HttpClient {
	client: reqwest::Client,
}

impl HttpClient {
	pub fn new(timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.wrap_err("Failed to build RPC HTTP client")?;
		Ok(HttpClient { client })
	}

	async fn request<T: DeserializeOwned>(&self, rpc_address: &str, method: &str) -> Result<T> {
		let url = format!("{}/{method}", rpc_address.trim_end_matches('/'));
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.wrap_err_with(|| format!("Failed to query {url}"))?
			.json::<RpcResponse<T>>()
			.await
			.wrap_err_with(|| format!("Failed to decode {method} response"))?;

		match response {
			RpcResponse {
				error: Some(error), ..
			} => Err(eyre!(
				"{method} returned error {}: {} {}",
				error.code,
				error.message,
				error.data.unwrap_or_default()
			)),
			RpcResponse {
				result: Some(result),
				..
			} => Ok(result),
			RpcResponse { result: None, .. } => Err(eyre!("{method} returned empty result")),
		}
	}
}

#[async_trait]
impl NodeClient for HttpClient {
	async fn status(&self, rpc_address: &str) -> Result<Status> {
		self.request(rpc_address, "status").await
	}

	async fn net_info(&self, rpc_address: &str) -> Result<NetInfo> {
		self.request(rpc_address, "net_info").await
	}
}
