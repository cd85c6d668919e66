//! IP geolocation lookups against the ipstack service.

use async_trait::async_trait;
use color_eyre::{
	eyre::{eyre, WrapErr},
	Result,
};
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const IPSTACK_ENDPOINT: &str = "http://api.ipstack.com";

#[automock]
#[async_trait]
pub trait Locator {
	async fn locate(&self, host: &str) -> Result<GeoResponse>;
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct GeoResponse {
	pub country_name: Option<String>,
	pub region_name: Option<String>,
	pub city: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct IpStackError {
	code: i64,
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	info: String,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum IpStackResponse {
	Failure {
		#[allow(dead_code)]
		success: bool,
		error: IpStackError,
	},
	Success(GeoResponse),
}

impl IpStackResponse {
	fn into_result(self) -> Result<GeoResponse> {
		match self {
			IpStackResponse::Failure { error, .. } => Err(eyre!(
				"ipstack error {} ({}): {}",
				error.code,
				error.kind,
				error.info
			)),
			IpStackResponse::Success(response) => Ok(response),
		}
	}
}

#[derive(Clone)]
pub struct IpStackClient {
	client: reqwest::Client,
	endpoint: String,
	access_key: String,
}

impl IpStackClient {
	pub fn new(endpoint: &str, access_key: &str, timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.wrap_err("Failed to build geolocation HTTP client")?;

		Ok(IpStackClient {
			client,
			endpoint: endpoint.trim_end_matches('/').to_string(),
			access_key: access_key.to_string(),
		})
	}
}

#[async_trait]
impl Locator for IpStackClient {
	async fn locate(&self, host: &str) -> Result<GeoResponse> {
		self.client
			.get(format!("{}/{host}", self.endpoint))
			.query(&[("access_key", self.access_key.as_str())])
			.send()
			.await
			.wrap_err("Failed to query ipstack")?
			.json::<IpStackResponse>()
			.await
			.wrap_err("Failed to parse ipstack response")?
			.into_result()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_success() {
		let body = r#"{
			"ip": "10.0.0.1",
			"type": "ipv4",
			"country_code": "US",
			"country_name": "United States",
			"region_name": "Ohio",
			"city": "Columbus",
			"latitude": 39.96,
			"longitude": -83.0
		}"#;
		let response = serde_json::from_str::<IpStackResponse>(body)
			.unwrap()
			.into_result()
			.unwrap();

		assert_eq!(response.country_name.as_deref(), Some("United States"));
		assert_eq!(response.city.as_deref(), Some("Columbus"));
		assert_eq!(response.longitude, Some(-83.0));
	}

	#[test]
	fn decode_failure() {
		let body = r#"{
			"success": false,
			"error": { "code": 104, "type": "usage_limit_reached", "info": "Monthly usage limit reached" }
		}"#;
		let error = serde_json::from_str::<IpStackResponse>(body)
			.unwrap()
			.into_result()
			.unwrap_err();

		assert!(error.to_string().contains("usage_limit_reached"));
	}
}
