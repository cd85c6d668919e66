use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::geolocation::GeoResponse;

/// Full node of a Tendermint based network, with its p2p relevant metadata.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Node {
	/// Host (IP) of the node
	pub address: String,
	pub rpc_port: String,
	pub p2p_port: String,
	pub moniker: String,
	pub id: String,
	pub network: String,
	pub version: String,
	/// Transaction indexing as reported by the node ("on" or "off")
	pub tx_index: String,
	/// Time of the latest successful crawl
	pub last_sync: Option<DateTime<Utc>>,
	pub location: Location,
}

impl Node {
	/// Returns `true` if node identity is known, which means status query succeeded at least once.
	pub fn has_identity(&self) -> bool {
		!self.id.is_empty()
	}
}

/// Geolocation of a node host. Never updated once cached.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Location {
	pub country: String,
	pub region: String,
	pub city: String,
	pub latitude: String,
	pub longitude: String,
}

impl From<GeoResponse> for Location {
	fn from(response: GeoResponse) -> Self {
		Location {
			country: response.country_name.unwrap_or_default(),
			region: response.region_name.unwrap_or_default(),
			city: response.city.unwrap_or_default(),
			latitude: format!("{:.6}", response.latitude.unwrap_or_default()),
			longitude: format!("{:.6}", response.longitude.unwrap_or_default()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn location_from_geo_response() {
		let response = GeoResponse {
			country_name: Some("United States".to_string()),
			region_name: Some("California".to_string()),
			city: None,
			latitude: Some(37.751),
			longitude: Some(-97.822),
		};

		let location = Location::from(response);
		assert_eq!(location.country, "United States");
		assert_eq!(location.region, "California");
		assert_eq!(location.city, "");
		assert_eq!(location.latitude, "37.751000");
		assert_eq!(location.longitude, "-97.822000");
	}
}
