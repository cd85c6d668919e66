use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct APIConfig {
	/// Crawler HTTP server host name (default: 0.0.0.0).
	pub http_server_host: String,
	/// Crawler HTTP server port (default: 27758).
	pub http_server_port: u16,
}

impl Default for APIConfig {
	fn default() -> Self {
		Self {
			http_server_host: "0.0.0.0".to_owned(),
			http_server_port: 27758,
		}
	}
}
