//! Serde helpers for configuration values.

use std::time::Duration;

pub mod tracing_level_format {
	use serde::{self, Deserialize, Deserializer, Serializer};
	use std::str::FromStr;
	use tracing::Level;

	pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&level.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		Level::from_str(&value).map_err(serde::de::Error::custom)
	}
}

pub mod duration_seconds_format {
	use super::Duration;
	use serde::{self, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = u64::deserialize(deserializer)?;
		Ok(Duration::from_secs(value))
	}
}

pub mod duration_millis_format {
	use super::Duration;
	use serde::{self, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = u64::deserialize(deserializer)?;
		Ok(Duration::from_millis(value))
	}
}

#[cfg(test)]
mod tests {
	use crate::crawl::configuration::CrawlConfig;
	use std::time::Duration;

	#[test]
	fn durations_are_read_in_configured_units() {
		let config: CrawlConfig = serde_json::from_str(
			r#"{"seeds":["http://10.0.0.1:26657"],"crawl_interval":30,"probe_timeout":250}"#,
		)
		.unwrap();

		assert_eq!(config.seeds, vec!["http://10.0.0.1:26657"]);
		assert_eq!(config.crawl_interval, Duration::from_secs(30));
		assert_eq!(config.probe_timeout, Duration::from_millis(250));
		assert_eq!(config.recheck_interval, Duration::from_secs(3600));
		assert_eq!(config.reseed_size, 100);
	}
}
