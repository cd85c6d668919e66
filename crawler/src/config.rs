use std::fs;

use clap::{command, Parser};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tmcrawl_core::{
	api::configuration::APIConfig,
	crawl::configuration::{CrawlConfig, GeolocationConfig},
	types::tracing_level_format,
};
use tracing::Level;

pub const SEED_LIST_EMPTY_MESSAGE: &str = r#"
Seed list is empty.
Set seed nodes with `--seed` flag, or using `seeds` configuration parameter:

seeds = ["http://10.0.0.1:26657"]
"#;

pub const IPSTACK_KEY_EMPTY_MESSAGE: &str =
	"ipstack access key is not set, set it using `ipstack_key` configuration parameter";

#[derive(Parser)]
#[command(version)]
pub struct CliOpts {
	/// Sets path to the toml configuration file.
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<String>,
	/// Sets verbosity level.
	#[arg(long)]
	pub verbosity: Option<Level>,
	/// Sets logs format to JSON.
	#[arg(long)]
	pub logs_json: bool,
	/// Cleans DB state.
	#[arg(long)]
	pub clean: bool,
	/// Adds seed node RPC address, replacing configured seeds. Can be repeated.
	#[arg(long, value_name = "RPC_ADDRESS")]
	pub seed: Vec<String>,
	/// Sets HTTP server port.
	#[arg(long)]
	pub http_server_port: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Log level.
	#[serde(with = "tracing_level_format")]
	pub log_level: Level,
	/// Log format: JSON for `true`, plain text for `false`.
	pub log_format_json: bool,
	/// Database file system path.
	pub data_dir: String,
	#[serde(flatten)]
	pub api: APIConfig,
	#[serde(flatten)]
	pub crawl: CrawlConfig,
	#[serde(flatten)]
	pub geolocation: GeolocationConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: Level::INFO,
			log_format_json: false,
			data_dir: "tmcrawl_data".to_string(),
			api: Default::default(),
			crawl: Default::default(),
			geolocation: Default::default(),
		}
	}
}

pub fn load(opts: &CliOpts) -> Result<Config> {
	let mut config = match &opts.config {
		Some(path) => {
			fs::metadata(path)?;
			confy::load_path(path)?
		},
		None => Config::default(),
	};

	config.log_level = opts.verbosity.unwrap_or(config.log_level);
	config.log_format_json = opts.logs_json || config.log_format_json;

	if !opts.seed.is_empty() {
		config.crawl.seeds = opts.seed.clone();
	}
	if let Some(port) = opts.http_server_port {
		config.api.http_server_port = port;
	}

	validate(&config)?;
	Ok(config)
}

fn validate(config: &Config) -> Result<()> {
	if config.crawl.seeds.is_empty() {
		return Err(eyre!("{SEED_LIST_EMPTY_MESSAGE}"));
	}
	if config.geolocation.ipstack_key.is_empty() {
		return Err(eyre!("{IPSTACK_KEY_EMPTY_MESSAGE}"));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{io::Write, time::Duration};

	fn opts(args: &[&str]) -> CliOpts {
		let mut argv = vec!["tmcrawl"];
		argv.extend_from_slice(args);
		CliOpts::parse_from(argv)
	}

	fn config_file(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn load_from_file() {
		let file = config_file(
			r#"
log_level = "debug"
data_dir = "/tmp/tmcrawl"
http_server_port = 8080
seeds = ["http://10.0.0.1:26657"]
crawl_interval = 30
probe_timeout = 500
ipstack_key = "secret"
"#,
		);
		let path = file.path().to_str().unwrap();

		let config = load(&opts(&["--config", path])).unwrap();

		assert_eq!(config.log_level, Level::DEBUG);
		assert_eq!(config.data_dir, "/tmp/tmcrawl");
		assert_eq!(config.api.http_server_host, "0.0.0.0");
		assert_eq!(config.api.http_server_port, 8080);
		assert_eq!(config.crawl.seeds, vec!["http://10.0.0.1:26657"]);
		assert_eq!(config.crawl.crawl_interval, Duration::from_secs(30));
		assert_eq!(config.crawl.probe_timeout, Duration::from_millis(500));
		assert_eq!(config.crawl.reseed_size, 100);
		assert_eq!(config.geolocation.ipstack_key, "secret");
	}

	#[test]
	fn cli_options_override_file() {
		let file = config_file(
			r#"
seeds = ["http://10.0.0.1:26657"]
ipstack_key = "secret"
"#,
		);
		let path = file.path().to_str().unwrap();

		let config = load(&opts(&[
			"--config",
			path,
			"--verbosity",
			"trace",
			"--logs-json",
			"--seed",
			"http://10.0.0.2:26657",
			"--seed",
			"http://10.0.0.3:26657",
			"--http-server-port",
			"9000",
		]))
		.unwrap();

		assert_eq!(config.log_level, Level::TRACE);
		assert!(config.log_format_json);
		assert_eq!(
			config.crawl.seeds,
			vec!["http://10.0.0.2:26657", "http://10.0.0.3:26657"]
		);
		assert_eq!(config.api.http_server_port, 9000);
	}

	#[test]
	fn empty_seed_list_is_rejected() {
		let file = config_file(r#"ipstack_key = "secret""#);
		let path = file.path().to_str().unwrap();

		let error = load(&opts(&["--config", path])).unwrap_err();
		assert!(error.to_string().contains("Seed list is empty"));
	}

	#[test]
	fn missing_ipstack_key_is_rejected() {
		let error = load(&opts(&["--seed", "http://10.0.0.1:26657"])).unwrap_err();
		assert!(error.to_string().contains("ipstack access key is not set"));
	}

	#[test]
	fn logged_configuration_omits_access_key() {
		let file = config_file(
			r#"
seeds = ["http://10.0.0.1:26657"]
ipstack_key = "s3cr3t-access-key"
"#,
		);
		let path = file.path().to_str().unwrap();

		let config = load(&opts(&["--config", path])).unwrap();

		assert_eq!(config.geolocation.ipstack_key, "s3cr3t-access-key");
		assert!(!format!("{config:?}").contains("s3cr3t-access-key"));
	}

	#[test]
	fn missing_config_file_is_rejected() {
		assert!(load(&opts(&["--config", "/nonexistent/tmcrawl.toml"])).is_err());
	}
}
