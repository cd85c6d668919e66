use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use config::Config;
use std::{fs, path::Path};
use tmcrawl_core::{
	api::server::Server,
	crawl::Crawler,
	data::RocksDB,
	network::{geolocation::IpStackClient, rpc::HttpClient, TcpProber},
	shutdown::Controller,
	utils::{default_subscriber, install_panic_hooks, json_subscriber, spawn_in_span},
};
use tracing::info;

mod config;

fn clean_db_state(path: &str) -> Result<()> {
	if !Path::new(path).exists() {
		return Ok(());
	};
	info!("Cleaning up local state directory");
	Ok(fs::remove_dir_all(path)?)
}

#[tokio::main]
pub async fn main() -> Result<()> {
	let shutdown = Controller::new();
	let opts = config::CliOpts::parse();
	let config = config::load(&opts)?;

	if config.log_format_json {
		tracing::subscriber::set_global_default(json_subscriber(config.log_level))?;
	} else {
		tracing::subscriber::set_global_default(default_subscriber(config.log_level))?;
	}

	install_panic_hooks(shutdown.clone())?;

	spawn_in_span(shutdown.on_user_signal("User signaled shutdown".to_string()));

	if opts.clean {
		clean_db_state(&config.data_dir)?;
	};

	let db = RocksDB::open(&config.data_dir)
		.wrap_err_with(|| format!("Unable to open database at {}", config.data_dir))?;

	run(config, db, shutdown).await
}

async fn run(config: Config, db: RocksDB, shutdown: Controller<String>) -> Result<()> {
	let version = clap::crate_version!();
	info!("Running Tendermint crawler v{version}");
	info!("Using configuration: {config:?}");

	let node_client =
		HttpClient::new(config.crawl.rpc_timeout).wrap_err("Unable to create RPC client")?;
	let locator = IpStackClient::new(
		&config.geolocation.ipstack_endpoint,
		&config.geolocation.ipstack_key,
		config.geolocation.geolocation_timeout,
	)
	.wrap_err("Unable to create geolocation client")?;

	let server = Server {
		db: db.clone(),
		shutdown: shutdown.clone(),
	};
	let server = spawn_in_span(server.bind(config.api)?);

	let crawler = Crawler::new(config.crawl, db, node_client, TcpProber, locator);
	let crawl = spawn_in_span(shutdown.with_cancel(crawler.run()));

	if let Err(reason) = crawl.await? {
		info!("Crawler stopped: {reason}");
	}
	server.await?;
	info!("HTTP server stopped");
	Ok(())
}
