//! HTTP server for crawled network data.
//!
//! # Endpoints
//!
//! * `/health` - returns 200 while the server is running
//! * `/api/nodes?page={page}&limit={limit}` - returns page of crawled nodes, all nodes if limit is not set
//! * `/api/nodes/{id}` - returns crawled node by its ID, or RPC address if ID is not known
//! * `/api/locations/{ip}` - returns cached location of a host

use crate::api::types::{Error, ErrorCode};
use crate::data::Database;
use crate::shutdown::Controller;
use color_eyre::{eyre::WrapErr, Result};
use futures::{Future, FutureExt};
use std::{net::SocketAddr, str::FromStr};
use tracing::{error, info};
use warp::{Filter, Reply};

use super::{configuration::APIConfig, routes};

pub struct Server<T: Database> {
	pub db: T,
	pub shutdown: Controller<String>,
}

impl<T: Database + Clone + Send + Sync + 'static> Server<T> {
	/// Creates a HTTP server that needs to be spawned into a runtime
	pub fn bind(self, cfg: APIConfig) -> Result<impl Future<Output = ()>> {
		let host = cfg.http_server_host;
		let port = cfg.http_server_port;

		let cors = warp::cors()
			.allow_any_origin()
			.allow_header("content-type")
			.allow_methods(vec!["GET", "HEAD"]);

		let routes = routes::routes(self.db).with(cors);

		let addr = SocketAddr::from_str(&format!("{host}:{port}"))
			.wrap_err("Unable to parse host address from config")?;
		info!("HTTP server running on http://{host}:{port}");
		// warp graceful shutdown expects a signal that is [`Future<Output = ()>`]
		let shutdown_signal = self.shutdown.triggered_shutdown().map(|_| ());
		let (_, server) = warp::serve(routes)
			.try_bind_with_graceful_shutdown(addr, shutdown_signal)
			.wrap_err("Unable to bind HTTP server")?;

		Ok(server)
	}
}

pub fn log_internal_server_error(result: Result<impl Reply, Error>) -> Result<impl Reply, Error> {
	if let Err(Error {
		error_code: ErrorCode::InternalServerError,
		cause: Some(error),
		message,
	}) = result.as_ref()
	{
		error!("{message}: {error:#}");
	}
	result
}
