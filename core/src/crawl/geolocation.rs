use color_eyre::eyre::WrapErr;
use tracing::debug;

use super::{types::Location, Error};
use crate::{
	data::{Database, LocationKey},
	network::geolocation::Locator,
};

/// Resolves host location, using the cached record if there is one.
///
/// Successful lookups are cached permanently, so each host is looked up once.
pub async fn resolve(
	db: &impl Database,
	locator: &impl Locator,
	host: &str,
) -> Result<Location, Error> {
	if let Some(location) = db.get(LocationKey(host.to_string()))? {
		debug!(host, "Using cached location");
		return Ok(location);
	}

	let response = locator
		.locate(host)
		.await
		.wrap_err_with(|| format!("Failed to locate {host}"))
		.map_err(Error::Resolution)?;

	let location = Location::from(response);
	db.put(LocationKey(host.to_string()), &location)?;
	Ok(location)
}
