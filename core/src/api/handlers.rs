use color_eyre::eyre::WrapErr;
use percent_encoding::percent_decode_str;
use std::ops::ControlFlow;
use tracing::debug;
use warp::reply::Json;

use super::types::{paginate, Error, NodesQuery, PaginatedNodes};
use crate::data::{Database, LocationKey, NodeKey, Nodes};

fn positive(value: Option<&str>, name: &str, default: usize) -> Result<usize, Error> {
	let Some(value) = value else {
		return Ok(default);
	};
	match value.parse::<usize>() {
		Ok(value) if value > 0 => Ok(value),
		_ => Err(Error::bad_request(&format!("invalid {name} query: {value}"))),
	}
}

pub fn nodes(query: NodesQuery, db: impl Database) -> Result<PaginatedNodes, Error> {
	let page = positive(query.page.as_deref(), "page", 1)?;
	let limit = positive(query.limit.as_deref(), "limit", 0)?;

	let mut nodes = vec![];
	db.iterate_prefix(Nodes, |key, node| {
		match node {
			Ok(node) => nodes.push(node),
			Err(error) => debug!(key, "Skipping undecodable node record: {error}"),
		}
		ControlFlow::Continue(())
	})
	.wrap_err("Failed to query nodes")
	.map_err(Error::internal_server_error)?;

	let total = nodes.len();
	let range = paginate(total, page, limit);
	let nodes = nodes.drain(range).collect();

	Ok(PaginatedNodes {
		total,
		page,
		limit,
		nodes,
	})
}

/// Decodes percent encoded path segment, since node can be keyed by its RPC address.
fn decode_segment(segment: &str) -> Result<String, Error> {
	percent_decode_str(segment)
		.decode_utf8()
		.map(|decoded| decoded.into_owned())
		.map_err(|_| Error::bad_request(&format!("invalid path segment: {segment}")))
}

pub fn node(id: String, db: impl Database) -> Result<Json, Error> {
	let id = decode_segment(&id)?;
	let node = db
		.get(NodeKey(id))
		.wrap_err("Failed to get node")
		.map_err(Error::internal_server_error)?
		.ok_or_else(Error::not_found)?;
	Ok(warp::reply::json(&node))
}

pub fn location(ip: String, db: impl Database) -> Result<Json, Error> {
	let ip = decode_segment(&ip)?;
	let location = db
		.get(LocationKey(ip))
		.wrap_err("Failed to get location")
		.map_err(Error::internal_server_error)?
		.ok_or_else(Error::not_found)?;
	Ok(warp::reply::json(&location))
}
