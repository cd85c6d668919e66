use super::{handlers, server::log_internal_server_error, types::NodesQuery};
use crate::data::Database;
use std::convert::Infallible;
use warp::{Filter, Rejection, Reply};

fn with_db<T: Database + Clone + Send>(
	db: T,
) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
	warp::any().map(move || db.clone())
}

pub fn health_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	warp::head()
		.or(warp::get())
		.unify()
		.and(warp::path("health"))
		.and(warp::path::end())
		.map(|| warp::reply::with_status("", warp::http::StatusCode::OK))
}

pub fn nodes_route(
	db: impl Database + Clone + Send + Sync,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	warp::path!("api" / "nodes")
		.and(warp::get())
		.and(warp::query::<NodesQuery>())
		.and(with_db(db))
		.map(handlers::nodes)
		.map(log_internal_server_error)
}

pub fn node_route(
	db: impl Database + Clone + Send + Sync,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	warp::path!("api" / "nodes" / String)
		.and(warp::get())
		.and(with_db(db))
		.map(handlers::node)
		.map(log_internal_server_error)
}

pub fn location_route(
	db: impl Database + Clone + Send + Sync,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	warp::path!("api" / "locations" / String)
		.and(warp::get())
		.and(with_db(db))
		.map(handlers::location)
		.map(log_internal_server_error)
}

pub fn routes(
	db: impl Database + Clone + Send + Sync + 'static,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
	health_route()
		.or(nodes_route(db.clone()))
		.or(node_route(db.clone()))
		.or(location_route(db))
}
