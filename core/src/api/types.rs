use color_eyre::Report;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use warp::{http::StatusCode, Reply};

use crate::crawl::types::Node;

#[derive(Deserialize, Default, Debug)]
pub struct NodesQuery {
	pub page: Option<String>,
	pub limit: Option<String>,
}

/// Page of crawled nodes. Limit of 0 means all nodes are returned.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PaginatedNodes {
	pub total: usize,
	pub page: usize,
	pub limit: usize,
	pub nodes: Vec<Node>,
}

impl Reply for PaginatedNodes {
	fn into_response(self) -> warp::reply::Response {
		warp::reply::json(&self).into_response()
	}
}

/// Returns range of the requested page within `total` items, empty if page is out of bounds.
pub fn paginate(total: usize, page: usize, limit: usize) -> Range<usize> {
	if limit == 0 {
		return 0..total;
	}
	let start = page.saturating_sub(1).saturating_mul(limit);
	if start >= total {
		return 0..0;
	}
	start..start.saturating_add(limit).min(total)
}

#[derive(Debug, PartialEq)]
pub enum ErrorCode {
	NotFound,
	BadRequest,
	InternalServerError,
}

#[derive(Debug)]
pub struct Error {
	pub cause: Option<Report>,
	pub error_code: ErrorCode,
	pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
}

impl Error {
	fn new(cause: Option<Report>, error_code: ErrorCode, message: &str) -> Self {
		Error {
			cause,
			error_code,
			message: message.to_string(),
		}
	}

	pub fn not_found() -> Self {
		Self::new(None, ErrorCode::NotFound, "Not Found")
	}

	pub fn internal_server_error(cause: Report) -> Self {
		Self::new(
			Some(cause),
			ErrorCode::InternalServerError,
			"Internal Server Error",
		)
	}

	pub fn bad_request(message: &str) -> Self {
		Self::new(None, ErrorCode::BadRequest, message)
	}

	fn status(&self) -> StatusCode {
		match self.error_code {
			ErrorCode::NotFound => StatusCode::NOT_FOUND,
			ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
			ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl Reply for Error {
	fn into_response(self) -> warp::reply::Response {
		let status = self.status();
		let body = ErrorResponse {
			error: self.message,
		};
		warp::reply::with_status(warp::reply::json(&body), status).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::paginate;
	use test_case::test_case;

	#[test_case(5, 1, 0 => 0..5 ; "zero limit returns all")]
	#[test_case(5, 1, 2 => 0..2 ; "first page")]
	#[test_case(5, 3, 2 => 4..5 ; "last page is truncated")]
	#[test_case(5, 4, 2 => 0..0 ; "page beyond total is empty")]
	#[test_case(0, 1, 10 => 0..0 ; "no items")]
	#[test_case(5, usize::MAX, usize::MAX => 0..0 ; "overflowing page")]
	fn paginate_range(total: usize, page: usize, limit: usize) -> std::ops::Range<usize> {
		paginate(total, page, limit)
	}
}
