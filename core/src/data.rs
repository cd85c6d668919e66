//! Persistence of crawled nodes and cached geolocations.
//!
//! Records are addressed by namespaced keys (see [`keys`]) and stored as JSON
//! encoded bytes. Backends only deal with raw bytes, encoding happens here so
//! every backend shares the same record format.

use crate::crawl::types::{Location, Node};
use serde::{de::DeserializeOwned, Serialize};
use std::ops::ControlFlow;

mod keys;
pub use keys::*;

mod mem_db;
pub use mem_db::*;

#[cfg(feature = "rocksdb")]
mod rocks_db;
#[cfg(feature = "rocksdb")]
pub use rocks_db::*;

/// Column family for crawl state
pub const CRAWL_STATE_CF: &str = "crawl_state_cf";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Store operation failed: {0}")]
	Backend(String),
	#[error("Record encoding failed: {0}")]
	Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Type of the database key which we can get from the custom key.
pub trait RecordKey {
	type Type: Serialize + DeserializeOwned;

	/// Returns full key, including its namespace prefix
	fn key(&self) -> String;
}

/// Namespace of records which can be iterated over.
pub trait RecordPrefix {
	type Type: Serialize + DeserializeOwned;

	fn prefix(&self) -> &'static str;
}

/// Raw key/value operations every backend implements.
pub trait Backend {
	fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

	fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<()>;

	fn delete_raw(&self, key: &[u8]) -> Result<()>;

	/// Invokes callback for every entry with a key starting with the prefix,
	/// until the callback breaks.
	fn iterate_raw(
		&self,
		prefix: &[u8],
		callback: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
	) -> Result<()>;
}

pub trait Database {
	/// Puts value for given key into database.
	fn put<T: RecordKey>(&self, key: T, value: &T::Type) -> Result<()>;

	/// Gets value for given key.
	/// Key is serialized into database key, value is deserialized into the given type.
	fn get<T: RecordKey>(&self, key: T) -> Result<Option<T::Type>>;

	/// Checks if value for given key exists.
	fn has<T: RecordKey>(&self, key: T) -> Result<bool>;

	/// Deletes value from the database for the given key.
	fn delete<T: RecordKey>(&self, key: T) -> Result<()>;

	/// Iterates over all records in the namespace.
	/// Records which cannot be decoded are passed to the callback as errors.
	fn iterate_prefix<P, F>(&self, prefix: P, callback: F) -> Result<()>
	where
		P: RecordPrefix,
		F: FnMut(&str, Result<P::Type>) -> ControlFlow<()>;
}

impl<B: Backend> Database for B {
	fn put<T: RecordKey>(&self, key: T, value: &T::Type) -> Result<()> {
		let value = serde_json::to_vec(value)?;
		self.put_raw(key.key().as_bytes(), &value)
	}

	fn get<T: RecordKey>(&self, key: T) -> Result<Option<T::Type>> {
		self.get_raw(key.key().as_bytes())?
			.map(|value| serde_json::from_slice(&value).map_err(Error::from))
			.transpose()
	}

	fn has<T: RecordKey>(&self, key: T) -> Result<bool> {
		Ok(self.get_raw(key.key().as_bytes())?.is_some())
	}

	fn delete<T: RecordKey>(&self, key: T) -> Result<()> {
		self.delete_raw(key.key().as_bytes())
	}

	fn iterate_prefix<P, F>(&self, prefix: P, mut callback: F) -> Result<()>
	where
		P: RecordPrefix,
		F: FnMut(&str, Result<P::Type>) -> ControlFlow<()>,
	{
		self.iterate_raw(prefix.prefix().as_bytes(), &mut |key, value| {
			let key = String::from_utf8_lossy(key);
			let value = serde_json::from_slice(value).map_err(Error::from);
			callback(&key, value)
		})
	}
}

/// Key of a node record, either node ID or RPC address of the node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeKey(pub String);

impl RecordKey for NodeKey {
	type Type = Node;

	fn key(&self) -> String {
		let NodeKey(identity) = self;
		format!("{NODE_KEY_PREFIX}{identity}")
	}
}

/// Key of a cached location, by host IP
pub struct LocationKey(pub String);

impl RecordKey for LocationKey {
	type Type = Location;

	fn key(&self) -> String {
		let LocationKey(host) = self;
		format!("{LOCATION_KEY_PREFIX}{host}")
	}
}

/// Key of an alias from node RPC address to the identity its record is stored under
pub struct AddressKey(pub String);

impl RecordKey for AddressKey {
	type Type = String;

	fn key(&self) -> String {
		let AddressKey(address) = self;
		format!("{ADDRESS_KEY_PREFIX}{address}")
	}
}

pub struct Nodes;

impl RecordPrefix for Nodes {
	type Type = Node;

	fn prefix(&self) -> &'static str {
		NODE_KEY_PREFIX
	}
}

pub struct Locations;

impl RecordPrefix for Locations {
	type Type = Location;

	fn prefix(&self) -> &'static str {
		LOCATION_KEY_PREFIX
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str) -> Node {
		Node {
			id: id.to_string(),
			moniker: format!("{id}-moniker"),
			..Default::default()
		}
	}

	#[test]
	fn put_get_has_delete() {
		let db = MemoryDB::default();
		let key = || NodeKey("abc123".to_string());

		assert!(!db.has(key()).unwrap());
		assert!(db.get(key()).unwrap().is_none());

		db.put(key(), &node("abc123")).unwrap();
		assert!(db.has(key()).unwrap());
		assert_eq!(db.get(key()).unwrap(), Some(node("abc123")));

		db.delete(key()).unwrap();
		assert!(!db.has(key()).unwrap());
	}

	#[test]
	fn iterate_prefix_stays_in_namespace() {
		let db = MemoryDB::default();
		db.put(NodeKey("a".to_string()), &node("a")).unwrap();
		db.put(NodeKey("b".to_string()), &node("b")).unwrap();
		db.put(LocationKey("10.0.0.1".to_string()), &Location::default())
			.unwrap();
		db.put(AddressKey("http://10.0.0.1:26657".to_string()), &"a".to_string())
			.unwrap();

		let mut keys = vec![];
		db.iterate_prefix(Nodes, |key, value| {
			assert!(value.is_ok());
			keys.push(key.to_string());
			ControlFlow::Continue(())
		})
		.unwrap();

		assert_eq!(keys, vec!["node/a", "node/b"]);

		let mut locations = vec![];
		db.iterate_prefix(Locations, |key, value| {
			locations.push((key.to_string(), value.unwrap()));
			ControlFlow::Continue(())
		})
		.unwrap();

		assert_eq!(
			locations,
			vec![("location/10.0.0.1".to_string(), Location::default())]
		);
	}

	#[test]
	fn iterate_prefix_stops_on_break() {
		let db = MemoryDB::default();
		for id in ["a", "b", "c"] {
			db.put(NodeKey(id.to_string()), &node(id)).unwrap();
		}

		let mut visited = 0;
		db.iterate_prefix(Nodes, |_, _| {
			visited += 1;
			ControlFlow::Break(())
		})
		.unwrap();

		assert_eq!(visited, 1);
	}

	#[test]
	fn undecodable_record_is_reported() {
		let db = MemoryDB::default();
		db.put_raw(b"node/broken", b"not json").unwrap();

		assert!(matches!(
			db.get(NodeKey("broken".to_string())),
			Err(Error::Encoding(_))
		));

		let mut errors = 0;
		db.iterate_prefix(Nodes, |_, value| {
			if value.is_err() {
				errors += 1;
			}
			ControlFlow::Continue(())
		})
		.unwrap();
		assert_eq!(errors, 1);
	}
}
