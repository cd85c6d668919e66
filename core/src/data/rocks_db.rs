use super::{Backend, Error, Result, CRAWL_STATE_CF};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options};
use std::{ops::ControlFlow, sync::Arc};

#[derive(Clone)]
pub struct RocksDB {
	db: Arc<rocksdb::DB>,
}

impl From<rocksdb::Error> for Error {
	fn from(error: rocksdb::Error) -> Self {
		Error::Backend(error.into_string())
	}
}

impl RocksDB {
	pub fn open(path: &str) -> Result<RocksDB> {
		let cf_opts = vec![ColumnFamilyDescriptor::new(
			CRAWL_STATE_CF,
			Options::default(),
		)];

		let mut db_opts = Options::default();
		db_opts.create_if_missing(true);
		db_opts.create_missing_column_families(true);

		let db = Arc::new(rocksdb::DB::open_cf_descriptors(&db_opts, path, cf_opts)?);
		Ok(RocksDB { db })
	}

	fn cf_handle(&self) -> Result<Arc<rocksdb::BoundColumnFamily<'_>>> {
		self.db
			.cf_handle(CRAWL_STATE_CF)
			.ok_or_else(|| Error::Backend("Couldn't get Column Family handle from RocksDB".into()))
	}
}

impl Backend for RocksDB {
	fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
		let cf_handle = self.cf_handle()?;
		Ok(self.db.get_cf(&cf_handle, key)?)
	}

	fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<()> {
		let cf_handle = self.cf_handle()?;
		Ok(self.db.put_cf(&cf_handle, key, value)?)
	}

	fn delete_raw(&self, key: &[u8]) -> Result<()> {
		let cf_handle = self.cf_handle()?;
		Ok(self.db.delete_cf(&cf_handle, key)?)
	}

	fn iterate_raw(
		&self,
		prefix: &[u8],
		callback: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
	) -> Result<()> {
		let cf_handle = self.cf_handle()?;
		let mode = IteratorMode::From(prefix, Direction::Forward);
		for entry in self.db.iterator_cf(&cf_handle, mode) {
			let (key, value) = entry?;
			if !key.starts_with(prefix) {
				break;
			}
			if callback(&key, &value).is_break() {
				break;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		crawl::types::Node,
		data::{Database, LocationKey, NodeKey, Nodes},
	};

	#[test]
	fn prefix_iteration_over_rocksdb() {
		let dir = tempfile::tempdir().unwrap();
		let db = RocksDB::open(dir.path().to_str().unwrap()).unwrap();

		for id in ["b", "a"] {
			let node = Node {
				id: id.to_string(),
				..Default::default()
			};
			db.put(NodeKey(id.to_string()), &node).unwrap();
		}
		db.put(LocationKey("10.0.0.1".to_string()), &Default::default())
			.unwrap();

		let mut ids = vec![];
		db.iterate_prefix(Nodes, |_, node| {
			ids.push(node.unwrap().id);
			ControlFlow::Continue(())
		})
		.unwrap();
		assert_eq!(ids, vec!["a", "b"]);

		db.delete(NodeKey("a".to_string())).unwrap();
		assert!(!db.has(NodeKey("a".to_string())).unwrap());
		assert!(db.has(NodeKey("b".to_string())).unwrap());
	}
}
