use super::{Backend, Error, Result};
use std::{
	collections::BTreeMap,
	ops::ControlFlow,
	sync::{Arc, RwLock},
};

#[derive(Clone, Default)]
pub struct MemoryDB {
	map: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

fn poisoned<T>(_: T) -> Error {
	Error::Backend("MemoryDB lock is poisoned".to_string())
}

impl Backend for MemoryDB {
	fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
		let map = self.map.read().map_err(poisoned)?;
		Ok(map.get(key).cloned())
	}

	fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<()> {
		let mut map = self.map.write().map_err(poisoned)?;
		map.insert(key.to_vec(), value.to_vec());
		Ok(())
	}

	fn delete_raw(&self, key: &[u8]) -> Result<()> {
		let mut map = self.map.write().map_err(poisoned)?;
		map.remove(key);
		Ok(())
	}

	fn iterate_raw(
		&self,
		prefix: &[u8],
		callback: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
	) -> Result<()> {
		let map = self.map.read().map_err(poisoned)?;
		for (key, value) in map.range(prefix.to_vec()..) {
			if !key.starts_with(prefix) {
				break;
			}
			if callback(key, value).is_break() {
				break;
			}
		}
		Ok(())
	}
}
