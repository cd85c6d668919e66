//! Crawl frontier with a bounded reseed reservoir.
//!
//! Pending addresses are kept in a vector indexed by a map, so insertion,
//! removal and uniform random selection are all constant time. Every added
//! address is also offered to a reservoir sample of fixed capacity, which
//! is used to restart the traversal once the frontier is drained.
//!
//! The pool is not thread-safe and is owned by the crawl loop.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

pub struct NodePool<R: Rng = StdRng> {
	nodes: Vec<String>,
	positions: HashMap<String, usize>,
	reservoir: Vec<String>,
	capacity: usize,
	/// Number of offers made to the reservoir so far
	offered: u64,
	rng: R,
}

impl NodePool<StdRng> {
	/// Creates pool with reservoir of given capacity and entropy seeded random source.
	pub fn new(capacity: usize) -> Self {
		Self::with_rng(capacity, StdRng::from_entropy())
	}

	pub fn with_seed(capacity: usize, seed: u64) -> Self {
		Self::with_rng(capacity, StdRng::seed_from_u64(seed))
	}
}

impl<R: Rng> NodePool<R> {
	pub fn with_rng(capacity: usize, rng: R) -> Self {
		NodePool {
			nodes: Vec::new(),
			positions: HashMap::new(),
			reservoir: Vec::with_capacity(capacity),
			capacity,
			offered: 0,
			rng,
		}
	}

	/// Number of pending addresses.
	pub fn size(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Adds each of the addresses to the pool.
	pub fn seed<S: AsRef<str>>(&mut self, addresses: &[S]) {
		for address in addresses {
			self.add(address.as_ref());
		}
	}

	/// Adds address to the pool if not pending already, and offers it to the reservoir.
	pub fn add(&mut self, address: &str) {
		self.insert(address);
		self.offer(address);
	}

	fn insert(&mut self, address: &str) {
		if self.positions.contains_key(address) {
			return;
		}
		self.positions.insert(address.to_string(), self.nodes.len());
		self.nodes.push(address.to_string());
	}

	// Reservoir sampling (algorithm R): after `n` offers, each offer survives with probability `capacity / n`.
	// Every call is an offer, so repeated offers of one address also increase `offered`
	// and can occupy more than one slot.
	fn offer(&mut self, address: &str) {
		if self.capacity == 0 {
			return;
		}
		self.offered += 1;
		if self.reservoir.len() < self.capacity {
			self.reservoir.push(address.to_string());
			return;
		}
		let slot = self.rng.gen_range(0..self.offered);
		if slot < self.capacity as u64 {
			self.reservoir[slot as usize] = address.to_string();
		}
	}

	/// Returns uniformly selected pending address, without removing it.
	pub fn random(&mut self) -> Option<String> {
		if self.nodes.is_empty() {
			return None;
		}
		let index = self.rng.gen_range(0..self.nodes.len());
		Some(self.nodes[index].clone())
	}

	pub fn has(&self, address: &str) -> bool {
		self.positions.contains_key(address)
	}

	/// Removes address from the pool, if present.
	pub fn delete(&mut self, address: &str) {
		let Some(index) = self.positions.remove(address) else {
			return;
		};
		self.nodes.swap_remove(index);
		if let Some(moved) = self.nodes.get(index) {
			self.positions.insert(moved.clone(), index);
		}
	}

	/// Puts all reservoir addresses back to the pool.
	///
	/// Reservoir is not offered its own addresses again, so reseeding leaves the sample unchanged.
	pub fn reseed(&mut self) {
		let reservoir = self.reservoir.clone();
		for address in &reservoir {
			self.insert(address);
		}
	}

	pub fn reservoir(&self) -> &[String] {
		&self.reservoir
	}
}
