//! Tendermint p2p network crawler.
//!
//! # Flow
//!
//! * Seed the node pool with configured RPC addresses
//! * Pick random address from the pool and crawl it, until the pool is drained
//! * Wait for the crawl interval, reseed the pool from the reservoir and start over
//!
//! Crawling a node goes through following steps, each of which can end the crawl:
//!
//! * Probe liveness of the node p2p endpoint, remove known node if it is unreachable
//! * Resolve node geolocation, using the cache when possible
//! * Query node status and network info, add unknown peers to the pool
//! * Persist the node with the latest sync time
//!
//! # Notes
//!
//! Only failed liveness probe removes node from the store. Other failures persist
//! the node with metadata gathered so far. Nothing is retried within a crawl,
//! failed nodes are retried on the next reseed.

use chrono::Utc;
use color_eyre::Report;
use rand::{rngs::StdRng, Rng};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
	data::{self, AddressKey, Database, NodeKey},
	network::{
		geolocation::Locator,
		rpc::{NodeClient, Peer},
		Prober,
	},
};

pub mod address;
pub mod configuration;
mod geolocation;
pub mod pool;
pub mod types;

use address::{peer_rpc_address, RpcAddress};
use configuration::CrawlConfig;
use pool::NodePool;
use types::Node;

pub use geolocation::resolve as resolve_location;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Node is unreachable at {0}")]
	Unreachable(String),
	#[error("Node query failed: {0:#}")]
	Protocol(Report),
	#[error("Geolocation failed: {0:#}")]
	Resolution(Report),
	#[error("Record encoding failed: {0}")]
	Encoding(serde_json::Error),
	#[error("Store operation failed: {0}")]
	Store(String),
}

impl From<data::Error> for Error {
	fn from(error: data::Error) -> Self {
		match error {
			data::Error::Backend(message) => Error::Store(message),
			data::Error::Encoding(error) => Error::Encoding(error),
		}
	}
}

/// Result of a single node crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
	/// Node is unreachable and its record has been removed
	Removed,
	/// Node is unreachable and was not known before
	Unreachable,
	/// Node is reachable, but its metadata is incomplete
	Partial,
	/// Node is crawled, with number of peers newly added to the pool
	Crawled { peers: usize },
	/// Crawl is abandoned due to invalid address or store failure
	Abandoned,
}

pub struct Crawler<D, C, P, L, R: Rng = StdRng> {
	config: CrawlConfig,
	db: D,
	node_client: C,
	prober: P,
	locator: L,
	pool: NodePool<R>,
}

impl<D, C, P, L> Crawler<D, C, P, L, StdRng>
where
	D: Database + Send + Sync,
	C: NodeClient + Send + Sync,
	P: Prober + Send + Sync,
	L: Locator + Send + Sync,
{
	/// Creates crawler with the pool seeded from configuration.
	pub fn new(config: CrawlConfig, db: D, node_client: C, prober: P, locator: L) -> Self {
		let mut pool = match config.rng_seed {
			Some(seed) => NodePool::with_seed(config.reseed_size, seed),
			None => NodePool::new(config.reseed_size),
		};
		pool.seed(&config.seeds);

		Crawler {
			config,
			db,
			node_client,
			prober,
			locator,
			pool,
		}
	}
}

impl<D, C, P, L, R> Crawler<D, C, P, L, R>
where
	D: Database + Send + Sync,
	C: NodeClient + Send + Sync,
	P: Prober + Send + Sync,
	L: Locator + Send + Sync,
	R: Rng + Send,
{
	pub fn pool(&self) -> &NodePool<R> {
		&self.pool
	}

	pub fn pool_mut(&mut self) -> &mut NodePool<R> {
		&mut self.pool
	}

	/// Crawls the network indefinitely.
	pub async fn run(mut self) {
		info!(
			seeds = self.config.seeds.len(),
			reseed_size = self.config.reseed_size,
			recheck_interval = ?self.config.recheck_interval,
			"Starting crawler..."
		);

		loop {
			let crawled = self.crawl_pool().await;
			let duration = self.config.crawl_interval;
			info!(crawled, ?duration, "Node pool exhausted, waiting until next crawl attempt...");
			sleep(duration).await;
			self.pool.reseed();
			info!(size = self.pool.size(), "Node pool reseeded");
		}
	}

	/// Crawls random nodes from the pool until it is empty, returning number of crawled nodes.
	///
	/// Peers discovered during the crawl are crawled within the same pass.
	pub async fn crawl_pool(&mut self) -> usize {
		let mut crawled = 0;
		while let Some(rpc_address) = self.pool.random() {
			let outcome = self.crawl_node(&rpc_address).await;
			debug!(node_address = %rpc_address, ?outcome, "Node crawl finished");
			self.pool.delete(&rpc_address);
			crawled += 1;
		}
		crawled
	}

	/// Crawls node by its RPC address.
	pub async fn crawl_node(&mut self, rpc_address: &str) -> CrawlOutcome {
		let address = match RpcAddress::parse(rpc_address) {
			Ok(address) => address,
			Err(error) => {
				warn!(node_address = rpc_address, "Skipping invalid address: {error:#}");
				return CrawlOutcome::Abandoned;
			},
		};

		if let Err(error) = self.probe(&address).await {
			return match self.remove_node(rpc_address, &address) {
				Ok(true) => {
					info!(node_address = rpc_address, "{error}; removed");
					CrawlOutcome::Removed
				},
				Ok(false) => {
					debug!(node_address = rpc_address, "{error}");
					CrawlOutcome::Unreachable
				},
				Err(error) => {
					warn!(node_address = rpc_address, "Failed to remove node: {error}");
					CrawlOutcome::Abandoned
				},
			};
		}

		let mut node = Node {
			address: address.host.clone(),
			rpc_port: address.rpc_port(),
			p2p_port: self.config.p2p_port.to_string(),
			..Default::default()
		};

		match geolocation::resolve(&self.db, &self.locator, &address.host).await {
			Ok(location) => node.location = location,
			Err(error) => {
				info!(node_address = rpc_address, "Failed to get node geolocation: {error}");
			},
		}

		let outcome = match self.fetch_metadata(rpc_address, &mut node).await {
			Ok(peers) => CrawlOutcome::Crawled { peers },
			Err(error @ Error::Protocol(_)) => {
				info!(node_address = rpc_address, node_id = %node.id, "{error}");
				CrawlOutcome::Partial
			},
			Err(error) => {
				warn!(node_address = rpc_address, node_id = %node.id, "{error}");
				return CrawlOutcome::Abandoned;
			},
		};

		match self.persist(rpc_address, node) {
			Ok(node_id) => {
				info!(node_address = rpc_address, node_id = %node_id, "Successfully crawled and persisted node");
				outcome
			},
			Err(error) => {
				warn!(node_address = rpc_address, "Failed to persist node: {error}");
				CrawlOutcome::Abandoned
			},
		}
	}

	async fn probe(&self, address: &RpcAddress) -> Result<(), Error> {
		let p2p_address = address.p2p_address(self.config.p2p_port);
		if self
			.prober
			.probe(&p2p_address, self.config.probe_timeout)
			.await
		{
			Ok(())
		} else {
			Err(Error::Unreachable(p2p_address))
		}
	}

	/// Fills node metadata and adds its unknown peers to the pool.
	/// Returns number of peers added to the pool.
	async fn fetch_metadata(&mut self, rpc_address: &str, node: &mut Node) -> Result<usize, Error> {
		let status = self
			.node_client
			.status(rpc_address)
			.await
			.map_err(Error::Protocol)?;

		let node_info = status.node_info;
		node.id = node_info.id;
		node.moniker = node_info.moniker;
		node.network = node_info.network;
		node.version = node_info.version;
		node.tx_index = node_info.other.tx_index;

		let net_info = self
			.node_client
			.net_info(rpc_address)
			.await
			.map_err(Error::Protocol)?;

		let mut added = 0;
		for peer in net_info.peers {
			if peer.remote_ip.is_empty() {
				continue;
			}
			let peer_address = peer_rpc_address(&peer.remote_ip, &peer.node_info.other.rpc_address);

			// only add peer to the pool if it wasn't discovered before
			match self.is_known(&peer_address, &peer) {
				Ok(true) => continue,
				Ok(false) => {},
				Err(error) => {
					warn!(node_address = %peer_address, "Failed to check peer: {error}");
					continue;
				},
			}

			if !self.pool.has(&peer_address) {
				added += 1;
			}
			self.pool.add(&peer_address);
		}

		Ok(added)
	}

	fn is_known(&self, peer_address: &str, peer: &Peer) -> Result<bool, Error> {
		let peer_id = &peer.node_info.id;
		if !peer_id.is_empty() && self.db.has(NodeKey(peer_id.clone()))? {
			return Ok(true);
		}
		Ok(self.db.has(AddressKey(peer_address.to_string()))?)
	}

	/// Persists node under its ID, or under its RPC address if ID is unknown.
	/// Returns identity the node is stored under.
	fn persist(&self, rpc_address: &str, mut node: Node) -> Result<String, Error> {
		node.last_sync = Some(Utc::now());
		let previous = self.db.get(AddressKey(rpc_address.to_string()))?;

		let identity = match previous {
			_ if node.has_identity() => node.id.clone(),
			// keep the identity of a known node if only the status query failed
			Some(identity) if identity != rpc_address => {
				match self.db.get(NodeKey(identity.clone()))? {
					Some(known) if located_at(&known, &node.address, &node.rpc_port) => {
						node.id = known.id;
						node.moniker = known.moniker;
						node.network = known.network;
						node.version = known.version;
						node.tx_index = known.tx_index;
						identity
					},
					// known node is gone or has moved to another address
					_ => rpc_address.to_string(),
				}
			},
			_ => rpc_address.to_string(),
		};

		self.db.put(NodeKey(identity.clone()), &node)?;
		self.db
			.put(AddressKey(rpc_address.to_string()), &identity)?;

		if identity != rpc_address && self.db.has(NodeKey(rpc_address.to_string()))? {
			self.db.delete(NodeKey(rpc_address.to_string()))?;
		}

		Ok(identity)
	}

	/// Removes node record known by the RPC address. Returns `true` if a record was removed.
	///
	/// Record referenced by the address alias is removed only if the node is still
	/// located at the address, the alias itself is always removed.
	fn remove_node(&self, rpc_address: &str, address: &RpcAddress) -> Result<bool, Error> {
		let mut removed = false;

		if let Some(identity) = self.db.get(AddressKey(rpc_address.to_string()))? {
			let known = self.db.get(NodeKey(identity.clone()))?;
			if known.is_some_and(|node| located_at(&node, &address.host, &address.rpc_port())) {
				self.db.delete(NodeKey(identity))?;
				removed = true;
			}
			self.db.delete(AddressKey(rpc_address.to_string()))?;
		}

		if self.db.has(NodeKey(rpc_address.to_string()))? {
			self.db.delete(NodeKey(rpc_address.to_string()))?;
			removed = true;
		}

		Ok(removed)
	}
}

fn located_at(node: &Node, host: &str, rpc_port: &str) -> bool {
	node.address == host && node.rpc_port == rpc_port
}
