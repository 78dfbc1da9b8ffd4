use crate::config::ServerConfig;
use api::error::KvError;
use api::kv_service::KvService;
use api::transport::Delivery;
use api::types::{GetReply, GetRequest, KeyVersion, PutReply, PutRequest};
use async_trait::async_trait;
use log::trace;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A cached reply, tagged by the RPC that produced it so a `(client_id, seq)` collision across
/// `Get` and `Put` (which a well-behaved Clerk never produces, since it allocates one `seq` per
/// logical operation, but which the type system does not otherwise rule out) cannot be served
/// back as the wrong kind of reply.
#[derive(Clone)]
enum CachedReply {
	Get(GetReply),
	Put(PutReply),
}

struct State {
	data: HashMap<String, (String, u64)>,
	reply_cache: HashMap<(String, u64), CachedReply>,
}

/// Diagnostic snapshot returned by [`InMemoryKvServer::stats`]. Carries no protocol meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerStats {
	/// Number of distinct keys currently stored.
	pub num_keys: usize,
	/// Number of `(client_id, seq)` pairs currently held in the reply cache.
	pub cached_replies: usize,
}

/// The sole [`KvService`] backend this workspace ships: an in-memory `key -> (value, version)`
/// map guarded by a single [`tokio::sync::Mutex`]. Keys are not sharded across separate locks;
/// one server-wide critical section keeps the implementation simple and is cheap enough given
/// how briefly the lock is ever held.
///
/// Every mutation and every reply-cache lookup happens under that one lock, so the cache write
/// and the state mutation it covers are always in the same critical section: a retry of the
/// same `(client_id, seq)` is guaranteed to observe the first execution's result.
pub struct InMemoryKvServer {
	state: Mutex<State>,
	config: Mutex<ServerConfig>,
}

impl InMemoryKvServer {
	/// Creates an empty, reliable server.
	pub fn new() -> Self {
		Self::with_config(ServerConfig::default())
	}

	/// Creates an empty server with the given drop-simulation configuration.
	pub fn with_config(config: ServerConfig) -> Self {
		Self {
			state: Mutex::new(State { data: HashMap::new(), reply_cache: HashMap::new() }),
			config: Mutex::new(config),
		}
	}

	/// Reconfigures drop simulation on a running server, so a test can flip a previously
	/// reliable server unreliable (or vice versa) without tearing it down.
	pub async fn set_unreliable(&self, unreliable: bool, drop_rate: f64) {
		let mut config = self.config.lock().await;
		config.unreliable = unreliable;
		config.drop_rate = drop_rate;
	}

	/// Returns the current key count and reply-cache size. Read-only; has no effect on
	/// protocol state.
	pub async fn stats(&self) -> ServerStats {
		let state = self.state.lock().await;
		ServerStats { num_keys: state.data.len(), cached_replies: state.reply_cache.len() }
	}

	async fn should_drop(&self) -> bool {
		let config = self.config.lock().await;
		if !config.unreliable {
			return false;
		}
		rand::thread_rng().gen_bool(config.drop_rate.clamp(0.0, 1.0))
	}
}

impl Default for InMemoryKvServer {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl KvService for InMemoryKvServer {
	async fn get(&self, request: GetRequest) -> Delivery<GetReply> {
		if self.should_drop().await {
			trace!("dropping request: get {} from {}:{}", request.key, request.client_id, request.seq);
			return Delivery::Dropped;
		}

		let cache_key = (request.client_id.clone(), request.seq);
		let mut state = self.state.lock().await;

		let reply = if let Some(CachedReply::Get(cached)) = state.reply_cache.get(&cache_key) {
			cached.clone()
		} else {
			let reply = match state.data.get(&request.key) {
				Some((value, version)) => Ok(KeyVersion { value: value.clone(), version: *version }),
				None => Err(KvError::NoKey),
			};
			if !request.client_id.is_empty() {
				state.reply_cache.insert(cache_key, CachedReply::Get(reply.clone()));
			}
			reply
		};
		drop(state);

		if self.should_drop().await {
			trace!("dropping reply: get {} to {}:{}", request.key, request.client_id, request.seq);
			return Delivery::Dropped;
		}
		Delivery::Delivered(reply)
	}

	async fn put(&self, request: PutRequest) -> Delivery<PutReply> {
		if self.should_drop().await {
			trace!("dropping request: put {} from {}:{}", request.key, request.client_id, request.seq);
			return Delivery::Dropped;
		}

		let cache_key = (request.client_id.clone(), request.seq);
		let mut state = self.state.lock().await;

		let reply = if let Some(CachedReply::Put(cached)) = state.reply_cache.get(&cache_key) {
			*cached
		} else {
			let reply = match state.data.get(&request.key).cloned() {
				None if request.version != 0 => Err(KvError::NoKey),
				None => {
					state.data.insert(request.key.clone(), (request.value.clone(), 1));
					Ok(())
				},
				Some((_, current_version)) if request.version != current_version => {
					Err(KvError::Version)
				},
				Some((_, current_version)) => {
					state.data.insert(request.key.clone(), (request.value.clone(), current_version + 1));
					Ok(())
				},
			};
			if !request.client_id.is_empty() {
				state.reply_cache.insert(cache_key, CachedReply::Put(reply));
			}
			reply
		};
		drop(state);

		if self.should_drop().await {
			trace!("dropping reply: put {} to {}:{}", request.key, request.client_id, request.seq);
			return Delivery::Dropped;
		}
		Delivery::Delivered(reply)
	}
}
