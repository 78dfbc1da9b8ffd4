use crate::transport::Delivery;
use crate::types::{GetReply, GetRequest, PutReply, PutRequest};
use async_trait::async_trait;

/// An interface that must be implemented by every backend of the versioned KV service.
///
/// Implementations own the `key -> (value, version)` map and the `(client_id, seq)` reply
/// cache: before performing any mutation, a `put` must consult the reply cache and, on a hit,
/// return the cached reply verbatim without touching state. The cache write and the state
/// mutation it covers must happen under the same critical section, so that every retry of the
/// same logical request observes the first execution's result.
#[async_trait]
pub trait KvService: Send + Sync {
	/// Fetches `(value, version)` for `request.key`, or [`crate::error::KvError::NoKey`].
	///
	/// A `get` is read-only. Caching its reply under `(client_id, seq)` is permitted but not
	/// required — an implementation that does must still return the cached snapshot (not a
	/// fresh read) on a cache hit, so concurrent tests observing reordering see idempotence.
	async fn get(&self, request: GetRequest) -> Delivery<GetReply>;

	/// Performs a version-checked write, per the following decision table:
	/// absent key + `version == 0` creates at version 1; absent key + `version != 0` is
	/// [`crate::error::KvError::NoKey`]; present key + matching version advances by exactly
	/// `+1`; present key + mismatched version is [`crate::error::KvError::Version`].
	async fn put(&self, request: PutRequest) -> Delivery<PutReply>;
}
