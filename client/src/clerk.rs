use crate::config::ClerkConfig;
use api::error::KvError;
use api::kv_service::KvService;
use api::transport::Delivery;
use api::types::{GetRequest, KeyVersion, PutRequest};
use log::{debug, trace};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// Backoff never grows past this, regardless of attempt count.
const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Client-side stub for the versioned KV service, implementing its retry state machine.
///
/// A `Clerk` owns a stable, randomly generated identity and a monotonically increasing
/// sequence counter; the pair names every logical request it issues. Retrying the same logical
/// request always reuses the same `seq`, which is what lets the server's reply cache collapse
/// repeated attempts into a single user-visible effect.
///
/// Safe for concurrent use by multiple callers: the sequence counter is allocated atomically,
/// and no other per-`Clerk` state mutates on the hot path.
pub struct Clerk {
	service: Arc<dyn KvService>,
	config: ClerkConfig,
	client_id: String,
	seq: AtomicU64,
}

impl Clerk {
	/// Creates a Clerk talking to `service`, with default retry configuration.
	pub fn new(service: Arc<dyn KvService>) -> Self {
		Self::with_config(service, ClerkConfig::default())
	}

	/// Creates a Clerk talking to `service` with an explicit retry configuration.
	pub fn with_config(service: Arc<dyn KvService>, config: ClerkConfig) -> Self {
		Self { service, config, client_id: Uuid::new_v4().to_string(), seq: AtomicU64::new(0) }
	}

	/// The identity this Clerk presents on every RPC. Stable for the Clerk's lifetime.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Allocates a fresh sequence number for one logical operation. Every retry of that
	/// operation must reuse the same value, so the server's reply cache can collapse them.
	fn next_seq(&self) -> u64 {
		self.seq.fetch_add(1, Ordering::SeqCst) + 1
	}

	/// Exponential backoff with base `retry_delay`, doubled per attempt, capped at one second,
	/// plus up to 10% jitter.
	fn backoff_delay(&self, attempt: u32) -> Duration {
		let base = self.config.retry_delay.as_secs_f64();
		let capped = (base * 2f64.powi(attempt as i32)).min(MAX_BACKOFF.as_secs_f64());
		let jitter = capped * 0.1 * rand::thread_rng().gen::<f64>();
		Duration::from_secs_f64(capped + jitter)
	}

	/// Fetches `(value, version)` for `key`.
	///
	/// Fails with [`KvError::NoKey`] if the key is absent, or [`KvError::Timeout`] if every
	/// attempt within `max_retries` is dropped. Never returns [`KvError::Maybe`]: a read has no
	/// externally visible effect, so there is nothing ambiguous to surface.
	pub async fn get(&self, key: &str) -> Result<KeyVersion, KvError> {
		let seq = self.next_seq();
		for attempt in 0..self.config.max_retries {
			let request = GetRequest { key: key.to_string(), client_id: self.client_id.clone(), seq };
			trace!("get {key} attempt {attempt} ({}, seq={seq})", self.client_id);
			match self.service.get(request).await.into_option() {
				Some(reply) => return reply,
				None => sleep(self.backoff_delay(attempt as u32)).await,
			}
		}
		debug!("get {key} exhausted {} retries without a reply", self.config.max_retries);
		Err(KvError::Timeout)
	}

	/// Performs a version-checked write.
	///
	/// Implements the retry state machine at the heart of the at-most-once contract:
	///
	/// - `Ok` replies return immediately.
	/// - `NoKey` is terminal.
	/// - `Version` on the *first* attempt is a real mismatch and is terminal.
	/// - `Version` after any dropped attempt is reclassified as [`KvError::Maybe`]: a prior
	///   attempt's reply may have been lost after the server already applied it.
	/// - Exhausting all retries without a terminal reply is also [`KvError::Maybe`].
	pub async fn put(&self, key: &str, value: &str, version: u64) -> Result<(), KvError> {
		let seq = self.next_seq();
		let mut first = true;
		for attempt in 0..self.config.max_retries {
			let request = PutRequest {
				key: key.to_string(),
				value: value.to_string(),
				version,
				client_id: self.client_id.clone(),
				seq,
			};
			trace!("put {key} attempt {attempt} ({}, seq={seq}, first={first})", self.client_id);
			match self.service.put(request).await.into_option() {
				Some(Ok(())) => return Ok(()),
				Some(Err(KvError::NoKey)) => return Err(KvError::NoKey),
				Some(Err(KvError::Version)) if first => return Err(KvError::Version),
				Some(Err(KvError::Version)) => {
					debug!("put {key} saw Version after a retry; reclassifying as Maybe");
					return Err(KvError::Maybe);
				},
				Some(Err(other)) => return Err(other),
				None => {
					first = false;
					sleep(self.backoff_delay(attempt as u32)).await;
				},
			}
		}
		debug!("put {key} exhausted {} retries without a terminal reply", self.config.max_retries);
		Err(KvError::Maybe)
	}

	/// `put(key, value, expected)`, but a version mismatch is reported as `Ok(false)` instead
	/// of [`KvError::Version`]. Other errors propagate.
	pub async fn conditional_put(
		&self, key: &str, value: &str, expected: u64,
	) -> Result<bool, KvError> {
		match self.put(key, value, expected).await {
			Ok(()) => Ok(true),
			Err(KvError::Version) => Ok(false),
			Err(err) => Err(err),
		}
	}

	/// `put(key, value, 0)`, returning `Ok(false)` instead of [`KvError::Version`] when the key
	/// already exists.
	pub async fn create_if_missing(&self, key: &str, value: &str) -> Result<bool, KvError> {
		match self.put(key, value, 0).await {
			Ok(()) => Ok(true),
			Err(KvError::Version) => Ok(false),
			Err(err) => Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use api::kv_service::KvService;
	use api::types::{GetReply, PutReply};
	use async_trait::async_trait;
	use server::InMemoryKvServer;
	use std::sync::atomic::AtomicUsize;

	#[tokio::test]
	async fn round_trip_create_then_update() {
		let clerk = Clerk::new(Arc::new(InMemoryKvServer::new()));

		assert!(clerk.create_if_missing("hello", "world").await.unwrap());
		let kv = clerk.get("hello").await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("world", 1));

		clerk.put("hello", "universe", 1).await.unwrap();
		let kv = clerk.get("hello").await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("universe", 2));
	}

	#[tokio::test]
	async fn get_on_missing_key_is_no_key() {
		let clerk = Clerk::new(Arc::new(InMemoryKvServer::new()));
		assert_eq!(clerk.get("nope").await.unwrap_err(), KvError::NoKey);
	}

	#[tokio::test]
	async fn conditional_put_reports_version_mismatch_as_false() {
		let clerk = Clerk::new(Arc::new(InMemoryKvServer::new()));
		clerk.create_if_missing("k", "v0").await.unwrap();
		assert!(!clerk.conditional_put("k", "v1", 99).await.unwrap());
	}

	#[tokio::test]
	async fn create_if_missing_is_false_when_key_already_exists() {
		let clerk = Clerk::new(Arc::new(InMemoryKvServer::new()));
		assert!(clerk.create_if_missing("k", "v0").await.unwrap());
		assert!(!clerk.create_if_missing("k", "v1").await.unwrap());
	}

	/// A [`KvService`] double that drops the first `N` request-side deliveries before
	/// forwarding to a shared [`InMemoryKvServer`], used to exercise the Clerk's retry machine
	/// and `Maybe` reclassification deterministically.
	struct FlakyService {
		inner: Arc<InMemoryKvServer>,
		drops_remaining: AtomicUsize,
	}

	impl FlakyService {
		fn new(drops: usize) -> Self {
			Self::wrapping(Arc::new(InMemoryKvServer::new()), drops)
		}

		fn wrapping(inner: Arc<InMemoryKvServer>, drops: usize) -> Self {
			Self { inner, drops_remaining: AtomicUsize::new(drops) }
		}

		fn take_drop(&self) -> bool {
			self.drops_remaining
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
					(remaining > 0).then_some(remaining - 1)
				})
				.is_ok()
		}
	}

	#[async_trait]
	impl KvService for FlakyService {
		async fn get(&self, request: GetRequest) -> Delivery<GetReply> {
			if self.take_drop() {
				return Delivery::Dropped;
			}
			self.inner.get(request).await
		}

		async fn put(&self, request: PutRequest) -> Delivery<PutReply> {
			if self.take_drop() {
				return Delivery::Dropped;
			}
			self.inner.put(request).await
		}
	}

	#[tokio::test]
	async fn put_survives_dropped_requests_and_still_applies_once() {
		let service = Arc::new(FlakyService::new(3));
		let config = ClerkConfig { max_retries: 10, retry_delay: Duration::from_millis(1) };
		let clerk = Clerk::with_config(service, config);

		clerk.put("k", "v", 0).await.unwrap();
		let kv = clerk.get("k").await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("v", 1));
	}

	#[tokio::test]
	async fn put_reclassifies_post_retry_version_conflict_as_maybe() {
		// The racer's first attempt is dropped before reaching the server (first <- false);
		// while it backs off, an independent writer advances the key's version. The racer's
		// retry then observes a Version mismatch it cannot attribute to "someone else instead
		// of me" -- its own first attempt never landed, yet the version moved -- so it must
		// surface Maybe rather than the misleading Version.
		let inner = Arc::new(InMemoryKvServer::new());
		let setup = Clerk::new(Arc::clone(&inner) as Arc<dyn KvService>);
		setup.create_if_missing("k", "v0").await.unwrap();

		let flaky = Arc::new(FlakyService::wrapping(Arc::clone(&inner), 1));
		let racer_config = ClerkConfig { max_retries: 2, retry_delay: Duration::from_millis(20) };
		let racer = Clerk::with_config(flaky, racer_config);

		let other = Clerk::new(Arc::clone(&inner) as Arc<dyn KvService>);
		let racing_write = tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(5)).await;
			other.put("k", "from-other", 1).await.unwrap();
		});

		let outcome = racer.put("k", "from-racer", 1).await;
		racing_write.await.unwrap();

		assert_eq!(outcome.unwrap_err(), KvError::Maybe);
		let kv = Clerk::new(inner as Arc<dyn KvService>).get("k").await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("from-other", 2));
	}

	#[tokio::test]
	async fn get_times_out_when_every_attempt_is_dropped() {
		let service = Arc::new(FlakyService::new(usize::MAX));
		let config = ClerkConfig { max_retries: 3, retry_delay: Duration::from_millis(1) };
		let clerk = Clerk::with_config(service, config);
		assert_eq!(clerk.get("k").await.unwrap_err(), KvError::Timeout);
	}
}
