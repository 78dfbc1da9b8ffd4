use crate::config::LockConfig;
use crate::error::LockError;
use api::error::KvError;
use client::Clerk;
use log::{debug, trace};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// A distributed mutual-exclusion primitive keyed by a name, built entirely on [`Clerk`]'s
/// public operations.
///
/// The KV entry at `lock_name` carries the identity of the current holder: the empty string
/// means released, an absent key means the lock has never been used. `owner_id` is the owning
/// Clerk's `client_id`, so two `Lock`s constructed from the same Clerk share ownership and see
/// each other as already held; `Lock`s built from distinct Clerks are distinct, competing
/// owners.
///
/// `held_locally` is an advisory local mirror guarded by its own mutex. It exists only to
/// short-circuit re-entry by this instance and to detect a mis-released lock; the KV entry
/// remains the source of truth.
pub struct Lock {
	clerk: Arc<Clerk>,
	lock_name: String,
	owner_id: String,
	config: LockConfig,
	held_locally: Mutex<bool>,
}

impl Lock {
	/// Creates a lock named `lock_name`, owned by `clerk`'s identity, with default backoff.
	pub fn new(clerk: Arc<Clerk>, lock_name: impl Into<String>) -> Self {
		Self::with_config(clerk, lock_name, LockConfig::default())
	}

	/// Creates a lock named `lock_name` with an explicit acquire-backoff configuration.
	pub fn with_config(clerk: Arc<Clerk>, lock_name: impl Into<String>, config: LockConfig) -> Self {
		let owner_id = clerk.client_id().to_string();
		Self { clerk, lock_name: lock_name.into(), owner_id, config, held_locally: Mutex::new(false) }
	}

	/// The name this lock was constructed with.
	pub fn name(&self) -> &str {
		&self.lock_name
	}

	/// Whether this instance currently believes it holds the lock. Advisory only; the KV entry
	/// at `lock_name` is authoritative. See [`Lock::check_lock_state`] for that.
	pub async fn is_locked(&self) -> bool {
		*self.held_locally.lock().await
	}

	/// Reads the KV entry directly and returns the current holder's identity, `None` if
	/// released or never used. Unlike [`Lock::is_locked`], this always issues a fresh `Get`.
	pub async fn check_lock_state(&self) -> Result<Option<String>, LockError> {
		match self.clerk.get(&self.lock_name).await {
			Ok(kv) => Ok(if kv.value.is_empty() { None } else { Some(kv.value) }),
			Err(KvError::NoKey) => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	/// Attempts to acquire the lock, retrying with backoff until `timeout` elapses.
	///
	/// `timeout = None` waits forever. Returns `Ok(true)` once `held_locally` is set,
	/// `Ok(false)` if the deadline passes first (no side effects beyond KV entries this
	/// instance did not end up owning).
	pub async fn acquire(&self, timeout: Option<Duration>) -> Result<bool, LockError> {
		if *self.held_locally.lock().await {
			return Ok(true);
		}

		let deadline = timeout.map(|d| Instant::now() + d);
		loop {
			if self.try_acquire_once().await? {
				return Ok(true);
			}
			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Ok(false);
				}
			}
			sleep(self.config.retry_delay).await;
			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Ok(false);
				}
			}
		}
	}

	/// One pass of the acquire protocol: create-if-missing, else inspect the entry and either
	/// steal a released lock, wait on a held one, or probe state after a `Maybe`. Returns
	/// `Ok(true)` only once `held_locally` has been set.
	async fn try_acquire_once(&self) -> Result<bool, LockError> {
		match self.clerk.create_if_missing(&self.lock_name, &self.owner_id).await {
			Ok(true) => {
				trace!("lock {}: created by {}", self.lock_name, self.owner_id);
				return Ok(self.mark_held().await);
			},
			Ok(false) => {},
			Err(KvError::Maybe) => return self.probe_after_maybe().await,
			Err(err) => return Err(err.into()),
		}

		match self.clerk.get(&self.lock_name).await {
			Err(KvError::NoKey) => Ok(false), // wiped between create and get; restart the loop
			Err(err) => Err(err.into()),
			Ok(kv) if kv.value == self.owner_id => {
				trace!("lock {}: already recorded as held by us", self.lock_name);
				Ok(self.mark_held().await)
			},
			Ok(kv) if kv.value.is_empty() => {
				match self.clerk.conditional_put(&self.lock_name, &self.owner_id, kv.version).await {
					Ok(true) => Ok(self.mark_held().await),
					Ok(false) => Ok(false), // someone else won the race; restart the loop
					Err(KvError::Maybe) => self.probe_after_maybe().await,
					Err(err) => Err(err.into()),
				}
			},
			Ok(_held_by_other) => Ok(false),
		}
	}

	/// After a `Maybe`, a fresh `Get` is the only way to tell whether our write landed.
	async fn probe_after_maybe(&self) -> Result<bool, LockError> {
		match self.clerk.get(&self.lock_name).await {
			Ok(kv) if kv.value == self.owner_id => Ok(self.mark_held().await),
			Ok(_) | Err(KvError::NoKey) => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	async fn mark_held(&self) -> bool {
		*self.held_locally.lock().await = true;
		true
	}

	/// Releases the lock, retrying until the KV entry reflects a non-owner state.
	///
	/// Raises [`LockError::NotHeld`] without touching the KV entry if this instance does not
	/// believe it holds the lock. Has no timeout: a racing writer can only ever delay this
	/// loop, never block it forever, because every retry re-reads the entry first.
	pub async fn release(&self) -> Result<(), LockError> {
		{
			let mut held = self.held_locally.lock().await;
			if !*held {
				return Err(LockError::NotHeld);
			}
			*held = false;
		}

		loop {
			let kv = match self.clerk.get(&self.lock_name).await {
				Ok(kv) => kv,
				Err(KvError::NoKey) => return Ok(()),
				Err(err) => return Err(err.into()),
			};
			if kv.value != self.owner_id {
				return Ok(());
			}

			match self.clerk.put(&self.lock_name, "", kv.version).await {
				Ok(()) => return Ok(()),
				Err(KvError::NoKey) => return Ok(()),
				Err(KvError::Version) => continue,
				Err(KvError::Maybe) => {
					match self.clerk.get(&self.lock_name).await {
						Ok(after) if after.value != self.owner_id => return Ok(()),
						Ok(_) => continue,
						Err(KvError::NoKey) => return Ok(()),
						Err(err) => return Err(err.into()),
					}
				},
				Err(err) => return Err(err.into()),
			}
		}
	}

	/// Acquires the lock (waiting forever) and returns a [`LockGuard`] that releases it on
	/// `Drop`, the idiomatic analogue of the original's `with` block.
	pub async fn acquire_guarded(self: &Arc<Self>) -> Result<LockGuard, LockError> {
		self.acquire(None).await?;
		Ok(LockGuard { lock: Arc::clone(self) })
	}
}

/// RAII guard returned by [`Lock::acquire_guarded`]. Releases the lock when dropped.
///
/// Drop cannot run async code, so release happens on a spawned task; this mirrors what any
/// synchronous `Drop`-based guard over an async resource must do, and means the lock is not
/// guaranteed released by the time the guard's `Drop` returns — callers needing that guarantee
/// should call [`Lock::release`] directly instead of relying on the guard.
pub struct LockGuard {
	lock: Arc<Lock>,
}

impl Drop for LockGuard {
	fn drop(&mut self) {
		let lock = Arc::clone(&self.lock);
		tokio::spawn(async move {
			if let Err(err) = lock.release().await {
				debug!("lock {}: release on drop failed: {err}", lock.lock_name);
			}
		});
	}
}
