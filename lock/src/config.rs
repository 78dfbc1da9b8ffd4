use serde::Deserialize;
use std::time::Duration;

/// Default sleep between acquire attempts. Short enough to acquire a just-released lock with
/// little added latency, long enough that a crowd of waiters polling the same name doesn't
/// hammer the server.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Configures a [`Lock`](crate::lock::Lock)'s acquire backoff.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LockConfig {
	/// Sleep between acquire attempts when the lock is observed held by someone else, or
	/// between release retries on a version race.
	#[serde(with = "duration_millis")]
	pub retry_delay: Duration,
}

impl Default for LockConfig {
	fn default() -> Self {
		Self { retry_delay: DEFAULT_RETRY_DELAY }
	}
}

mod duration_millis {
	use serde::{Deserialize, Deserializer};
	use std::time::Duration;

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		let millis = u64::deserialize(deserializer)?;
		Ok(Duration::from_millis(millis))
	}
}
