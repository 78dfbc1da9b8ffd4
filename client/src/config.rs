use serde::Deserialize;
use std::time::Duration;

/// Default upper bound on attempts per logical RPC. High enough that a handful of dropped
/// messages in a row doesn't surface `Timeout`/`Maybe` to the caller, low enough that a truly
/// stuck channel fails fast instead of retrying forever.
const DEFAULT_MAX_RETRIES: usize = 10;

/// Default base for exponential backoff. Short enough to keep retry latency low under
/// occasional drops, long enough that a burst of retries from one caller doesn't flood the
/// server.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Configures a [`Clerk`](crate::clerk::Clerk)'s retry behavior.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ClerkConfig {
	/// Upper bound on attempts per logical RPC before `get` raises
	/// [`KvError::Timeout`](api::error::KvError::Timeout) or `put` raises
	/// [`KvError::Maybe`](api::error::KvError::Maybe).
	pub max_retries: usize,
	/// Base delay for exponential backoff, doubled per attempt and capped at one second, plus
	/// jitter.
	#[serde(with = "duration_millis")]
	pub retry_delay: Duration,
}

impl Default for ClerkConfig {
	fn default() -> Self {
		Self { max_retries: DEFAULT_MAX_RETRIES, retry_delay: DEFAULT_RETRY_DELAY }
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
