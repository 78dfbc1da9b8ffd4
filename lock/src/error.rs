use api::error::KvError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures that originate in the lock layer itself rather than in the KV protocol it is built
/// on.
///
/// `Propagated` carries a [`KvError`] surfaced verbatim from the underlying Clerk; it is not a
/// new outcome, just a wrapper so [`crate::lock::Lock::acquire`] and
/// [`crate::lock::Lock::release`] have a single error type to return. `NotHeld` is purely
/// local: releasing a lock this instance never acquired is a caller bug, not a protocol
/// outcome, and is detected before any RPC is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
	/// [`Lock::release`](crate::lock::Lock::release) was called while `held_locally` was
	/// `false`. The KV entry is left untouched.
	NotHeld,
	/// A [`KvError`] raised by the underlying Clerk that the lock protocol could not resolve
	/// by retrying or probing state.
	Propagated(KvError),
}

impl Display for LockError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			LockError::NotHeld => write!(f, "lock is not held by this instance"),
			LockError::Propagated(err) => write!(f, "{err}"),
		}
	}
}

impl Error for LockError {}

impl From<KvError> for LockError {
	fn from(err: KvError) -> Self {
		LockError::Propagated(err)
	}
}
