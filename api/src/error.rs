use std::error::Error;
use std::fmt::{Display, Formatter};

/// The closed outcome taxonomy shared by server replies and client-visible errors.
///
/// `NoKey` and `Version` originate at the server and are part of the reply encoding for
/// [`PutReply`]/[`GetReply`]; [`error::KvError::Maybe`] and [`error::KvError::Timeout`] are
/// never produced by the server and exist only once a [`crate::kv_service::KvService`] caller
/// has exhausted retries over an unreliable channel.
///
/// [`PutReply`]: crate::types::PutReply
/// [`GetReply`]: crate::types::GetReply
/// [`error::KvError::Maybe`]: KvError::Maybe
/// [`error::KvError::Timeout`]: KvError::Timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvError {
	/// A key was required but absent, or a create (`version == 0`) was attempted against an
	/// existing key.
	NoKey,

	/// The caller's expected version did not match the version currently stored for the key.
	Version,

	/// The outcome is unknown: the write may or may not have been applied. Surfaced only by a
	/// retrying caller, never by the server itself.
	Maybe,

	/// A read exhausted its retries without ever receiving a reply.
	Timeout,
}

impl Display for KvError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			KvError::NoKey => write!(f, "key does not exist"),
			KvError::Version => write!(f, "version mismatch"),
			KvError::Maybe => write!(f, "outcome unknown: write may or may not have applied"),
			KvError::Timeout => write!(f, "operation timed out after exhausting retries"),
		}
	}
}

impl Error for KvError {}
