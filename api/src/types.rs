use crate::error::KvError;
use serde::{Deserialize, Serialize};

/// Request payload for the `Get` RPC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
	/// The key to fetch.
	pub key: String,
	/// Identity of the issuing Clerk, used for reply-cache deduplication.
	pub client_id: String,
	/// Per-Clerk sequence number naming this logical request, strictly increasing.
	pub seq: u64,
}

/// The value and version fetched by a successful `Get`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVersion {
	/// The stored value.
	pub value: String,
	/// The stored version. Always `>= 1` for a present key.
	pub version: u64,
}

/// Server reply to a `Get` RPC: the value and version, or [`KvError::NoKey`].
///
/// `Get` never returns [`KvError::Version`], [`KvError::Maybe`], or [`KvError::Timeout`] — those
/// are either meaningless for a read (`Version`) or introduced only by the Clerk's retry layer
/// (`Maybe`, `Timeout`), never by the server.
pub type GetReply = Result<KeyVersion, KvError>;

/// Request payload for the `Put` RPC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
	/// The key to write.
	pub key: String,
	/// The value to store.
	pub value: String,
	/// The version the caller last observed for this key, or `0` to create.
	pub version: u64,
	/// Identity of the issuing Clerk, used for reply-cache deduplication.
	pub client_id: String,
	/// Per-Clerk sequence number naming this logical request, strictly increasing.
	pub seq: u64,
}

/// Server reply to a `Put` RPC: success, or [`KvError::NoKey`] / [`KvError::Version`].
///
/// As with [`GetReply`], `Put` never yields [`KvError::Maybe`] or [`KvError::Timeout`] at the
/// server — those are introduced by the Clerk when it cannot tell whether a dropped attempt
/// executed.
pub type PutReply = Result<(), KvError>;
