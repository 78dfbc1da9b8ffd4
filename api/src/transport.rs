/// The outcome of carrying one RPC across the (out-of-scope) transport.
///
/// A [`KvService`] simulates an unreliable channel by returning `Dropped` instead of a reply, at
/// either of two checkpoints: before the request would be read, or after the reply would be
/// written. The latter case still executes (and, for `Put`, still mutates state and populates
/// the reply cache) — only the delivery of the reply back to the caller is lost, which is the
/// scenario the reply cache exists to make safe to retry.
///
/// [`KvService`]: crate::kv_service::KvService
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery<T> {
	/// The RPC was serviced and its reply delivered.
	Delivered(T),
	/// The request or its reply was dropped before reaching the caller.
	Dropped,
}

impl<T> Delivery<T> {
	/// Returns the delivered reply, or `None` if the RPC was dropped.
	pub fn into_option(self) -> Option<T> {
		match self {
			Delivery::Delivered(reply) => Some(reply),
			Delivery::Dropped => None,
		}
	}
}
