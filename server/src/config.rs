use serde::Deserialize;

/// Default probability of a drop at each of [`InMemoryKvServer`]'s two checkpoints once
/// [`unreliable`] is enabled.
///
/// [`InMemoryKvServer`]: crate::in_memory_server::InMemoryKvServer
/// [`unreliable`]: ServerConfig::unreliable
const DEFAULT_DROP_RATE: f64 = 0.1;

/// Configures [`InMemoryKvServer`]'s drop simulation.
///
/// [`InMemoryKvServer`]: crate::in_memory_server::InMemoryKvServer
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ServerConfig {
	/// Whether request/reply drops are simulated at all. When `false`, `drop_rate` is ignored
	/// and every RPC is delivered.
	pub unreliable: bool,
	/// Probability in `[0, 1]` of a drop at each of the two checkpoints (before servicing a
	/// request, after writing its reply) when `unreliable` is `true`.
	pub drop_rate: f64,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { unreliable: false, drop_rate: DEFAULT_DROP_RATE }
	}
}
