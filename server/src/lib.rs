//! Hosts the in-memory implementation of the versioned KV service described by `api`.
//!
//! [`InMemoryKvServer`] owns the `key -> (value, version)` map and the `(client_id, seq)` reply
//! cache that together give the Clerk its at-most-once guarantee. It can optionally simulate an
//! unreliable channel, dropping a request or its reply with independent probability at each of
//! two checkpoints, which is what the Clerk's retry machine is built to survive.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// Contains [`config::ServerConfig`], the drop-simulation knobs for [`in_memory_server`].
pub mod config;

/// Contains [`in_memory_server::InMemoryKvServer`], the sole [`api::kv_service::KvService`]
/// backend this workspace ships.
pub mod in_memory_server;

#[macro_use]
extern crate api;

pub use config::ServerConfig;
pub use in_memory_server::{InMemoryKvServer, ServerStats};
