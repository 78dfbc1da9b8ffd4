//! Hosts the Clerk, the client-side stub for the versioned KV service described by `api`.
//!
//! A Clerk owns a stable identity and a sequence counter, and wraps every RPC with retry,
//! exponential backoff, and the rules that decide whether a dropped reply could mean a write
//! already landed. It knows nothing about locks; `lock` builds on top of it using only these
//! public operations.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// Contains [`clerk::Clerk`], the client stub implementing the at-most-once retry protocol.
pub mod clerk;

/// Contains [`config::ClerkConfig`], a Clerk's retry/backoff configuration.
pub mod config;

pub use clerk::Clerk;
pub use config::ClerkConfig;
