//! Hosts the distributed lock built purely on `client::Clerk`'s public operations.
//!
//! A [`lock::Lock`] is a well-known KV entry whose value names the current holder (empty string
//! = released). Acquire and release are expressed entirely in terms of `Clerk::get`,
//! `Clerk::create_if_missing`, `Clerk::conditional_put`, and `Clerk::put`; this crate knows
//! nothing about the KV server's storage or the Clerk's retry internals.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// Contains [`config::LockConfig`], a `Lock`'s acquire-backoff configuration.
pub mod config;

/// Contains [`error::LockError`], the lock-local error raised alongside propagated `KvError`s.
pub mod error;

/// Contains [`lock::Lock`] and [`lock::LockGuard`], the distributed lock and its RAII guard.
pub mod lock;

pub use config::LockConfig;
pub use error::LockError;
pub use lock::{Lock, LockGuard};
