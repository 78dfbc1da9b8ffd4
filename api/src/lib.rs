//! Hosts the protocol contract shared by the KV server, the Clerk client, and the lock built
//! on top of it.
//!
//! The server owns a versioned `key -> (value, version)` map reached through optimistic
//! concurrency control: a write carries the version it last observed and only applies if that
//! version is still current. The same `(client_id, seq)` pair is deduplicated by the server's
//! reply cache, which is what lets the Clerk retry a dropped RPC without risking a second
//! user-visible effect.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

/// Implements the closed error taxonomy ([`error::KvError`]) shared by every layer.
pub mod error;

/// Contains [`kv_service::KvService`], the interface every KV server backend must implement.
pub mod kv_service;

/// Contains a reusable async test suite for [`kv_service::KvService`] implementations.
pub mod kv_service_tests;

/// Contains [`transport::Delivery`], which models whether an RPC reached the caller at all.
pub mod transport;

/// Contains the request/reply types that make up the `Get`/`Put` RPC surface.
pub mod types;
