//! Graphwatch client — connection registry and scoped session plumbing.
//!
//! This crate owns the connection lifecycle: credentials go in through
//! [`ConnectionRegistry::establish`], get verified against the store, and
//! come out as scoped sessions and transactions that the query layer runs
//! statements through. The Bolt wire protocol itself belongs to `neo4rs`,
//! kept behind the [`backend::GraphBackend`] trait.

pub mod backend;
pub mod bolt;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod profile;
pub mod registry;
pub mod session;
pub mod txn;

pub use backend::{GraphBackend, ScopedSession, ScopedTransaction};
pub use bolt::BoltBackend;
pub use profile::{ConnectionProfile, ProfileError, ProfileStore};
pub use registry::ConnectionRegistry;
pub use session::resolve_database;
pub use txn::TransactionHandle;
