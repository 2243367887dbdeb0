//! Capability surface the core requires of a graph client.
//!
//! The registry and the query layer never talk to `neo4rs` directly; they
//! go through these object-safe traits so the execution lifecycle can be
//! driven against an in-memory backend in tests.

use async_trait::async_trait;

use graphwatch_core::{AccessMode, Params, Result, RowSet};

/// A connection-level handle: verification plus scoped-context acquisition.
///
/// Implementations are shared read-only across concurrent executions; the
/// registry alone decides when a backend is replaced.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Probe reachability. Fails with [`graphwatch_core::GraphwatchError::Connectivity`]
    /// if the store cannot be reached; a backend must not be published to
    /// consumers before this succeeds.
    async fn verify_connectivity(&self) -> Result<()>;

    /// Open a scoped execution context against an optional target database.
    ///
    /// Synchronous on purpose: pool acquisition is deferred until
    /// [`ScopedSession::run`], so configuration faults can surface before
    /// any I/O is attempted.
    fn open_session(&self, mode: AccessMode, database: Option<&str>) -> Box<dyn ScopedSession>;

    /// Begin an explicit transaction against an optional target database.
    async fn begin_transaction(
        &self,
        mode: AccessMode,
        database: Option<&str>,
    ) -> Result<Box<dyn ScopedTransaction>>;
}

/// A short-lived context through which exactly one query runs.
///
/// Owned by exactly one execution; `close` consumes the session, so a
/// second release cannot be expressed.
#[async_trait]
pub trait ScopedSession: Send {
    /// Run a statement, yielding the full ordered row sequence.
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet>;

    /// Release the context. Must be called exactly once per execution, on
    /// success and failure paths alike.
    async fn close(self: Box<Self>);
}

/// An explicit transaction: multiple statements, then commit or rollback.
#[async_trait]
pub trait ScopedTransaction: Send {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
