//! Lazily-triggered execution: deferred until explicitly invoked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use graphwatch_client::{resolve_database, ConnectionRegistry};
use graphwatch_core::{AccessMode, Params, Result, RowSet};

use crate::exec;
use crate::handle::QueryHandle;
use crate::state::QueryState;

/// A query that begins `Idle` and runs only when triggered.
///
/// Each trigger may override the parameters and the target database; the
/// database resolves override > the query's configured default > the
/// registry's ambient default.
pub struct LazyQuery {
    registry: Arc<ConnectionRegistry>,
    mode: AccessMode,
    cypher: String,
    default_database: Option<String>,
    tx: watch::Sender<QueryState>,
    seq: AtomicU64,
}

impl LazyQuery {
    /// A lazy read query with an optional per-query default database.
    pub fn read(
        registry: Arc<ConnectionRegistry>,
        cypher: impl Into<String>,
        default_database: Option<String>,
    ) -> Self {
        Self::new(registry, AccessMode::Read, cypher, default_database)
    }

    /// A lazy write query with an optional per-query default database.
    pub fn write(
        registry: Arc<ConnectionRegistry>,
        cypher: impl Into<String>,
        default_database: Option<String>,
    ) -> Self {
        Self::new(registry, AccessMode::Write, cypher, default_database)
    }

    fn new(
        registry: Arc<ConnectionRegistry>,
        mode: AccessMode,
        cypher: impl Into<String>,
        default_database: Option<String>,
    ) -> Self {
        let (tx, _rx) = watch::channel(QueryState::idle());
        Self {
            registry,
            mode,
            cypher: cypher.into(),
            default_database,
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Run the query now.
    ///
    /// Session acquisition happens synchronously: a structural fault such
    /// as `DriverNotConfigured` is returned as `Err` here, never absorbed
    /// into state. Once the execution is underway, a query failure settles
    /// into the `Failed` state and the returned task resolves to `None`
    /// rather than an error — observe it through the handle. This
    /// asymmetry is deliberate: configuration defects must be
    /// distinguishable from data problems at the call site.
    ///
    /// Must be called within a Tokio runtime.
    pub fn trigger(
        &self,
        params: Option<Params>,
        database: Option<&str>,
    ) -> Result<JoinHandle<Option<RowSet>>> {
        let resolved = resolve_database(
            database,
            self.default_database.as_deref(),
            self.registry.database().as_deref(),
        );
        let session = self.registry.open_session(self.mode, resolved.as_deref())?;

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        exec::mark_loading(&self.tx, resolved, seq);
        Ok(tokio::spawn(exec::run_to_settlement(
            session,
            self.cypher.clone(),
            params.unwrap_or_default(),
            self.tx.clone(),
            seq,
        )))
    }

    /// The query's configured default database, if any.
    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState {
        self.tx.borrow().clone()
    }

    /// A new observer handle onto this cell.
    pub fn handle(&self) -> QueryHandle {
        QueryHandle::new(self.tx.subscribe())
    }
}
