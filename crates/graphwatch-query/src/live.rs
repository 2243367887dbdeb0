//! Eager-on-change execution: a query cell that re-runs whenever its
//! statement changes by value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use graphwatch_client::{resolve_database, ConnectionRegistry};
use graphwatch_core::{AccessMode, Result, Statement};

use crate::exec;
use crate::handle::QueryHandle;
use crate::state::QueryState;

/// A query that follows its statement: `update` with a changed
/// (cypher, params, database) triple supersedes the in-flight execution.
///
/// Each execution carries a monotonically increasing sequence number; only
/// the settlement carrying the cell's current number is applied, so a
/// stale execution that settles late cannot overwrite a newer state. The
/// stale execution's session is still closed.
pub struct LiveQuery {
    registry: Arc<ConnectionRegistry>,
    mode: AccessMode,
    tx: watch::Sender<QueryState>,
    seq: AtomicU64,
    current: Mutex<Statement>,
}

impl LiveQuery {
    /// Start a read query and keep it tied to the statement.
    pub fn read(registry: Arc<ConnectionRegistry>, statement: Statement) -> Result<Self> {
        Self::start(registry, AccessMode::Read, statement)
    }

    /// Start a write query and keep it tied to the statement.
    pub fn write(registry: Arc<ConnectionRegistry>, statement: Statement) -> Result<Self> {
        Self::start(registry, AccessMode::Write, statement)
    }

    fn start(
        registry: Arc<ConnectionRegistry>,
        mode: AccessMode,
        statement: Statement,
    ) -> Result<Self> {
        let resolved = resolve_database(
            statement.database.as_deref(),
            None,
            registry.database().as_deref(),
        );
        let session = registry.open_session(mode, resolved.as_deref())?;

        let (tx, _rx) = watch::channel(QueryState::loading(resolved, 1));
        tokio::spawn(exec::run_to_settlement(
            session,
            statement.cypher.clone(),
            statement.params.clone(),
            tx.clone(),
            1,
        ));

        Ok(Self {
            registry,
            mode,
            tx,
            seq: AtomicU64::new(1),
            current: Mutex::new(statement),
        })
    }

    /// Re-execute if the statement differs from the current one by value.
    ///
    /// Returns `Ok(false)` without touching anything when the triple is
    /// unchanged. Structural errors propagate and leave the previous
    /// execution in place.
    pub fn update(&self, statement: Statement) -> Result<bool> {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *current == statement {
            return Ok(false);
        }

        let resolved = resolve_database(
            statement.database.as_deref(),
            None,
            self.registry.database().as_deref(),
        );
        let session = self.registry.open_session(self.mode, resolved.as_deref())?;
        *current = statement.clone();

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        exec::mark_loading(&self.tx, resolved, seq);
        tokio::spawn(exec::run_to_settlement(
            session,
            statement.cypher,
            statement.params,
            self.tx.clone(),
            seq,
        ));
        Ok(true)
    }

    /// The statement currently driving the cell.
    pub fn statement(&self) -> Statement {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
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
