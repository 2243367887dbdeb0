//! The observable value object for one query invocation.

use graphwatch_core::{GraphwatchError, Row, RowSet};

/// Lifecycle phase of a query invocation.
///
/// `Idle` exists only for lazy queries before their first trigger.
/// `Succeeded` and `Failed` are terminal for the invocation; a re-trigger
/// produces a fresh state rather than mutating a settled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl QueryPhase {
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryPhase::Succeeded | QueryPhase::Failed)
    }
}

/// Snapshot of one invocation's lifecycle.
///
/// The resolved database is fixed when the session is acquired and visible
/// from the first `Loading` observation onward. Once settled, exactly one
/// of rows/error is populated. The sequence tag identifies the invocation
/// so a superseded execution's settlement can be discarded.
#[derive(Debug, Clone)]
pub struct QueryState {
    phase: QueryPhase,
    database: Option<String>,
    rows: Option<RowSet>,
    error: Option<GraphwatchError>,
    seq: u64,
}

impl QueryState {
    pub(crate) fn idle() -> Self {
        Self {
            phase: QueryPhase::Idle,
            database: None,
            rows: None,
            error: None,
            seq: 0,
        }
    }

    pub(crate) fn loading(database: Option<String>, seq: u64) -> Self {
        Self {
            phase: QueryPhase::Loading,
            database,
            rows: None,
            error: None,
            seq,
        }
    }

    pub(crate) fn settle(&mut self, outcome: Result<RowSet, GraphwatchError>) {
        match outcome {
            Ok(rows) => {
                self.phase = QueryPhase::Succeeded;
                self.rows = Some(rows);
                self.error = None;
            }
            Err(error) => {
                self.phase = QueryPhase::Failed;
                self.rows = None;
                self.error = Some(error);
            }
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == QueryPhase::Loading
    }

    /// The database this invocation was resolved against, if any.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The full ordered result, once succeeded.
    pub fn rows(&self) -> Option<&RowSet> {
        self.rows.as_ref()
    }

    /// The first result row, once succeeded and non-empty.
    pub fn first(&self) -> Option<&Row> {
        self.rows.as_ref().and_then(RowSet::first)
    }

    /// The captured failure, once failed.
    pub fn error(&self) -> Option<&GraphwatchError> {
        self.error.as_ref()
    }
}
