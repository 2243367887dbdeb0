//! The shared execution protocol behind every query mode.

use tokio::sync::watch;

use graphwatch_client::backend::ScopedSession;
use graphwatch_core::{Params, RowSet};

use crate::state::QueryState;

/// Publish `Loading` for a new invocation, unless a newer invocation has
/// already taken over the cell.
pub(crate) fn mark_loading(
    tx: &watch::Sender<QueryState>,
    database: Option<String>,
    seq: u64,
) {
    tx.send_if_modified(|state| {
        if seq < state.seq() {
            return false;
        }
        *state = QueryState::loading(database, seq);
        true
    });
}

/// Run one statement to settlement.
///
/// The session is closed on both paths before the settlement is published;
/// a leaked context is a correctness bug, not a resource warning. The
/// settlement is applied only while the invocation's sequence tag still
/// matches the cell — a superseded execution still closes its session, but
/// its result is discarded.
///
/// Returns the rows on success, `None` on failure (the error lives in the
/// published state).
pub(crate) async fn run_to_settlement(
    mut session: Box<dyn ScopedSession>,
    cypher: String,
    params: Params,
    tx: watch::Sender<QueryState>,
    seq: u64,
) -> Option<RowSet> {
    let outcome = session.run(&cypher, &params).await;
    session.close().await;

    let rows = outcome.as_ref().ok().cloned();
    let applied = tx.send_if_modified(|state| {
        if state.seq() != seq {
            return false;
        }
        state.settle(outcome);
        true
    });
    if !applied {
        tracing::debug!(seq, "superseded execution settled; result discarded");
    }
    rows
}
