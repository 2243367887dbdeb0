//! Observer handle over a query cell.

use tokio::sync::watch;

use crate::state::QueryState;

/// A cheap, cloneable view onto a query's observable state.
///
/// Every observer sees `Loading` (or `Idle`, for an untriggered lazy
/// query) before it can see a settlement: the settlement is published by
/// the execution task, never stored as the cell's initial value.
#[derive(Clone)]
pub struct QueryHandle {
    rx: watch::Receiver<QueryState>,
}

impl QueryHandle {
    pub(crate) fn new(rx: watch::Receiver<QueryState>) -> Self {
        Self { rx }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change. Returns `false` once no further
    /// changes can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until the current invocation settles and return its state.
    ///
    /// If invocations are superseded while waiting, this returns the first
    /// settled state it observes, which by the latest-wins rule belongs to
    /// the newest invocation.
    pub async fn settled(&mut self) -> QueryState {
        loop {
            let state = self.rx.borrow_and_update().clone();
            if state.phase().is_settled() {
                return state;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }
}
