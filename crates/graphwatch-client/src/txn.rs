//! Explicit transactions over a scoped transaction context.

use graphwatch_core::{Params, Result, RowSet};

use crate::backend::ScopedTransaction;

/// A live transaction: run any number of statements, then settle it with
/// exactly one of commit or rollback. Dropping the handle without settling
/// leaves the outcome to the backend's own cleanup (Bolt rolls back).
pub struct TransactionHandle {
    txn: Box<dyn ScopedTransaction>,
    database: Option<String>,
}

impl TransactionHandle {
    pub(crate) fn new(txn: Box<dyn ScopedTransaction>, database: Option<String>) -> Self {
        Self { txn, database }
    }

    /// The database this transaction was resolved against.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Run a statement inside the transaction.
    pub async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet> {
        self.txn.run(cypher, params).await
    }

    /// Commit the transaction, consuming the handle.
    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await
    }

    /// Roll the transaction back, consuming the handle.
    pub async fn rollback(self) -> Result<()> {
        self.txn.rollback().await
    }
}
