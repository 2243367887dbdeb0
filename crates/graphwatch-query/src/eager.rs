//! Eager-once execution: one statement, started immediately, run exactly
//! once.

use std::sync::Arc;

use tokio::sync::watch;

use graphwatch_client::{resolve_database, ConnectionRegistry};
use graphwatch_core::{AccessMode, Params, Result, Statement};

use crate::exec;
use crate::handle::QueryHandle;
use crate::state::QueryState;

/// Start a read query immediately and return its observer handle.
///
/// The handle begins in `Loading` with the resolved database already
/// visible. Later parameter changes do not affect the invocation.
/// Structural errors (`DriverNotConfigured`) surface here, before any I/O;
/// query errors settle into the handle's `Failed` state instead.
///
/// Must be called within a Tokio runtime.
pub fn run_read(
    registry: &Arc<ConnectionRegistry>,
    cypher: impl Into<String>,
    params: Params,
    database: Option<String>,
) -> Result<QueryHandle> {
    run_eager(registry, AccessMode::Read, cypher, params, database)
}

/// Start a write query immediately and return its observer handle.
pub fn run_write(
    registry: &Arc<ConnectionRegistry>,
    cypher: impl Into<String>,
    params: Params,
    database: Option<String>,
) -> Result<QueryHandle> {
    run_eager(registry, AccessMode::Write, cypher, params, database)
}

fn run_eager(
    registry: &Arc<ConnectionRegistry>,
    mode: AccessMode,
    cypher: impl Into<String>,
    params: Params,
    database: Option<String>,
) -> Result<QueryHandle> {
    let statement = Statement {
        cypher: cypher.into(),
        params,
        database,
    };
    let resolved = resolve_database(
        statement.database.as_deref(),
        None,
        registry.database().as_deref(),
    );
    let session = registry.open_session(mode, resolved.as_deref())?;

    let (tx, rx) = watch::channel(QueryState::loading(resolved, 1));
    tokio::spawn(exec::run_to_settlement(
        session,
        statement.cypher,
        statement.params,
        tx,
        1,
    ));
    Ok(QueryHandle::new(rx))
}
