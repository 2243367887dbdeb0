//! Graphwatch views — typed, domain-shaped aggregates over raw result
//! rows.
//!
//! The query layer guarantees ordered rows with lookup by column name;
//! everything past that — grouping, sorting, count conversion — lives
//! here. Each view is a pure normalization function over a [`RowSet`]
//! plus a thin fetcher built on the eager execution mode.
//!
//! [`RowSet`]: graphwatch_core::RowSet

pub mod databases;
pub mod roles;
pub mod schema;
pub mod users;

pub use databases::{list_databases, DatabaseInfo, DatabaseRole, DatabaseStatus};
pub use roles::{list_roles, Role};
pub use schema::{fetch_schema, GraphSchema, LabelSchema, PropertySchema, RelationshipSchema};
pub use users::{list_users, UserAccount};

mod fetch {
    use std::sync::Arc;

    use graphwatch_client::ConnectionRegistry;
    use graphwatch_core::{Params, Result, RowSet};
    use graphwatch_query::run_read;

    /// Run an eager read to settlement, surfacing the failed branch as an
    /// error and handing back the rows with the resolved database.
    pub(crate) async fn rows(
        registry: &Arc<ConnectionRegistry>,
        cypher: &str,
        params: Params,
        database: Option<String>,
    ) -> Result<(RowSet, Option<String>)> {
        let mut handle = run_read(registry, cypher, params, database)?;
        let state = handle.settled().await;
        if let Some(error) = state.error() {
            return Err(error.clone());
        }
        let rows = state.rows().cloned().unwrap_or_default();
        let database = state.database().map(str::to_owned);
        Ok((rows, database))
    }
}
