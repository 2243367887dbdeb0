//! Database listing from the `system` database.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use graphwatch_client::ConnectionRegistry;
use graphwatch_core::{Params, Result, RowSet};

use crate::fetch;

pub const DATABASES_QUERY: &str = "SHOW DATABASES";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseRole {
    Leader,
    Follower,
    ReadReplica,
    Standalone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Online,
    Offline,
    Initial,
}

/// One database as reported by `SHOW DATABASES`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub address: String,
    pub role: DatabaseRole,
    pub requested_status: DatabaseStatus,
    pub current_status: DatabaseStatus,
    pub error: String,
    pub default: bool,
}

/// Map the `SHOW DATABASES` projection into typed records.
pub fn from_rows(rows: &RowSet) -> Result<Vec<DatabaseInfo>> {
    rows.iter()
        .map(|row| {
            Ok(DatabaseInfo {
                name: row.get_as("name")?,
                address: row.get_as("address")?,
                role: row.get_as("role")?,
                requested_status: row.get_as("requestedStatus")?,
                current_status: row.get_as("currentStatus")?,
                error: row.get_as::<Option<String>>("error")?.unwrap_or_default(),
                default: row.get_as("default")?,
            })
        })
        .collect()
}

/// Fetch the database list. Database administration lives in the
/// `system` database, so the query always targets it explicitly.
pub async fn list_databases(registry: &Arc<ConnectionRegistry>) -> Result<Vec<DatabaseInfo>> {
    let (rows, _) =
        fetch::rows(registry, DATABASES_QUERY, Params::new(), Some("system".into())).await?;
    from_rows(&rows)
}
