//! User account listing from the `system` database.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use graphwatch_client::ConnectionRegistry;
use graphwatch_core::{Params, Result, RowSet};

use crate::fetch;

pub const USERS_QUERY: &str = "SHOW USERS";

/// One user account as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub user: String,
    pub roles: Vec<String>,
    pub password_change_required: bool,
    pub suspended: bool,
}

/// Map the `SHOW USERS` projection into typed accounts. Community
/// edition reports `suspended` as null; absent flags read as false.
pub fn from_rows(rows: &RowSet) -> Result<Vec<UserAccount>> {
    rows.iter()
        .map(|row| {
            Ok(UserAccount {
                user: row.get_as("user")?,
                roles: row.get_as::<Option<Vec<String>>>("roles")?.unwrap_or_default(),
                password_change_required: row
                    .get_as::<Option<bool>>("passwordChangeRequired")?
                    .unwrap_or(false),
                suspended: row.get_as::<Option<bool>>("suspended")?.unwrap_or(false),
            })
        })
        .collect()
}

/// Fetch the user accounts. User administration lives in the `system`
/// database, so the query always targets it explicitly.
pub async fn list_users(registry: &Arc<ConnectionRegistry>) -> Result<Vec<UserAccount>> {
    let (rows, _) =
        fetch::rows(registry, USERS_QUERY, Params::new(), Some("system".into())).await?;
    from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_rows() -> RowSet {
        RowSet::new(
            vec![
                "user".into(),
                "roles".into(),
                "passwordChangeRequired".into(),
                "suspended".into(),
            ],
            vec![
                vec![json!("neo4j"), json!(["admin"]), json!(false), json!(null)],
                vec![
                    json!("alice"),
                    json!(["reader", "editor"]),
                    json!(true),
                    json!(false),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rows_map_to_accounts() {
        let users = from_rows(&user_rows()).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user, "neo4j");
        assert_eq!(users[0].roles, ["admin"]);
        assert!(!users[0].suspended);
        assert!(users[1].password_change_required);
        assert_eq!(users[1].roles, ["reader", "editor"]);
    }

    #[tokio::test]
    async fn list_users_targets_the_system_database() {
        use graphwatch_client::mock::{MockBackend, MockResponse};

        let mock = MockBackend::new();
        mock.respond(USERS_QUERY, MockResponse::rows(user_rows()));
        let registry = ConnectionRegistry::new();
        registry
            .adopt(Arc::new(mock.clone()), Some("contextdb".into()))
            .await
            .unwrap();

        let users = list_users(&Arc::new(registry)).await.unwrap();
        assert_eq!(users.len(), 2);
        // The explicit system target beats the ambient database.
        assert_eq!(mock.log().opened()[0].database, Some("system".into()));
    }
}
