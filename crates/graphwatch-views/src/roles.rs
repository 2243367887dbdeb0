//! Role listing: one row per (role, member) pair, grouped one-to-many.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use graphwatch_client::ConnectionRegistry;
use graphwatch_core::{Params, Result, RowSet};

use crate::fetch;

pub const ROLES_QUERY: &str = "SHOW POPULATED ROLES WITH USERS";

/// A role and the users holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub role: String,
    pub members: Vec<String>,
}

/// Group the `(role, member)` projection into one entry per role,
/// preserving the server's row order for both roles and members.
pub fn group_roles(rows: &RowSet) -> Result<Vec<Role>> {
    let mut roles: Vec<Role> = Vec::new();
    for row in rows {
        let name: String = row.get_as("role")?;
        let member: String = row.get_as("member")?;
        match roles.iter_mut().find(|r| r.role == name) {
            Some(role) => role.members.push(member),
            None => roles.push(Role {
                role: name,
                members: vec![member],
            }),
        }
    }
    Ok(roles)
}

/// Fetch and group the populated roles.
pub async fn list_roles(registry: &Arc<ConnectionRegistry>) -> Result<Vec<Role>> {
    let (rows, _) = fetch::rows(registry, ROLES_QUERY, Params::new(), None).await?;
    group_roles(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn role_rows(pairs: &[(&str, &str)]) -> RowSet {
        RowSet::new(
            vec!["role".into(), "member".into()],
            pairs
                .iter()
                .map(|(role, member)| vec![json!(role), json!(member)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn repeated_roles_collapse_into_members() {
        let rows = role_rows(&[
            ("admin", "alice"),
            ("reader", "bob"),
            ("admin", "carol"),
        ]);
        let roles = group_roles(&rows).unwrap();

        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].role, "admin");
        assert_eq!(roles[0].members, ["alice", "carol"]);
        assert_eq!(roles[1].role, "reader");
        assert_eq!(roles[1].members, ["bob"]);
    }

    #[test]
    fn empty_rows_yield_no_roles() {
        let rows = role_rows(&[]);
        assert!(group_roles(&rows).unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_roles_runs_the_roles_query() {
        use graphwatch_client::mock::{MockBackend, MockResponse};

        let mock = MockBackend::new();
        mock.respond(
            ROLES_QUERY,
            MockResponse::rows(role_rows(&[("admin", "alice"), ("admin", "bob")])),
        );
        let registry = ConnectionRegistry::new();
        registry.adopt(Arc::new(mock.clone()), None).await.unwrap();

        let roles = list_roles(&Arc::new(registry)).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].members, ["alice", "bob"]);
        assert_eq!(mock.log().closed(), 1);
    }
}
