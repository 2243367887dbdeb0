//! Target-database resolution for scoped sessions.

/// Resolve the effective database for one execution.
///
/// Highest precedence first: the explicit call-site override, then the
/// per-query default, then the ambient registry default. Empty strings are
/// treated as absent at every tier. `None` leaves the choice to the
/// server's default database.
pub fn resolve_database(
    explicit: Option<&str>,
    preferred: Option<&str>,
    ambient: Option<&str>,
) -> Option<String> {
    [explicit, preferred, ambient]
        .into_iter()
        .flatten()
        .find(|db| !db.is_empty())
        .map(str::to_owned)
}
