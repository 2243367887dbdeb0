//! Connection registry: the single live backend and the ambient default
//! database, shared by every consumer in the process.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use graphwatch_core::{AccessMode, ConnectConfig, GraphwatchError, Result};

use crate::backend::{GraphBackend, ScopedSession};
use crate::bolt::BoltBackend;
use crate::profile::{ConnectionProfile, ProfileStore};
use crate::session::resolve_database;
use crate::txn::TransactionHandle;

#[derive(Default)]
struct Inner {
    backend: Option<Arc<dyn GraphBackend>>,
    database: Option<String>,
    config: Option<ConnectConfig>,
}

/// Process-wide handle to the active connection.
///
/// At most one backend is live per registry. Consumers read it; only the
/// registry's own establish/adopt/clear operations replace it. Share via
/// `Arc` and pass explicitly to whatever needs a session.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
    profiles: Option<ProfileStore>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that persists each successful configuration for reuse on
    /// the next start.
    pub fn with_profile_store(store: ProfileStore) -> Self {
        Self {
            inner: RwLock::default(),
            profiles: Some(store),
        }
    }

    /// Build a Bolt backend from the configuration, verify reachability,
    /// and publish it. On failure the registry keeps its prior state; an
    /// unverified connection is never published.
    pub async fn establish(&self, config: ConnectConfig) -> Result<()> {
        let backend = BoltBackend::connect(&config).await?;
        self.install(Arc::new(backend), config.database.clone(), Some(config))
            .await
    }

    /// Install an externally built backend (a shared driver, or a mock in
    /// tests), verifying it first. The ambient database is taken from the
    /// argument rather than from a configuration record.
    pub async fn adopt(
        &self,
        backend: Arc<dyn GraphBackend>,
        database: Option<String>,
    ) -> Result<()> {
        self.install(backend, database, None).await
    }

    async fn install(
        &self,
        backend: Arc<dyn GraphBackend>,
        database: Option<String>,
        config: Option<ConnectConfig>,
    ) -> Result<()> {
        backend.verify_connectivity().await?;

        {
            let mut inner = self.write();
            inner.backend = Some(backend);
            inner.database = database;
            inner.config = config.clone();
        }
        tracing::info!(database = ?self.database(), "connection published to registry");

        // Best-effort persistence; a failed write must not undo a live
        // connection.
        if let (Some(store), Some(config)) = (&self.profiles, &config) {
            if let Err(e) = store.save(config) {
                tracing::warn!(error = %e, "failed to persist connection profile");
            }
        }
        Ok(())
    }

    /// Drop the live connection, returning the registry to its
    /// unconfigured state. The ambient database is cleared with it.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.backend = None;
        inner.database = None;
        inner.config = None;
    }

    pub fn is_connected(&self) -> bool {
        self.read().backend.is_some()
    }

    /// The live backend, or `DriverNotConfigured` if none has been
    /// established.
    pub fn backend(&self) -> Result<Arc<dyn GraphBackend>> {
        self.read()
            .backend
            .clone()
            .ok_or(GraphwatchError::DriverNotConfigured)
    }

    /// The ambient default database, used when no more specific database
    /// is given.
    pub fn database(&self) -> Option<String> {
        self.read().database.clone()
    }

    /// Switch the ambient default database without reconnecting.
    pub fn set_database(&self, database: Option<String>) {
        self.write().database = database;
    }

    /// The configuration behind the live connection, if it was built from
    /// one.
    pub fn config(&self) -> Option<ConnectConfig> {
        self.read().config.clone()
    }

    /// The profile persisted by the last successful establish, if a store
    /// is attached and a profile exists.
    pub fn last_profile(&self) -> Option<ConnectionProfile> {
        let store = self.profiles.as_ref()?;
        match store.load() {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read connection profile");
                None
            }
        }
    }

    /// Open a scoped session against an already-resolved target database.
    ///
    /// Fails synchronously with `DriverNotConfigured` before any I/O when
    /// nothing is established.
    pub fn open_session(
        &self,
        mode: AccessMode,
        database: Option<&str>,
    ) -> Result<Box<dyn ScopedSession>> {
        let backend = self.backend()?;
        Ok(backend.open_session(mode, database))
    }

    /// Open a read session, falling back to the ambient database when no
    /// explicit one is given.
    pub fn read_session(&self, database: Option<&str>) -> Result<Box<dyn ScopedSession>> {
        self.session(AccessMode::Read, database)
    }

    /// Open a write session, falling back to the ambient database when no
    /// explicit one is given.
    pub fn write_session(&self, database: Option<&str>) -> Result<Box<dyn ScopedSession>> {
        self.session(AccessMode::Write, database)
    }

    fn session(&self, mode: AccessMode, database: Option<&str>) -> Result<Box<dyn ScopedSession>> {
        let resolved = resolve_database(database, None, self.database().as_deref());
        self.open_session(mode, resolved.as_deref())
    }

    /// Begin an explicit transaction, resolving the target database the
    /// same way sessions do.
    pub async fn begin_transaction(
        &self,
        mode: AccessMode,
        database: Option<&str>,
    ) -> Result<TransactionHandle> {
        let backend = self.backend()?;
        let resolved = resolve_database(database, None, self.database().as_deref());
        let txn = backend.begin_transaction(mode, resolved.as_deref()).await?;
        Ok(TransactionHandle::new(txn, resolved))
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[tokio::test]
    async fn unconfigured_registry_rejects_sessions_synchronously() {
        let registry = ConnectionRegistry::new();
        let err = registry.open_session(AccessMode::Read, None).err().unwrap();
        assert_eq!(err, GraphwatchError::DriverNotConfigured);
        assert!(err.is_structural());
        assert!(!registry.is_connected());
    }

    #[tokio::test]
    async fn adopt_publishes_a_verified_backend() {
        let registry = ConnectionRegistry::new();
        let mock = MockBackend::new();

        registry
            .adopt(Arc::new(mock.clone()), Some("movies".into()))
            .await
            .unwrap();

        assert!(registry.is_connected());
        assert_eq!(registry.database(), Some("movies".into()));

        let session = registry.read_session(None).unwrap();
        session.close().await;

        let opened = mock.log().opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].mode, AccessMode::Read);
        assert_eq!(opened[0].database, Some("movies".into()));
        assert_eq!(mock.log().closed(), 1);
    }

    #[tokio::test]
    async fn failed_verification_leaves_registry_untouched() {
        let registry = ConnectionRegistry::new();
        let good = MockBackend::new();
        registry
            .adopt(Arc::new(good), Some("movies".into()))
            .await
            .unwrap();

        let bad = MockBackend::new().with_verify_error("connection refused");
        let err = registry
            .adopt(Arc::new(bad), Some("other".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, GraphwatchError::Connectivity(_)));
        // Prior connection and ambient database survive the failed attempt.
        assert!(registry.is_connected());
        assert_eq!(registry.database(), Some("movies".into()));
    }

    #[tokio::test]
    async fn ambient_database_switches_without_reconnecting() {
        let registry = ConnectionRegistry::new();
        let mock = MockBackend::new();
        registry.adopt(Arc::new(mock.clone()), None).await.unwrap();

        assert_eq!(registry.database(), None);
        registry.set_database(Some("contextdb".into()));

        let session = registry.write_session(None).unwrap();
        session.close().await;

        let opened = mock.log().opened();
        assert_eq!(opened[0].database, Some("contextdb".into()));
        assert_eq!(opened[0].mode, AccessMode::Write);
    }

    #[tokio::test]
    async fn explicit_database_beats_ambient_for_sessions() {
        let registry = ConnectionRegistry::new();
        let mock = MockBackend::new();
        registry
            .adopt(Arc::new(mock.clone()), Some("contextdb".into()))
            .await
            .unwrap();

        let session = registry.read_session(Some("mydb")).unwrap();
        session.close().await;

        assert_eq!(mock.log().opened()[0].database, Some("mydb".into()));
    }

    #[tokio::test]
    async fn clear_returns_to_unconfigured() {
        let registry = ConnectionRegistry::new();
        registry
            .adopt(Arc::new(MockBackend::new()), Some("movies".into()))
            .await
            .unwrap();

        registry.clear();
        assert!(!registry.is_connected());
        assert_eq!(registry.database(), None);
        assert_eq!(
            registry.open_session(AccessMode::Read, None).err().unwrap(),
            GraphwatchError::DriverNotConfigured
        );
    }
}
