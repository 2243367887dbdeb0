//! In-memory mock backend for exercising the query lifecycle without a
//! live store.
//!
//! Responses are scripted per cypher text; anything unscripted answers
//! with a single `{count: 1}` row. Every opened session, run statement,
//! and close/commit/rollback is recorded so tests can assert on resource
//! handling, not just on results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use graphwatch_core::{AccessMode, GraphwatchError, Params, Result, RowSet};

use crate::backend::{GraphBackend, ScopedSession, ScopedTransaction};

/// One scripted reply: rows or an error, settled after an optional delay.
#[derive(Debug, Clone)]
pub struct MockResponse {
    rows: Option<RowSet>,
    error: Option<String>,
    delay: Duration,
}

impl MockResponse {
    pub fn rows(rows: RowSet) -> Self {
        Self {
            rows: Some(rows),
            error: None,
            delay: Duration::ZERO,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            rows: None,
            error: Some(message.into()),
            delay: Duration::ZERO,
        }
    }

    /// Settle only after the given delay, for overlap tests.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn single_count_row() -> Self {
        let rows = RowSet::new(vec!["count".into()], vec![vec![json!(1)]])
            .expect("static row shape");
        Self::rows(rows)
    }
}

/// A session opened against the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedSession {
    pub mode: AccessMode,
    pub database: Option<String>,
}

/// A statement run against the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RanStatement {
    pub cypher: String,
    pub params: Params,
    pub database: Option<String>,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, MockResponse>>,
    default_latency: Mutex<Duration>,
    verify_error: Mutex<Option<String>>,
    opened: Mutex<Vec<OpenedSession>>,
    runs: Mutex<Vec<RanStatement>>,
    closed: AtomicUsize,
    transactions: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable in-memory [`GraphBackend`]. Clone is cheap (inner Arc) and
/// clones share the same script and log.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `verify_connectivity` fail with the given message.
    pub fn with_verify_error(self, message: impl Into<String>) -> Self {
        *lock(&self.state.verify_error) = Some(message.into());
        self
    }

    /// Delay applied to unscripted responses.
    pub fn with_latency(self, latency: Duration) -> Self {
        *lock(&self.state.default_latency) = latency;
        self
    }

    /// Script the reply for an exact cypher text. The script is
    /// re-usable: every run of the same text gets the same reply.
    pub fn respond(&self, cypher: impl Into<String>, response: MockResponse) {
        lock(&self.state.responses).insert(cypher.into(), response);
    }

    /// Shared view of everything recorded against this backend.
    pub fn log(&self) -> MockLog {
        MockLog {
            state: Arc::clone(&self.state),
        }
    }

    fn response_for(&self, cypher: &str) -> MockResponse {
        lock(&self.state.responses)
            .get(cypher)
            .cloned()
            .unwrap_or_else(|| {
                MockResponse::single_count_row().after(*lock(&self.state.default_latency))
            })
    }
}

#[async_trait]
impl GraphBackend for MockBackend {
    async fn verify_connectivity(&self) -> Result<()> {
        match lock(&self.state.verify_error).clone() {
            Some(message) => Err(GraphwatchError::Connectivity(message)),
            None => Ok(()),
        }
    }

    fn open_session(&self, mode: AccessMode, database: Option<&str>) -> Box<dyn ScopedSession> {
        lock(&self.state.opened).push(OpenedSession {
            mode,
            database: database.map(str::to_owned),
        });
        Box::new(MockSession {
            backend: self.clone(),
            database: database.map(str::to_owned),
        })
    }

    async fn begin_transaction(
        &self,
        _mode: AccessMode,
        database: Option<&str>,
    ) -> Result<Box<dyn ScopedTransaction>> {
        self.state.transactions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransaction {
            backend: self.clone(),
            database: database.map(str::to_owned),
        }))
    }
}

struct MockSession {
    backend: MockBackend,
    database: Option<String>,
}

impl MockBackend {
    async fn run_scripted(
        &self,
        cypher: &str,
        params: &Params,
        database: Option<String>,
    ) -> Result<RowSet> {
        lock(&self.state.runs).push(RanStatement {
            cypher: cypher.to_owned(),
            params: params.clone(),
            database,
        });

        let response = self.response_for(cypher);
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        match (response.rows, response.error) {
            (Some(rows), _) => Ok(rows),
            (None, Some(message)) => Err(GraphwatchError::Query(message)),
            (None, None) => Err(GraphwatchError::Query("empty mock response".into())),
        }
    }
}

#[async_trait]
impl ScopedSession for MockSession {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet> {
        let database = self.database.clone();
        self.backend.run_scripted(cypher, params, database).await
    }

    async fn close(self: Box<Self>) {
        self.backend.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockTransaction {
    backend: MockBackend,
    database: Option<String>,
}

#[async_trait]
impl ScopedTransaction for MockTransaction {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet> {
        let database = self.database.clone();
        self.backend.run_scripted(cypher, params, database).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.backend.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.backend.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Read-side view of a mock backend's records.
pub struct MockLog {
    state: Arc<MockState>,
}

impl MockLog {
    pub fn opened(&self) -> Vec<OpenedSession> {
        lock(&self.state.opened).clone()
    }

    pub fn runs(&self) -> Vec<RanStatement> {
        lock(&self.state.runs).clone()
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn transactions(&self) -> usize {
        self.state.transactions.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.state.rollbacks.load(Ordering::SeqCst)
    }
}
