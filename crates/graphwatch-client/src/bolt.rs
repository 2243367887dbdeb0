//! Bolt backend: the `neo4rs` implementation of the capability traits.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use serde_json::Value;

use graphwatch_core::{AccessMode, ConnectConfig, GraphwatchError, Params, Result, RowSet};

use crate::backend::{GraphBackend, ScopedSession, ScopedTransaction};

/// Thread-safe Bolt backend with connection pooling. Clone is cheap
/// (inner Arc).
#[derive(Clone)]
pub struct BoltBackend {
    graph: Graph,
}

impl BoltBackend {
    /// Connect to Neo4j with the given configuration.
    ///
    /// An unreachable host fails here; reachability is re-checked by
    /// [`GraphBackend::verify_connectivity`] before the registry publishes
    /// the backend.
    pub async fn connect(config: &ConnectConfig) -> Result<Self> {
        let uri = config.uri();
        let mut builder = ConfigBuilder::default()
            .uri(&uri)
            .user(&config.username)
            .password(&config.password);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphwatchError::Connectivity(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphwatchError::Connectivity(e.to_string()))?;

        tracing::info!(uri = %uri, "connected to Neo4j");
        Ok(Self { graph })
    }

    /// Wrap an existing `neo4rs` graph handle.
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl GraphBackend for BoltBackend {
    async fn verify_connectivity(&self) -> Result<()> {
        self.graph
            .run(neo4rs::query("RETURN 1"))
            .await
            .map_err(|e| GraphwatchError::Connectivity(e.to_string()))
    }

    fn open_session(&self, mode: AccessMode, database: Option<&str>) -> Box<dyn ScopedSession> {
        tracing::debug!(mode = %mode, database = ?database, "opening bolt session");
        Box::new(BoltSession {
            graph: self.graph.clone(),
            mode,
            database: database.map(str::to_owned),
        })
    }

    async fn begin_transaction(
        &self,
        mode: AccessMode,
        database: Option<&str>,
    ) -> Result<Box<dyn ScopedTransaction>> {
        let txn = match database {
            Some(db) => self.graph.start_txn_on(db).await,
            None => self.graph.start_txn().await,
        }
        .map_err(|e| GraphwatchError::Query(e.to_string()))?;

        tracing::debug!(mode = %mode, database = ?database, "transaction started");
        Ok(Box::new(BoltTransaction { txn }))
    }
}

/// One Bolt execution context. The pool does not distinguish read and
/// write connections on a single server; the mode is carried for
/// routing-aware deployments and tracing.
struct BoltSession {
    graph: Graph,
    mode: AccessMode,
    database: Option<String>,
}

#[async_trait]
impl ScopedSession for BoltSession {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet> {
        let q = build_query(cypher, params);
        let mut stream = match &self.database {
            Some(db) => self.graph.execute_on(db, q).await,
            None => self.graph.execute(q).await,
        }
        .map_err(|e| GraphwatchError::Query(e.to_string()))?;

        let mut objects = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| GraphwatchError::Query(e.to_string()))?
        {
            let object: Value = row
                .to()
                .map_err(|e| GraphwatchError::Decode(e.to_string()))?;
            objects.push(object);
        }
        RowSet::from_objects(objects)
    }

    async fn close(self: Box<Self>) {
        // Connections return to the pool on drop; the explicit close keeps
        // the release point observable in traces.
        tracing::trace!(mode = %self.mode, database = ?self.database, "bolt session released");
    }
}

struct BoltTransaction {
    txn: neo4rs::Txn,
}

#[async_trait]
impl ScopedTransaction for BoltTransaction {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<RowSet> {
        let q = build_query(cypher, params);
        let mut stream = self
            .txn
            .execute(q)
            .await
            .map_err(|e| GraphwatchError::Query(e.to_string()))?;

        let mut objects = Vec::new();
        while let Some(row) = stream
            .next(self.txn.handle())
            .await
            .map_err(|e| GraphwatchError::Query(e.to_string()))?
        {
            let object: Value = row
                .to()
                .map_err(|e| GraphwatchError::Decode(e.to_string()))?;
            objects.push(object);
        }
        RowSet::from_objects(objects)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| GraphwatchError::Query(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.txn
            .rollback()
            .await
            .map_err(|e| GraphwatchError::Query(e.to_string()))
    }
}

/// Build a `neo4rs` query from a statement's text and parameters.
fn build_query(cypher: &str, params: &Params) -> Query {
    let mut q = neo4rs::query(cypher);
    for (name, value) in params.iter() {
        q = apply_param(q, name, value);
    }
    q
}

/// Map a JSON parameter value onto the Bolt type system.
///
/// Scalars and string lists map directly; nested arrays and objects are
/// passed as JSON text, which callers must unpack with `apoc.convert` or
/// equivalent on the server side.
fn apply_param(q: Query, name: &str, value: &Value) -> Query {
    match value {
        Value::Null => q.param(name, None::<String>),
        Value::Bool(b) => q.param(name, *b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => q.param(name, i),
            None => q.param(name, n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => q.param(name, s.as_str()),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            q.param(name, list)
        }
        other => q.param(name, other.to_string()),
    }
}
