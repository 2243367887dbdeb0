//! Graphwatch query — the observable execution state machine.
//!
//! One invocation moves `Loading` → `Succeeded` | `Failed`, published
//! through a watch channel so any number of observers can key off the
//! phase. Three modes cover the ways callers start work:
//!
//! - eager-once ([`run_read`] / [`run_write`]): execute immediately,
//!   exactly once;
//! - eager-on-change ([`LiveQuery`]): re-execute when the statement
//!   changes by value, superseding the in-flight run;
//! - lazy ([`LazyQuery`]): stay `Idle` until explicitly triggered.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use graphwatch_client::ConnectionRegistry;
//! # use graphwatch_core::{ConnectConfig, Params};
//! # async fn demo() -> graphwatch_core::Result<()> {
//! let registry = Arc::new(ConnectionRegistry::new());
//! registry.establish(ConnectConfig::default()).await?;
//!
//! let mut handle = graphwatch_query::run_read(
//!     &registry,
//!     "MATCH (n) RETURN count(n) AS count",
//!     Params::new(),
//!     None,
//! )?;
//! let state = handle.settled().await;
//! if let Some(row) = state.first() {
//!     println!("count = {:?}", row.get("count"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod eager;
mod exec;
pub mod handle;
pub mod lazy;
pub mod live;
pub mod state;

pub use eager::{run_read, run_write};
pub use handle::QueryHandle;
pub use lazy::LazyQuery;
pub use live::LiveQuery;
pub use state::{QueryPhase, QueryState};
