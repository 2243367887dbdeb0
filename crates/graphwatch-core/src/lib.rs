//! graphwatch-core: Shared types, configuration, and error handling for Graphwatch.
//!
//! This crate provides the foundational types used across all Graphwatch
//! components:
//! - Connection configuration (scheme, host, credentials)
//! - The ordered Row/RowSet result model
//! - Execution descriptors (statement, parameters, access mode)
//! - Common error types

pub mod config;
pub mod error;
pub mod row;
pub mod statement;

pub use config::{ConnectConfig, Scheme};
pub use error::{GraphwatchError, Result};
pub use row::{value, Row, RowSet};
pub use statement::{AccessMode, Params, Statement};
