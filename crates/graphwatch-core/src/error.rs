use thiserror::Error;

/// Top-level error type for Graphwatch.
///
/// Structural errors (`DriverNotConfigured`, `Connectivity`) indicate a
/// setup defect and are always returned to the caller directly; data-path
/// errors (`Query`, `Decode`) are captured into the failed branch of a
/// query's observable state instead.
///
/// All payloads are plain strings so the error can be cloned into a
/// `QueryState` snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphwatchError {
    #[error("driver not configured: no connection has been established in the registry")]
    DriverNotConfigured,

    #[error("connectivity verification failed: {0}")]
    Connectivity(String),

    #[error("query execution failed: {0}")]
    Query(String),

    #[error("result decode failed: {0}")]
    Decode(String),
}

impl GraphwatchError {
    /// True for configuration/connectivity faults, which callers must be
    /// able to tell apart from transient query failures.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphwatchError::DriverNotConfigured | GraphwatchError::Connectivity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphwatchError>;
