//! Asynchronous test execution tracker.
//!
//! A start call records a RUNNING execution, hands back its id and runs the
//! work on a background task. Callers poll by id until the record reaches
//! COMPLETED or FAILED.

pub mod engine;
pub mod query;
pub mod record;
pub mod service;
pub mod store;
pub mod work;

pub use engine::ExecutionEngine;
pub use query::{CatalogInfo, StatusSummary};
pub use record::{ExecutionRecord, ExecutionState, Outcome, TestResult};
pub use service::TestRunnerService;
pub use store::{ExecutionHandle, ExecutionStore};
pub use work::{Catalog, SimulatedRunner, TestCase, TestGroup, TestRunner, WorkUnit};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("test execution {0} not found")]
    NotFound(String),

    #[error("execution id {0} already exists")]
    DuplicateId(String),

    /// Raised inside a background task. Only ever recorded on the execution,
    /// never returned to a caller.
    #[error("execution failed: {0}")]
    ExecutionFailure(String),
}
