//! Background execution of work units.
//!
//! Each start call creates a RUNNING record, spawns one task that owns the
//! record for its lifetime and returns the id before any work happens.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::record::{ExecutionState, Outcome};
use super::store::{ExecutionHandle, ExecutionStore};
use super::work::{Catalog, TestCase, TestGroup, TestRunner, WorkUnit};
use super::TrackerError;

/// Schedules work units and drives their records to a terminal state.
#[derive(Clone)]
pub struct ExecutionEngine {
    store: ExecutionStore,
    runner: Arc<dyn TestRunner>,
}

impl ExecutionEngine {
    pub fn new(store: ExecutionStore, runner: Arc<dyn TestRunner>) -> Self {
        Self { store, runner }
    }

    pub fn store(&self) -> &ExecutionStore {
        &self.store
    }

    /// Run every group of `catalog`, in order.
    pub async fn start_all(&self, catalog: Arc<Catalog>) -> Result<String, TrackerError> {
        self.start(WorkUnit::Suite(catalog)).await
    }

    /// Run one test. Unknown subjects are run like any other.
    pub async fn start_one(&self, test_class: &str, case: TestCase) -> Result<String, TrackerError> {
        self.start(WorkUnit::Single {
            test_class: test_class.to_string(),
            case,
        })
        .await
    }

    /// Create the record and spawn its task. Never waits for the work itself.
    pub async fn start(&self, work: WorkUnit) -> Result<String, TrackerError> {
        let id = Uuid::new_v4().to_string();
        let handle = self.store.create(&id).await?;
        info!(execution_id = %id, work = %work, "execution started");

        let runner = Arc::clone(&self.runner);
        tokio::spawn(drive(id.clone(), handle, work, runner));
        Ok(id)
    }
}

/// Owns one execution: runs the work in a child task so that both errors and
/// panics end up recorded as FAILED.
#[instrument(skip(id, handle, work, runner), fields(execution_id = %id))]
async fn drive(id: String, handle: ExecutionHandle, work: WorkUnit, runner: Arc<dyn TestRunner>) {
    let child = tokio::spawn(execute(handle.clone(), work.clone(), runner));

    let failure = match child.await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("{:#}", e)),
        Err(e) => Some(describe_join_error(e)),
    };

    let (state, line) = match &failure {
        None => (ExecutionState::Completed, work.completion_line().to_string()),
        Some(reason) => (ExecutionState::Failed, work.failure_line(reason)),
    };

    let transitioned = handle
        .update(|rec| {
            let changed = rec.finish(state);
            rec.append_output(line);
            changed
        })
        .await;

    if !transitioned {
        warn!("execution already terminal; final transition skipped");
    }
    match failure {
        None => info!(%state, "execution completed"),
        Some(reason) => {
            let err = TrackerError::ExecutionFailure(reason);
            error!(%state, error = %err, "execution failed");
        }
    }
}

async fn execute(handle: ExecutionHandle, work: WorkUnit, runner: Arc<dyn TestRunner>) -> Result<()> {
    let start_line = work.start_line();
    handle.update(|rec| rec.append_output(start_line)).await;

    match &work {
        WorkUnit::Suite(catalog) => {
            for group in catalog.groups() {
                run_group(&handle, group, runner.as_ref()).await?;
            }
        }
        WorkUnit::Single { test_class, case } => {
            let result = runner.run_case(test_class, case).await?;
            handle.update(|rec| rec.push_result(result)).await;
        }
    }
    Ok(())
}

async fn run_group(handle: &ExecutionHandle, group: &TestGroup, runner: &dyn TestRunner) -> Result<()> {
    info!(group = %group.name, cases = group.cases.len(), "running group");
    handle
        .update(|rec| rec.append_output(format!("Running {} tests...", group.label)))
        .await;

    let (mut passed, mut failed) = (0usize, 0usize);
    for case in &group.cases {
        let result = runner.run_case(&group.name, case).await?;
        match result.outcome {
            Outcome::Passed => passed += 1,
            Outcome::Failed => failed += 1,
            Outcome::Skipped => {}
        }
        handle.update(|rec| rec.push_result(result)).await;
    }

    handle
        .update(|rec| {
            rec.append_output(format!(
                "{} tests: {} passed, {} failed",
                group.label, passed, failed
            ))
        })
        .await;
    info!(group = %group.name, passed, failed, "group finished");
    Ok(())
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic: <non-string payload>".to_string()
    }
}
