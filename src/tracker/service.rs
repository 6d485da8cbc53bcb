//! Facade the API layer and CLI talk to.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use super::engine::ExecutionEngine;
use super::query::{CatalogInfo, StatusSummary};
use super::record::ExecutionRecord;
use super::store::ExecutionStore;
use super::work::{Catalog, SimulatedRunner, TestCase, TestRunner};
use super::TrackerError;
use crate::config::RunnerConfig;

const SINGLE_TEST_MESSAGE: &str = "Test executed successfully";

/// Starts executions against a fixed catalog and answers queries about them.
#[derive(Clone)]
pub struct TestRunnerService {
    engine: ExecutionEngine,
    catalog: Arc<Catalog>,
    single_test_duration_ms: u64,
}

impl TestRunnerService {
    pub fn new(catalog: Catalog, runner: Arc<dyn TestRunner>) -> Self {
        Self {
            engine: ExecutionEngine::new(ExecutionStore::new(), runner),
            catalog: Arc::new(catalog),
            single_test_duration_ms: RunnerConfig::default().single_test_duration_ms,
        }
    }

    /// Built-in catalog with the simulated runner.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            Catalog::builtin(),
            Arc::new(SimulatedRunner::new(config.time_scale)),
        )
        .with_single_test_duration(config.single_test_duration_ms)
    }

    /// Duration reported for single tests that are not in the catalog.
    pub fn with_single_test_duration(mut self, duration_ms: u64) -> Self {
        self.single_test_duration_ms = duration_ms;
        self
    }

    pub async fn start_all(&self) -> Result<String, TrackerError> {
        self.engine.start_all(Arc::clone(&self.catalog)).await
    }

    /// Run `test_class.test_method`. Subjects missing from the catalog are not
    /// rejected; they run with a default message and duration.
    pub async fn start_one(&self, test_class: &str, test_method: &str) -> Result<String, TrackerError> {
        let case = match self.catalog.find(test_class, test_method) {
            Some(case) => case.clone(),
            None => {
                debug!(test_class, test_method, "subject not in catalog; running anyway");
                TestCase::new(test_method, SINGLE_TEST_MESSAGE, self.single_test_duration_ms)
            }
        };
        self.engine.start_one(test_class, case).await
    }

    pub async fn get_execution(&self, id: &str) -> Result<ExecutionRecord, TrackerError> {
        Ok(self.engine.store().get(id).await?.snapshot().await)
    }

    /// Snapshots of every execution, oldest first.
    pub async fn list_executions(&self) -> Vec<ExecutionRecord> {
        let handles = self.engine.store().list().await;
        let mut records = join_all(handles.iter().map(|h| h.snapshot())).await;
        records.sort_by_key(|r| r.start_time());
        records
    }

    pub async fn status_summary(&self, id: &str) -> Result<StatusSummary, TrackerError> {
        let rec = self.get_execution(id).await?;
        Ok(StatusSummary::from(&rec))
    }

    pub fn catalog_info(&self) -> CatalogInfo {
        CatalogInfo::from(self.catalog.as_ref())
    }

    /// Poll until the execution is terminal. Has no timeout of its own; wrap
    /// it in `tokio::time::timeout` when a bound is needed.
    pub async fn wait_until_terminal(
        &self,
        id: &str,
        poll_interval: Duration,
    ) -> Result<ExecutionRecord, TrackerError> {
        loop {
            let rec = self.get_execution(id).await?;
            if rec.is_terminal() {
                return Ok(rec);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::record::{ExecutionState, Outcome};

    fn service() -> TestRunnerService {
        TestRunnerService::new(Catalog::builtin(), Arc::new(SimulatedRunner::new(0.0)))
    }

    const POLL: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn test_unknown_subject_still_runs() {
        let svc = service();
        let id = svc.start_one("Foo", "bar").await.unwrap();
        let rec = svc.wait_until_terminal(&id, POLL).await.unwrap();

        assert_eq!(rec.state(), ExecutionState::Completed);
        assert_eq!(rec.results().len(), 1);
        let result = &rec.results()[0];
        assert_eq!(result.subject(), "Foo.bar");
        assert_eq!(result.outcome, Outcome::Passed);
        assert_eq!(result.message, SINGLE_TEST_MESSAGE);
        assert_eq!(result.duration_ms, 87);
    }

    #[tokio::test]
    async fn test_known_subject_uses_catalog_entry() {
        let svc = service();
        let id = svc
            .start_one("UserServiceTest", "testUpdateUser")
            .await
            .unwrap();
        let rec = svc.wait_until_terminal(&id, POLL).await.unwrap();
        assert_eq!(rec.results()[0].message, "Successfully updated user");
        assert_eq!(rec.results()[0].duration_ms, 41);
        assert_eq!(
            rec.output(),
            &[
                "Running specific test: UserServiceTest.testUpdateUser",
                "Test completed successfully!",
            ]
        );
    }

    #[tokio::test]
    async fn test_single_test_duration_override() {
        let svc = service().with_single_test_duration(5);
        let id = svc.start_one("Foo", "bar").await.unwrap();
        let rec = svc.wait_until_terminal(&id, POLL).await.unwrap();
        assert_eq!(rec.results()[0].duration_ms, 5);
    }

    #[tokio::test]
    async fn test_missing_execution_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.get_execution("nope").await,
            Err(TrackerError::NotFound(_))
        ));
        assert!(matches!(
            svc.status_summary("nope").await,
            Err(TrackerError::NotFound(_))
        ));
        assert!(matches!(
            svc.wait_until_terminal("nope", POLL).await,
            Err(TrackerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_oldest_first() {
        let svc = service();
        let first = svc.start_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = svc.start_one("A", "b").await.unwrap();

        let ids: Vec<_> = svc
            .list_executions()
            .await
            .into_iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_from_config_uses_builtin_catalog() {
        let svc = TestRunnerService::from_config(&RunnerConfig::default());
        assert_eq!(svc.catalog_info().total_subjects, 13);
    }
}
