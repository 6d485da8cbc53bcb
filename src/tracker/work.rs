//! Test catalog, work units and the runner seam.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::record::{Outcome, TestResult};

/// One runnable test in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub method: String,
    pub message: String,
    /// Reported duration. The simulated runner also sleeps for this long (scaled).
    pub duration_ms: u64,
    #[serde(default = "default_outcome")]
    pub outcome: Outcome,
}

fn default_outcome() -> Outcome {
    Outcome::Passed
}

impl TestCase {
    pub fn new(method: impl Into<String>, message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            method: method.into(),
            message: message.into(),
            duration_ms,
            outcome: Outcome::Passed,
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// A test class and its methods, run as one step of a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestGroup {
    /// Class name, used as the result's `test_class`.
    pub name: String,
    /// Human label for progress lines ("UserService" -> "Running UserService tests...").
    pub label: String,
    pub cases: Vec<TestCase>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>, label: impl Into<String>, cases: Vec<TestCase>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            cases,
        }
    }
}

/// Static, ordered list of known test groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    groups: Vec<TestGroup>,
}

impl Catalog {
    pub fn new(groups: Vec<TestGroup>) -> Self {
        Self { groups }
    }

    /// The demo service's own suites: user service unit tests, then the REST
    /// integration tests.
    pub fn builtin() -> Self {
        Self::new(vec![
            TestGroup::new(
                "UserServiceTest",
                "UserService",
                vec![
                    TestCase::new("testGetAllUsers", "Successfully retrieved all users", 45),
                    TestCase::new("testCreateUser", "Successfully created new user", 32),
                    TestCase::new("testGetUserById", "Successfully retrieved user by ID", 28),
                    TestCase::new("testUpdateUser", "Successfully updated user", 41),
                    TestCase::new("testDeleteUser", "Successfully deleted user", 35),
                    TestCase::new("testFindByUsername", "Successfully found user by username", 29),
                ],
            ),
            TestGroup::new(
                "UserResourceIT",
                "Integration",
                vec![
                    TestCase::new("testHealthEndpoint", "Health endpoint responding correctly", 156),
                    TestCase::new("testGetAllUsers", "REST API returns all users", 203),
                    TestCase::new("testCreateUser", "REST API creates user successfully", 189),
                    TestCase::new("testGetUserById", "REST API retrieves user by ID", 145),
                    TestCase::new("testDeleteUser", "REST API deletes user successfully", 167),
                    TestCase::new("testSearchByUsername", "REST API searches by username", 134),
                    TestCase::new(
                        "testSearchByUsernameNotFound",
                        "REST API handles user not found",
                        98,
                    ),
                ],
            ),
        ])
    }

    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn total_subjects(&self) -> usize {
        self.groups.iter().map(|g| g.cases.len()).sum()
    }

    pub fn find(&self, test_class: &str, test_method: &str) -> Option<&TestCase> {
        self.groups
            .iter()
            .filter(|g| g.name == test_class)
            .flat_map(|g| g.cases.iter())
            .find(|c| c.method == test_method)
    }
}

/// What a single execution runs.
#[derive(Debug, Clone)]
pub enum WorkUnit {
    /// Every group of the catalog, in catalog order.
    Suite(Arc<Catalog>),
    /// One named test. The subject is not checked against any catalog.
    Single { test_class: String, case: TestCase },
}

impl WorkUnit {
    pub fn start_line(&self) -> String {
        match self {
            WorkUnit::Suite(_) => "Starting test execution...".to_string(),
            WorkUnit::Single { test_class, case } => {
                format!("Running specific test: {}.{}", test_class, case.method)
            }
        }
    }

    pub fn completion_line(&self) -> &'static str {
        match self {
            WorkUnit::Suite(_) => "All tests completed successfully!",
            WorkUnit::Single { .. } => "Test completed successfully!",
        }
    }

    pub fn failure_line(&self, reason: &str) -> String {
        match self {
            WorkUnit::Suite(_) => format!("Test execution failed: {}", reason),
            WorkUnit::Single { .. } => format!("Test failed: {}", reason),
        }
    }
}

impl std::fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkUnit::Suite(catalog) => write!(
                f,
                "suite({} groups, {} tests)",
                catalog.groups().len(),
                catalog.total_subjects()
            ),
            WorkUnit::Single { test_class, case } => write!(f, "{}.{}", test_class, case.method),
        }
    }
}

/// Executes one test case and reports its result.
#[async_trait::async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_case(&self, test_class: &str, case: &TestCase) -> Result<TestResult>;
}

/// Stand-in runner: waits for the case's duration (scaled) and reports the
/// outcome the catalog declares.
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
    time_scale: f64,
}

impl SimulatedRunner {
    /// `time_scale` multiplies every simulated wait; `0.0` disables waiting.
    pub fn new(time_scale: f64) -> Self {
        Self {
            time_scale: time_scale.max(0.0),
        }
    }

    fn delay_for(&self, case: &TestCase) -> Duration {
        Duration::from_secs_f64(case.duration_ms as f64 / 1000.0 * self.time_scale)
    }
}

impl Default for SimulatedRunner {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait::async_trait]
impl TestRunner for SimulatedRunner {
    async fn run_case(&self, test_class: &str, case: &TestCase) -> Result<TestResult> {
        let delay = self.delay_for(case);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::trace!(test_class, method = %case.method, outcome = %case.outcome, "simulated case finished");

        let result = TestResult::new(
            test_class,
            &case.method,
            case.outcome,
            &case.message,
            case.duration_ms,
        );
        Ok(match case.outcome {
            Outcome::Failed => result.with_stack_trace(format!(
                "AssertionError: {}\n\tat {}.{}",
                case.message, test_class, case.method
            )),
            _ => result,
        })
    }
}
