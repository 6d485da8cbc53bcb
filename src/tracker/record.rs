//! Execution record and per-test result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle state of a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Running,
    Completed,
    Failed,
}

impl ExecutionState {
    /// Completed and Failed are terminal; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionState::Running)
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::Running => write!(f, "RUNNING"),
            ExecutionState::Completed => write!(f, "COMPLETED"),
            ExecutionState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "PASSED"),
            Outcome::Failed => write!(f, "FAILED"),
            Outcome::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Result of a single test inside an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_class: String,
    pub test_method: String,
    pub outcome: Outcome,
    pub message: String,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl TestResult {
    pub fn new(
        test_class: impl Into<String>,
        test_method: impl Into<String>,
        outcome: Outcome,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            test_class: test_class.into(),
            test_method: test_method.into(),
            outcome,
            message: message.into(),
            duration_ms,
            recorded_at: Utc::now(),
            stack_trace: None,
        }
    }

    pub fn passed(
        test_class: impl Into<String>,
        test_method: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self::new(test_class, test_method, Outcome::Passed, message, duration_ms)
    }

    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Composite `Class.method` subject name.
    pub fn subject(&self) -> String {
        format!("{}.{}", self.test_class, self.test_method)
    }
}

/// Everything recorded about one execution.
///
/// Mutation goes through [`append_output`](Self::append_output),
/// [`push_result`](Self::push_result) and [`finish`](Self::finish), which keep
/// `end_time` set iff the state is terminal and freeze `results` once it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    id: String,
    state: ExecutionState,
    results: Vec<TestResult>,
    output: Vec<String>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ExecutionState::Running,
            results: Vec::new(),
            output: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Output is a log: it may grow after the terminal transition but never shrinks.
    pub fn append_output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Append a result. Returns `false` and drops the result if the record is terminal.
    pub fn push_result(&mut self, result: TestResult) -> bool {
        if self.is_terminal() {
            warn!(execution_id = %self.id, subject = %result.subject(), "result dropped after terminal state");
            return false;
        }
        self.results.push(result);
        true
    }

    /// Perform the single terminal transition. Returns `false` if the record
    /// was already terminal or `state` is not terminal.
    pub fn finish(&mut self, state: ExecutionState) -> bool {
        if self.is_terminal() || !state.is_terminal() {
            return false;
        }
        self.state = state;
        self.end_time = Some(Utc::now());
        true
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_running_without_end_time() {
        let rec = ExecutionRecord::new("abc");
        assert_eq!(rec.state(), ExecutionState::Running);
        assert!(rec.end_time().is_none());
        assert!(rec.results().is_empty());
        assert!(rec.output().is_empty());
    }

    #[test]
    fn test_finish_happens_once() {
        let mut rec = ExecutionRecord::new("abc");
        assert!(rec.finish(ExecutionState::Completed));
        let end = rec.end_time();
        assert!(end.is_some());

        assert!(!rec.finish(ExecutionState::Failed));
        assert_eq!(rec.state(), ExecutionState::Completed);
        assert_eq!(rec.end_time(), end);
    }

    #[test]
    fn test_finish_rejects_running() {
        let mut rec = ExecutionRecord::new("abc");
        assert!(!rec.finish(ExecutionState::Running));
        assert!(rec.end_time().is_none());
    }

    #[test]
    fn test_results_frozen_after_terminal() {
        let mut rec = ExecutionRecord::new("abc");
        assert!(rec.push_result(TestResult::passed("A", "one", "ok", 1)));
        rec.finish(ExecutionState::Failed);
        assert!(!rec.push_result(TestResult::passed("A", "two", "ok", 1)));
        assert_eq!(rec.results().len(), 1);

        // output stays appendable
        rec.append_output("late line");
        assert_eq!(rec.output().len(), 1);
    }

    #[test]
    fn test_subject_and_counts() {
        let mut rec = ExecutionRecord::new("abc");
        rec.push_result(TestResult::passed("Foo", "bar", "ok", 3));
        rec.push_result(TestResult::new("Foo", "baz", Outcome::Skipped, "skipped", 0));
        assert_eq!(rec.results()[0].subject(), "Foo.bar");
        assert_eq!(rec.count(Outcome::Passed), 1);
        assert_eq!(rec.count(Outcome::Skipped), 1);
        assert_eq!(rec.count(Outcome::Failed), 0);
    }

    #[test]
    fn test_serializes_camel_case_and_upper_states() {
        let mut rec = ExecutionRecord::new("abc");
        rec.push_result(TestResult::passed("Foo", "bar", "ok", 3));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["state"], "RUNNING");
        assert!(json["endTime"].is_null());
        assert!(json["startTime"].is_string());
        assert_eq!(json["results"][0]["testClass"], "Foo");
        assert_eq!(json["results"][0]["outcome"], "PASSED");
        assert_eq!(json["results"][0]["durationMs"], 3);
    }
}
