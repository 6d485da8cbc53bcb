//! Read-only projections handed to the API layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{ExecutionRecord, ExecutionState, Outcome};
use super::work::Catalog;

/// Point-in-time counts for one execution. While the execution is running the
/// counts reflect partial progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub execution_id: String,
    pub state: ExecutionState,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_results: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl From<&ExecutionRecord> for StatusSummary {
    fn from(rec: &ExecutionRecord) -> Self {
        Self {
            execution_id: rec.id().to_string(),
            state: rec.state(),
            start_time: rec.start_time(),
            end_time: rec.end_time(),
            total_results: rec.results().len(),
            passed: rec.count(Outcome::Passed),
            failed: rec.count(Outcome::Failed),
            skipped: rec.count(Outcome::Skipped),
        }
    }
}

/// Static description of what can be run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInfo {
    /// Group name -> method names, in catalog order.
    pub groups: BTreeMap<String, Vec<String>>,
    pub total_groups: usize,
    pub total_subjects: usize,
}

impl From<&Catalog> for CatalogInfo {
    fn from(catalog: &Catalog) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for group in catalog.groups() {
            groups
                .entry(group.name.clone())
                .or_default()
                .extend(group.cases.iter().map(|c| c.method.clone()));
        }
        Self {
            total_groups: groups.len(),
            total_subjects: groups.values().map(Vec::len).sum(),
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::record::TestResult;
    use crate::tracker::work::{TestCase, TestGroup};

    #[test]
    fn test_summary_counts_partial_results() {
        let mut rec = ExecutionRecord::new("x");
        rec.push_result(TestResult::passed("A", "a", "ok", 1));
        rec.push_result(TestResult::new("A", "b", Outcome::Failed, "bad", 1));

        let summary = StatusSummary::from(&rec);
        assert_eq!(summary.state, ExecutionState::Running);
        assert_eq!(summary.total_results, 2);
        assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 0));
        assert!(summary.end_time.is_none());
    }

    #[test]
    fn test_catalog_info_for_builtin() {
        let info = CatalogInfo::from(&Catalog::builtin());
        assert_eq!(info.total_groups, 2);
        assert_eq!(info.total_subjects, 13);
        assert_eq!(info.groups["UserServiceTest"][0], "testGetAllUsers");
        assert_eq!(
            info.groups["UserResourceIT"].last().map(String::as_str),
            Some("testSearchByUsernameNotFound")
        );
    }

    #[test]
    fn test_catalog_info_merges_repeated_group_names() {
        let catalog = Catalog::new(vec![
            TestGroup::new("A", "A", vec![TestCase::new("one", "", 1)]),
            TestGroup::new("A", "A again", vec![TestCase::new("two", "", 1)]),
        ]);
        let info = CatalogInfo::from(&catalog);
        assert_eq!(info.total_groups, 1);
        assert_eq!(info.groups["A"], vec!["one", "two"]);
    }
}
