use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::api::AppError;
use crate::case::model::{TestCase, TestStatus};
use crate::persistence::repo::{ExecutionStore, StatsDelta};
use crate::run::model::{ExecutionRun, RunStatus};
use crate::step::model::Step;

/// Insertion-ordered in-memory backend for local development and tests.
/// Every mutation happens under one write guard, which gives the same
/// single-document atomicity the DynamoDB expressions do.
pub struct MemoryStore {
    runs: RwLock<Vec<ExecutionRun>>,
    test_cases: RwLock<Vec<TestCase>>,
    steps: RwLock<Vec<Step>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            runs: RwLock::new(vec![]),
            test_cases: RwLock::new(vec![]),
            steps: RwLock::new(vec![]),
        }
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn put_run(&self, run: ExecutionRun) -> Result<ExecutionRun, AppError> {
        let mut runs = self.runs.write().await;
        match runs.iter_mut().find(|existing| existing.id == run.id) {
            Some(existing) => *existing = run.clone(),
            None => runs.push(run.clone()),
        }
        Ok(run)
    }

    async fn get_run(&self, id: &str) -> Result<Option<ExecutionRun>, AppError> {
        let runs = self.runs.read().await;
        Ok(runs.iter().find(|run| run.id == id).cloned())
    }

    async fn find_run_by_code(&self, run_code: &str) -> Result<Option<ExecutionRun>, AppError> {
        let runs = self.runs.read().await;
        Ok(runs.iter().find(|run| run.run_code == run_code).cloned())
    }

    async fn list_runs(&self, limit: i32) -> Result<Vec<ExecutionRun>, AppError> {
        let mut runs = self.runs.read().await.clone();
        runs.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        runs.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(runs)
    }

    async fn apply_run_stats(&self, run_id: &str, delta: StatsDelta) -> Result<(), AppError> {
        let mut runs = self.runs.write().await;
        if let Some(run) = runs.iter_mut().find(|run| run.id == run_id) {
            run.total_tests += delta.total_tests;
            run.passed_tests += delta.passed_tests;
            run.failed_tests += delta.failed_tests;
            run.tags.extend(delta.tags);
        }
        Ok(())
    }

    async fn seal_run(
        &self,
        run_id: &str,
        status: RunStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut runs = self.runs.write().await;
        if let Some(run) = runs.iter_mut().find(|run| run.id == run_id) {
            run.status = status;
            run.finished_at = Some(finished_at);
        }
        Ok(())
    }

    async fn put_test_case(&self, test_case: TestCase) -> Result<TestCase, AppError> {
        let mut test_cases = self.test_cases.write().await;
        match test_cases
            .iter_mut()
            .find(|existing| existing.id == test_case.id)
        {
            Some(existing) => *existing = test_case.clone(),
            None => test_cases.push(test_case.clone()),
        }
        Ok(test_case)
    }

    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>, AppError> {
        let test_cases = self.test_cases.read().await;
        Ok(test_cases.iter().find(|test_case| test_case.id == id).cloned())
    }

    async fn list_test_cases(&self, run_id: &str) -> Result<Vec<TestCase>, AppError> {
        let test_cases = self.test_cases.read().await;
        Ok(test_cases
            .iter()
            .filter(|test_case| test_case.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn fail_test_case(&self, id: &str, error: Option<String>) -> Result<(), AppError> {
        let mut test_cases = self.test_cases.write().await;
        if let Some(test_case) = test_cases.iter_mut().find(|test_case| test_case.id == id) {
            test_case.status = TestStatus::Fail;
            if let Some(message) = error {
                test_case.error = Some(message);
            }
        }
        Ok(())
    }

    async fn seal_test_case(
        &self,
        id: &str,
        status: TestStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut test_cases = self.test_cases.write().await;
        if let Some(test_case) = test_cases.iter_mut().find(|test_case| test_case.id == id) {
            test_case.status = status;
            test_case.finished_at = Some(finished_at);
        }
        Ok(())
    }

    async fn put_step(&self, step: Step) -> Result<Step, AppError> {
        let mut steps = self.steps.write().await;
        steps.push(step.clone());
        Ok(step)
    }

    async fn list_steps(&self, test_case_id: &str) -> Result<Vec<Step>, AppError> {
        let steps = self.steps.read().await;
        Ok(steps
            .iter()
            .filter(|step| step.test_case_id == test_case_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run_started_at(id: &str, started_at: DateTime<Utc>) -> ExecutionRun {
        ExecutionRun::builder()
            .id(id.to_string())
            .browser("chrome".to_string())
            .started_at(started_at)
            .build()
    }

    #[tokio::test]
    async fn put_run_overwrites_by_id() {
        let store = MemoryStore::new();
        let first = ExecutionRun::builder()
            .id("run-1".to_string())
            .browser("chrome".to_string())
            .build();
        store.put_run(first).await.unwrap();

        let mut replacement = ExecutionRun::builder()
            .id("run-1".to_string())
            .browser("firefox".to_string())
            .build();
        replacement.total_tests = 5;
        store.put_run(replacement).await.unwrap();

        let runs = store.list_runs(10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].browser, "firefox");
        assert_eq!(runs[0].total_tests, 5);
    }

    #[tokio::test]
    async fn list_runs_returns_newest_first_up_to_the_limit() {
        let store = MemoryStore::new();
        for (id, hour) in [("old", 8), ("newest", 12), ("mid", 10)] {
            let started_at = Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap();
            store.put_run(run_started_at(id, started_at)).await.unwrap();
        }

        let runs = store.list_runs(2).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, "newest");
        assert_eq!(runs[1].id, "mid");
    }

    #[tokio::test]
    async fn stats_on_an_unknown_run_are_dropped() {
        let store = MemoryStore::new();
        store
            .apply_run_stats("ghost", StatsDelta::test_started(&[]))
            .await
            .unwrap();
        assert!(store.list_runs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_accumulate_counters_and_union_tags() {
        let store = MemoryStore::new();
        let run = run_started_at("run-1", Utc::now());
        store.put_run(run).await.unwrap();

        store
            .apply_run_stats(
                "run-1",
                StatsDelta {
                    total_tests: 1,
                    tags: vec!["smoke".to_string()],
                    ..StatsDelta::default()
                },
            )
            .await
            .unwrap();
        store
            .apply_run_stats(
                "run-1",
                StatsDelta {
                    total_tests: 1,
                    passed_tests: 1,
                    tags: vec!["smoke".to_string(), "login".to_string()],
                    ..StatsDelta::default()
                },
            )
            .await
            .unwrap();

        let stored = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(stored.total_tests, 2);
        assert_eq!(stored.passed_tests, 1);
        assert_eq!(stored.tags.len(), 2);
    }
}
