use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::AppError;
use crate::case::model::{TestCase, TestStatus};
use crate::config::{AppConfig, StorageBackend};
use crate::persistence::dynamo::DynamoStore;
use crate::persistence::memory::MemoryStore;
use crate::persistence::runs::RunOperations;
use crate::persistence::steps::StepOperations;
use crate::persistence::test_cases::TestCaseOperations;
use crate::run::model::{ExecutionRun, RunStatus};
use crate::step::model::Step;

/// Counter and tag adjustments applied to a run as one atomic write.
#[derive(Clone, Debug, Default)]
pub struct StatsDelta {
    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub tags: Vec<String>,
}

impl StatsDelta {
    pub fn test_started(tags: &[String]) -> Self {
        StatsDelta {
            total_tests: 1,
            tags: tags.to_vec(),
            ..StatsDelta::default()
        }
    }

    pub fn test_finished(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => StatsDelta {
                passed_tests: 1,
                ..StatsDelta::default()
            },
            TestStatus::Fail => StatsDelta {
                failed_tests: 1,
                ..StatsDelta::default()
            },
            TestStatus::Running | TestStatus::Skipped => StatsDelta::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tests == 0
            && self.passed_tests == 0
            && self.failed_tests == 0
            && self.tags.is_empty()
    }
}

/// Document-level operations shared by every storage backend. Each mutating
/// method is a single atomic write against one document, so callers never
/// need read-modify-write cycles for counters or tag sets.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn put_run(&self, run: ExecutionRun) -> Result<ExecutionRun, AppError>;
    async fn get_run(&self, id: &str) -> Result<Option<ExecutionRun>, AppError>;
    async fn find_run_by_code(&self, run_code: &str) -> Result<Option<ExecutionRun>, AppError>;
    async fn list_runs(&self, limit: i32) -> Result<Vec<ExecutionRun>, AppError>;
    async fn apply_run_stats(&self, run_id: &str, delta: StatsDelta) -> Result<(), AppError>;
    async fn seal_run(
        &self,
        run_id: &str,
        status: RunStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn put_test_case(&self, test_case: TestCase) -> Result<TestCase, AppError>;
    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>, AppError>;
    async fn list_test_cases(&self, run_id: &str) -> Result<Vec<TestCase>, AppError>;
    async fn fail_test_case(&self, id: &str, error: Option<String>) -> Result<(), AppError>;
    async fn seal_test_case(
        &self,
        id: &str,
        status: TestStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn put_step(&self, step: Step) -> Result<Step, AppError>;
    async fn list_steps(&self, test_case_id: &str) -> Result<Vec<Step>, AppError>;
}

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn ExecutionStore>,
}

impl Repository {
    pub async fn from_config(config: &AppConfig) -> Repository {
        match config.storage {
            StorageBackend::DynamoDb => {
                info!("using DynamoDB storage");
                Repository::dynamodb().await
            }
            StorageBackend::Memory => {
                warn!("using in-memory storage, data will not survive a restart");
                Repository::in_memory()
            }
        }
    }

    pub async fn dynamodb() -> Repository {
        Repository {
            store: Arc::new(DynamoStore::new().await),
        }
    }

    pub fn in_memory() -> Repository {
        Repository {
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn runs(&self) -> RunOperations {
        RunOperations {
            store: Arc::clone(&self.store),
        }
    }

    pub fn test_cases(&self) -> TestCaseOperations {
        TestCaseOperations {
            store: Arc::clone(&self.store),
        }
    }

    pub fn steps(&self) -> StepOperations {
        StepOperations {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_delta_counts_one_test_and_carries_tags() {
        let delta = StatsDelta::test_started(&["smoke".to_string(), "login".to_string()]);
        assert_eq!(delta.total_tests, 1);
        assert_eq!(delta.passed_tests, 0);
        assert_eq!(delta.failed_tests, 0);
        assert_eq!(delta.tags.len(), 2);
        assert!(!delta.is_empty());
    }

    #[test]
    fn finished_delta_maps_status_to_counter() {
        assert_eq!(StatsDelta::test_finished(TestStatus::Pass).passed_tests, 1);
        assert_eq!(StatsDelta::test_finished(TestStatus::Fail).failed_tests, 1);
        assert!(StatsDelta::test_finished(TestStatus::Running).is_empty());
        assert!(StatsDelta::test_finished(TestStatus::Skipped).is_empty());
    }
}
