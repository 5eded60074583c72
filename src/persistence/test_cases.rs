use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::AppError;
use crate::case::model::{TestCase, TestStatus};
use crate::persistence::repo::ExecutionStore;

pub struct TestCaseOperations {
    pub(crate) store: Arc<dyn ExecutionStore>,
}

impl TestCaseOperations {
    pub async fn create(&self, test_case: TestCase) -> Result<TestCase, AppError> {
        self.store.put_test_case(test_case).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<TestCase>, AppError> {
        self.store.get_test_case(id).await
    }

    pub async fn list_for_run(&self, run_id: &str) -> Result<Vec<TestCase>, AppError> {
        self.store.list_test_cases(run_id).await
    }

    /// Sticky failure: the status moves to FAIL and an error message is
    /// recorded only when one is given, so a later bare failure never wipes
    /// an earlier message.
    pub async fn mark_failed(&self, id: &str, error: Option<String>) -> Result<(), AppError> {
        let error = error.filter(|message| !message.is_empty());
        self.store.fail_test_case(id, error).await
    }

    pub async fn seal(
        &self,
        id: &str,
        status: TestStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.store.seal_test_case(id, status, finished_at).await
    }
}

#[cfg(test)]
mod tests {
    use crate::case::model::{TestCase, TestStatus};
    use crate::persistence::repo::Repository;

    fn sample_case(id: &str) -> TestCase {
        TestCase::builder()
            .id(id.to_string())
            .run_id("run-1".to_string())
            .name("checkout".to_string())
            .build()
    }

    #[tokio::test]
    async fn mark_failed_keeps_the_existing_error_on_a_bare_failure() {
        let repository = Repository::in_memory();
        repository
            .test_cases()
            .create(sample_case("TC000001"))
            .await
            .unwrap();

        let test_cases = repository.test_cases();
        test_cases
            .mark_failed("TC000001", Some("assertion mismatch".to_string()))
            .await
            .unwrap();
        test_cases.mark_failed("TC000001", None).await.unwrap();
        test_cases
            .mark_failed("TC000001", Some(String::new()))
            .await
            .unwrap();

        let stored = test_cases.get("TC000001").await.unwrap().unwrap();
        assert_eq!(stored.status, TestStatus::Fail);
        assert_eq!(stored.error.as_deref(), Some("assertion mismatch"));
    }

    #[tokio::test]
    async fn mark_failed_replaces_the_error_when_a_new_one_is_given() {
        let repository = Repository::in_memory();
        repository
            .test_cases()
            .create(sample_case("TC000002"))
            .await
            .unwrap();

        let test_cases = repository.test_cases();
        test_cases
            .mark_failed("TC000002", Some("first".to_string()))
            .await
            .unwrap();
        test_cases
            .mark_failed("TC000002", Some("second".to_string()))
            .await
            .unwrap();

        let stored = test_cases.get("TC000002").await.unwrap().unwrap();
        assert_eq!(stored.error.as_deref(), Some("second"));
    }
}
