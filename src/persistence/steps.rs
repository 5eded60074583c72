use std::sync::Arc;

use crate::api::AppError;
use crate::persistence::repo::ExecutionStore;
use crate::step::model::Step;

pub struct StepOperations {
    pub(crate) store: Arc<dyn ExecutionStore>,
}

impl StepOperations {
    pub async fn create(&self, step: Step) -> Result<Step, AppError> {
        self.store.put_step(step).await
    }

    pub async fn list_for_test_case(&self, test_case_id: &str) -> Result<Vec<Step>, AppError> {
        self.store.list_steps(test_case_id).await
    }
}
