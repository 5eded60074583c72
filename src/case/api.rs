use crate::api::{required, ApiCreated, ApiResponse, AppError};
use crate::case::model::{TestCase, TestStatus};
use crate::case::service::{self, FinishTestCaseCommand, StartTestCaseCommand};
use crate::persistence::repo::Repository;
use crate::projection::{test_case_with_steps, TestCaseWithSteps};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTestCasePayload {
    pub test_case_id: Option<String>,
    pub test_name: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct FinishTestCasePayload {
    pub status: Option<TestStatus>,
}

pub async fn start_test_case(
    Path(run_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<StartTestCasePayload>,
) -> Result<ApiCreated<TestCase>, AppError> {
    let test_name = required(payload.test_name, "testName is required")?;
    let result = service::start_test_case(
        &repository,
        StartTestCaseCommand {
            run_identifier: run_id,
            test_case_id: payload.test_case_id,
            name: test_name,
            tags: payload.tags,
        },
    )
    .await;
    ApiCreated::from_option(result, "Run not found")
}

pub async fn finish_test_case(
    Path((run_id, test_case_id)): Path<(String, String)>,
    State(repository): State<Repository>,
    payload: Option<Json<FinishTestCasePayload>>,
) -> Result<ApiResponse<TestCase>, AppError> {
    let status = payload.and_then(|Json(body)| body.status);
    let result = service::finish_test_case(
        &repository,
        FinishTestCaseCommand {
            run_identifier: run_id,
            test_case_id,
            status,
        },
    )
    .await;
    ApiResponse::from_option(result, "Run or test case not found")
}

pub async fn get_test_case(
    Path(path_params): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<TestCaseWithSteps>, AppError> {
    // the run segment is routing context only, the case id stands alone
    let result = test_case_with_steps(&repository, &path_params.1).await;
    ApiResponse::from_option(result, "Test case not found")
}
