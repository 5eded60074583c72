use crate::api::{ApiCreated, AppError};
use crate::persistence::repo::Repository;
use crate::step::model::Step;
use crate::step::service::{self, AppendStepCommand, LogErrorCommand};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendStepPayload {
    pub step_name: Option<String>,
    pub status: Option<String>,
    pub screenshot: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogErrorPayload {
    pub step_name: Option<String>,
    pub error: Option<String>,
    pub screenshot: Option<String>,
}

pub async fn append_step(
    Path((run_id, test_case_id)): Path<(String, String)>,
    State(repository): State<Repository>,
    Json(payload): Json<AppendStepPayload>,
) -> Result<ApiCreated<Step>, AppError> {
    let (step_name, status) = match (payload.step_name, payload.status) {
        (Some(step_name), Some(status)) if !step_name.is_empty() && !status.is_empty() => {
            (step_name, status)
        }
        _ => {
            return Err(AppError::Validation(
                "stepName and status are required".to_string(),
            ))
        }
    };
    let result = service::append_step(
        &repository,
        AppendStepCommand {
            run_identifier: run_id,
            test_case_id,
            step_name,
            status,
            screenshot: payload.screenshot,
            error: payload.error,
        },
    )
    .await;
    ApiCreated::from_option(result, "Run or test case not found")
}

pub async fn log_test_case_error(
    Path((run_id, test_case_id)): Path<(String, String)>,
    State(repository): State<Repository>,
    payload: Option<Json<LogErrorPayload>>,
) -> Result<ApiCreated<Step>, AppError> {
    let (step_name, error, screenshot) = match payload {
        Some(Json(body)) => (body.step_name, body.error, body.screenshot),
        None => (None, None, None),
    };
    let result = service::log_test_case_error(
        &repository,
        LogErrorCommand {
            run_identifier: run_id,
            test_case_id,
            step_name,
            error,
            screenshot,
        },
    )
    .await;
    ApiCreated::from_option(result, "Run or test case not found")
}
