use crate::api::{required, ApiCreated, ApiResponse, AppError, AppState};
use crate::projection::{run_tree, RunTree};
use crate::run::model::{ExecutionRun, RunStatus};
use crate::run::service::{self, StartRunCommand};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunPayload {
    pub run_id: Option<String>,
    pub browser: Option<String>,
    pub suite_name: Option<String>,
    pub environment: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct FinishRunPayload {
    pub status: Option<RunStatus>,
}

#[derive(Deserialize)]
pub struct ListRunsParams {
    pub limit: Option<i32>,
}

pub async fn start_run(
    State(app_state): State<AppState>,
    Json(payload): Json<StartRunPayload>,
) -> Result<ApiCreated<ExecutionRun>, AppError> {
    let browser = required(payload.browser, "browser is required")?;
    let result = service::start_run(
        &app_state.repository,
        StartRunCommand {
            id: payload.run_id,
            browser,
            suite_name: payload.suite_name,
            environment: payload.environment,
            tags: payload.tags.unwrap_or_default(),
        },
    )
    .await;
    ApiCreated::from(result)
}

pub async fn finish_run(
    Path(run_id): Path<String>,
    State(app_state): State<AppState>,
    payload: Option<Json<FinishRunPayload>>,
) -> Result<ApiResponse<ExecutionRun>, AppError> {
    let status = payload.and_then(|Json(body)| body.status);
    let result = service::finish_run(&app_state.repository, &run_id, status).await;
    ApiResponse::from_option(result, "Run not found")
}

pub async fn get_run(
    Path(run_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<ApiResponse<RunTree>, AppError> {
    let result = run_tree(&app_state.repository, &run_id).await;
    ApiResponse::from_option(result, "Run not found")
}

pub async fn list_runs(
    Query(params): Query<ListRunsParams>,
    State(app_state): State<AppState>,
) -> Result<ApiResponse<Vec<ExecutionRun>>, AppError> {
    let result = service::list_runs(&app_state.repository, params.limit.unwrap_or(50)).await;
    ApiResponse::from(result)
}
