use crate::api::AppError;
use crate::case::model::TestStatus;
use crate::case::service::{finish_test_case, FinishTestCaseCommand};
use crate::persistence::repo::Repository;
use crate::step::model::{Step, FAIL_STATUS};

pub struct AppendStepCommand {
    pub run_identifier: String,
    pub test_case_id: String,
    pub step_name: String,
    pub status: String,
    pub screenshot: Option<String>,
    pub error: Option<String>,
}

pub struct LogErrorCommand {
    pub run_identifier: String,
    pub test_case_id: String,
    pub step_name: Option<String>,
    pub error: Option<String>,
    pub screenshot: Option<String>,
}

/// Append an immutable step record. A FAIL step also drags its test case to
/// FAIL in a second write; the step is already durable if that write dies,
/// the case is then reconciled by the finish call.
pub async fn append_step(
    repository: &Repository,
    command: AppendStepCommand,
) -> Result<Option<Step>, AppError> {
    let run = match repository.runs().resolve(&command.run_identifier).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let test_case = match repository.test_cases().get(&command.test_case_id).await? {
        Some(test_case) => test_case,
        None => return Ok(None),
    };
    let step = Step::builder()
        .test_case_id(test_case.id.clone())
        .run_id(run.id.clone())
        .step_name(command.step_name)
        .status(command.status)
        .maybe_screenshot(command.screenshot.filter(|path| !path.is_empty()))
        .maybe_error(command.error.filter(|message| !message.is_empty()))
        .build();
    let step = repository.steps().create(step).await?;
    if step.is_fail() {
        repository
            .test_cases()
            .mark_failed(&test_case.id, step.error.clone())
            .await?;
    }
    Ok(Some(step))
}

/// Convenience failure report: one FAIL step, default name `Error`, then the
/// test case is finished as FAIL. Two operations in order, step first, so
/// the evidence survives even when the finish does not land.
pub async fn log_test_case_error(
    repository: &Repository,
    command: LogErrorCommand,
) -> Result<Option<Step>, AppError> {
    let step = match append_step(
        repository,
        AppendStepCommand {
            run_identifier: command.run_identifier.clone(),
            test_case_id: command.test_case_id.clone(),
            step_name: command
                .step_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Error".to_string()),
            status: FAIL_STATUS.to_string(),
            screenshot: command.screenshot,
            error: command.error,
        },
    )
    .await?
    {
        Some(step) => step,
        None => return Ok(None),
    };
    finish_test_case(
        repository,
        FinishTestCaseCommand {
            run_identifier: command.run_identifier,
            test_case_id: command.test_case_id,
            status: Some(TestStatus::Fail),
        },
    )
    .await?;
    Ok(Some(step))
}
