use chrono::Utc;
use tracing::info;

use crate::api::AppError;
use crate::persistence::repo::Repository;
use crate::run::model::{ExecutionRun, RunStatus};

pub struct StartRunCommand {
    pub id: Option<String>,
    pub browser: String,
    pub suite_name: Option<String>,
    pub environment: Option<String>,
    pub tags: Vec<String>,
}

/// Open a run. A caller-supplied identifier becomes the primary key
/// (last-writer-wins on reuse); the public code is always generated here.
pub async fn start_run(
    repository: &Repository,
    command: StartRunCommand,
) -> Result<ExecutionRun, AppError> {
    let run = ExecutionRun::builder()
        .maybe_id(command.id.filter(|id| !id.is_empty()))
        .browser(command.browser)
        .maybe_suite_name(command.suite_name.filter(|name| !name.is_empty()))
        .maybe_environment(command.environment.filter(|env| !env.is_empty()))
        .tags(command.tags.into_iter().collect())
        .build();
    info!("starting run {} on {}", run.run_code, run.browser);
    repository.runs().create(run).await
}

/// Seal a run. When the caller gives no final status it is derived from the
/// counters: any failed test marks the whole run as failed. Finishing is not
/// idempotent, a second call moves the finish time and recomputed status.
pub async fn finish_run(
    repository: &Repository,
    identifier: &str,
    status: Option<RunStatus>,
) -> Result<Option<ExecutionRun>, AppError> {
    let run = match repository.runs().resolve(identifier).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let status = status.unwrap_or(if run.failed_tests > 0 {
        RunStatus::Fail
    } else {
        RunStatus::Pass
    });
    let finished_at = Utc::now();
    repository.runs().seal(&run.id, status, finished_at).await?;
    info!("finished run {} as {:?}", run.run_code, status);
    Ok(Some(ExecutionRun {
        status,
        finished_at: Some(finished_at),
        ..run
    }))
}

pub async fn list_runs(repository: &Repository, limit: i32) -> Result<Vec<ExecutionRun>, AppError> {
    repository.runs().list(limit.max(1)).await
}
