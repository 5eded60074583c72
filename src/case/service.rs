use chrono::Utc;
use tracing::info;

use crate::api::AppError;
use crate::case::model::{TestCase, TestStatus, DEFAULT_TAG};
use crate::persistence::repo::{Repository, StatsDelta};

pub struct StartTestCaseCommand {
    pub run_identifier: String,
    pub test_case_id: Option<String>,
    pub name: String,
    pub tags: Option<Vec<String>>,
}

pub struct FinishTestCaseCommand {
    pub run_identifier: String,
    pub test_case_id: String,
    pub status: Option<TestStatus>,
}

/// Register a test case under a run and count it into the run totals. The
/// returned `None` means the run identifier resolved to nothing.
pub async fn start_test_case(
    repository: &Repository,
    command: StartTestCaseCommand,
) -> Result<Option<TestCase>, AppError> {
    let run = match repository.runs().resolve(&command.run_identifier).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let test_case = TestCase::builder()
        .maybe_id(command.test_case_id.filter(|id| !id.is_empty()))
        .run_id(run.id.clone())
        .name(command.name)
        .tags(normalize_tags(command.tags))
        .build();
    let test_case = repository.test_cases().create(test_case).await?;
    repository
        .runs()
        .apply_stats(&run.id, StatsDelta::test_started(&test_case.tags))
        .await?;
    info!("test case {} started in run {}", test_case.id, run.run_code);
    Ok(Some(test_case))
}

/// Seal a test case and move one run counter, PASS and FAIL being the only
/// statuses that count. The stored error is left untouched; it only ever
/// changes through step appends.
pub async fn finish_test_case(
    repository: &Repository,
    command: FinishTestCaseCommand,
) -> Result<Option<TestCase>, AppError> {
    let run = match repository.runs().resolve(&command.run_identifier).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let test_case = match repository.test_cases().get(&command.test_case_id).await? {
        Some(test_case) => test_case,
        None => return Ok(None),
    };
    let status = command.status.unwrap_or(TestStatus::Pass);
    let finished_at = Utc::now();
    repository
        .test_cases()
        .seal(&test_case.id, status, finished_at)
        .await?;
    repository
        .runs()
        .apply_stats(&run.id, StatsDelta::test_finished(status))
        .await?;
    info!("test case {} finished as {:?}", test_case.id, status);
    Ok(Some(TestCase {
        status,
        finished_at: Some(finished_at),
        ..test_case
    }))
}

pub fn normalize_tags(tags: Option<Vec<String>>) -> Vec<String> {
    match tags {
        Some(tags) if !tags.is_empty() => tags,
        _ => vec![DEFAULT_TAG.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::service::{start_run, StartRunCommand};

    async fn running_repo() -> (Repository, String) {
        let repository = Repository::in_memory();
        let run = start_run(
            &repository,
            StartRunCommand {
                id: None,
                browser: "chrome".to_string(),
                suite_name: None,
                environment: None,
                tags: vec![],
            },
        )
        .await
        .unwrap();
        (repository, run.id)
    }

    fn start_command(run_identifier: &str, name: &str, tags: Option<Vec<String>>) -> StartTestCaseCommand {
        StartTestCaseCommand {
            run_identifier: run_identifier.to_string(),
            test_case_id: None,
            name: name.to_string(),
            tags,
        }
    }

    #[test]
    fn missing_or_empty_tags_become_the_default_tag() {
        assert_eq!(normalize_tags(None), vec!["default".to_string()]);
        assert_eq!(normalize_tags(Some(vec![])), vec!["default".to_string()]);
        assert_eq!(
            normalize_tags(Some(vec!["smoke".to_string()])),
            vec!["smoke".to_string()]
        );
    }

    #[tokio::test]
    async fn starting_cases_counts_totals_and_unions_tags() {
        let (repository, run_id) = running_repo().await;

        start_test_case(
            &repository,
            start_command(&run_id, "a", Some(vec!["smoke".to_string()])),
        )
        .await
        .unwrap();
        start_test_case(
            &repository,
            start_command(&run_id, "b", Some(vec!["login".to_string()])),
        )
        .await
        .unwrap();
        start_test_case(
            &repository,
            start_command(
                &run_id,
                "c",
                Some(vec!["smoke".to_string(), "checkout".to_string()]),
            ),
        )
        .await
        .unwrap();

        let run = repository.runs().get(&run_id).await.unwrap().unwrap();
        assert_eq!(run.total_tests, 3);
        assert_eq!(run.passed_tests, 0);
        assert_eq!(run.failed_tests, 0);
        let mut tags: Vec<_> = run.tags.iter().cloned().collect();
        tags.sort();
        assert_eq!(tags, vec!["checkout", "login", "smoke"]);
    }

    #[tokio::test]
    async fn finishing_cases_moves_the_matching_counters() {
        let (repository, run_id) = running_repo().await;
        let mut ids = vec![];
        for name in ["a", "b", "c"] {
            let test_case = start_test_case(&repository, start_command(&run_id, name, None))
                .await
                .unwrap()
                .unwrap();
            ids.push(test_case.id);
        }

        for (id, status) in ids.iter().zip([TestStatus::Pass, TestStatus::Pass, TestStatus::Fail]) {
            finish_test_case(
                &repository,
                FinishTestCaseCommand {
                    run_identifier: run_id.clone(),
                    test_case_id: id.clone(),
                    status: Some(status),
                },
            )
            .await
            .unwrap();
        }

        let run = repository.runs().get(&run_id).await.unwrap().unwrap();
        assert_eq!(run.total_tests, 3);
        assert_eq!(run.passed_tests, 2);
        assert_eq!(run.failed_tests, 1);
    }

    #[tokio::test]
    async fn finishing_defaults_to_pass_and_records_the_finish_time() {
        let (repository, run_id) = running_repo().await;
        let test_case = start_test_case(&repository, start_command(&run_id, "quiet", None))
            .await
            .unwrap()
            .unwrap();

        let finished = finish_test_case(
            &repository,
            FinishTestCaseCommand {
                run_identifier: run_id.clone(),
                test_case_id: test_case.id.clone(),
                status: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(finished.status, TestStatus::Pass);
        assert!(finished.finished_at.is_some());

        let stored = repository
            .test_cases()
            .get(&test_case.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TestStatus::Pass);
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn statuses_other_than_pass_and_fail_leave_counters_alone() {
        let (repository, run_id) = running_repo().await;
        let test_case = start_test_case(&repository, start_command(&run_id, "skippy", None))
            .await
            .unwrap()
            .unwrap();

        finish_test_case(
            &repository,
            FinishTestCaseCommand {
                run_identifier: run_id.clone(),
                test_case_id: test_case.id.clone(),
                status: Some(TestStatus::Skipped),
            },
        )
        .await
        .unwrap();

        let run = repository.runs().get(&run_id).await.unwrap().unwrap();
        assert_eq!(run.total_tests, 1);
        assert_eq!(run.passed_tests, 0);
        assert_eq!(run.failed_tests, 0);
    }

    #[tokio::test]
    async fn starting_under_an_unknown_run_is_a_miss() {
        let repository = Repository::in_memory();
        let started = start_test_case(&repository, start_command("missing", "a", None))
            .await
            .unwrap();
        assert!(started.is_none());
    }

    #[tokio::test]
    async fn a_supplied_test_case_id_is_kept() {
        let (repository, run_id) = running_repo().await;
        let command = StartTestCaseCommand {
            run_identifier: run_id,
            test_case_id: Some("TCCUSTOM".to_string()),
            name: "supplied".to_string(),
            tags: None,
        };
        let test_case = start_test_case(&repository, command).await.unwrap().unwrap();
        assert_eq!(test_case.id, "TCCUSTOM");
        assert_eq!(test_case.tags, vec!["default".to_string()]);
    }
}
