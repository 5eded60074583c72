use futures::future::join_all;
use serde::Serialize;

use crate::api::AppError;
use crate::case::model::TestCase;
use crate::persistence::repo::Repository;
use crate::run::model::ExecutionRun;
use crate::step::model::Step;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunTree {
    #[serde(flatten)]
    pub run: ExecutionRun,
    pub test_cases: Vec<TestCaseWithSteps>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseWithSteps {
    #[serde(flatten)]
    pub test_case: TestCase,
    pub steps: Vec<Step>,
}

/// Assemble the full tree for one run: the run document, its test cases in
/// start order and every case's steps in creation order. Test cases are
/// expanded concurrently, one steps query each.
pub async fn run_tree(
    repository: &Repository,
    identifier: &str,
) -> Result<Option<RunTree>, AppError> {
    let run = match repository.runs().resolve(identifier).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let mut test_cases = repository.test_cases().list_for_run(&run.id).await?;
    test_cases.sort_by(|left, right| left.created_at.cmp(&right.created_at));
    let expanded = join_all(
        test_cases
            .into_iter()
            .map(|test_case| attach_steps(repository, test_case)),
    )
    .await;
    let mut with_steps = Vec::with_capacity(expanded.len());
    for result in expanded {
        with_steps.push(result?);
    }
    Ok(Some(RunTree {
        run,
        test_cases: with_steps,
    }))
}

pub async fn test_case_with_steps(
    repository: &Repository,
    test_case_id: &str,
) -> Result<Option<TestCaseWithSteps>, AppError> {
    let test_case = match repository.test_cases().get(test_case_id).await? {
        Some(test_case) => test_case,
        None => return Ok(None),
    };
    Ok(Some(attach_steps(repository, test_case).await?))
}

async fn attach_steps(
    repository: &Repository,
    test_case: TestCase,
) -> Result<TestCaseWithSteps, AppError> {
    let mut steps = repository.steps().list_for_test_case(&test_case.id).await?;
    // stable sort, ties keep their stored order across reads
    steps.sort_by(|left, right| left.created_at.cmp(&right.created_at));
    Ok(TestCaseWithSteps { test_case, steps })
}
