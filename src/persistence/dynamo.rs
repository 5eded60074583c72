use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::query::builders::QueryFluentBuilder;
use aws_sdk_dynamodb::operation::query::{QueryError, QueryOutput};
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemFluentBuilder;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_dynamo::aws_sdk_dynamodb_1::{to_attribute_value, to_item};
use serde_dynamo::{from_attribute_value, from_item};

use crate::api::AppError;
use crate::case::model::{TestCase, TestStatus};
use crate::persistence::repo::{ExecutionStore, StatsDelta};
use crate::run::model::{ExecutionRun, RunStatus};
use crate::step::model::Step;
use crate::timefmt;

const RUN_CODE_INDEX: &str = "runId-index";
const RUN_STARTED_INDEX: &str = "startedAt-index";
const CASE_RUN_INDEX: &str = "runId-index";
const STEP_CASE_INDEX: &str = "testCaseId-index";

// Single-partition GSI key for the global newest-first run listing.
const RUN_RECORD_TYPE: &str = "run";

pub(crate) struct QueryPage<T> {
    items: Vec<T>,
    last_key: Option<HashMap<String, AttributeValue>>,
}

pub(crate) trait Table<T>
where
    T: DeserializeOwned + Serialize + Clone,
{
    fn table_name() -> String;

    fn key_name() -> String {
        "id".to_string()
    }

    fn key(value: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(Self::key_name(), AttributeValue::S(value.to_string()))])
    }

    async fn get_item(client: Arc<Client>, key_value: &str) -> Result<Option<T>, AppError> {
        let result = client
            .get_item()
            .table_name(Self::table_name())
            .set_key(Some(Self::key(key_value)))
            .consistent_read(true)
            .send()
            .await;
        match result {
            Ok(output) => match output.item {
                Some(item_map) => match from_item(item_map) {
                    Ok(entity) => Ok(Some(entity)),
                    Err(err) => Err(AppError::Internal(err.to_string())),
                },
                None => Ok(None),
            },
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    async fn put_item(client: Arc<Client>, entity: T) -> Result<T, AppError> {
        let mut item = match to_item(entity.clone()) {
            Ok(item) => item,
            Err(err) => return Err(AppError::Internal(err.to_string())),
        };
        Self::add_index_key_attributes(&entity, &mut item);
        let result = client
            .put_item()
            .table_name(Self::table_name())
            .set_item(Some(item))
            .send()
            .await;
        match result {
            Ok(_) => Ok(entity),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    fn query_builder(client: Arc<Client>) -> QueryFluentBuilder {
        client.query().table_name(Self::table_name())
    }

    fn update_builder(client: Arc<Client>) -> UpdateItemFluentBuilder {
        client.update_item().table_name(Self::table_name())
    }

    fn from_query_result(
        result: Result<QueryOutput, SdkError<QueryError, HttpResponse>>,
    ) -> Result<QueryPage<T>, AppError> {
        match result {
            Ok(output) => {
                let mut items = vec![];
                for item in output.items.unwrap_or_default() {
                    match from_attribute_value(AttributeValue::M(item)) {
                        Ok(entity) => items.push(entity),
                        Err(err) => return Err(AppError::Internal(err.to_string())),
                    }
                }
                Ok(QueryPage {
                    items,
                    last_key: output.last_evaluated_key,
                })
            }
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    /// Query an equality GSI to exhaustion, following page keys.
    async fn query_index_all(
        client: Arc<Client>,
        index_name: &str,
        key_attribute: &str,
        key_value: &str,
    ) -> Result<Vec<T>, AppError> {
        let mut items: Vec<T> = vec![];
        let mut last_key = None;
        loop {
            let result = Self::query_builder(client.clone())
                .index_name(index_name)
                .expression_attribute_names("#pk", key_attribute)
                .expression_attribute_values(":pk", AttributeValue::S(key_value.to_string()))
                .key_condition_expression("#pk = :pk")
                .set_exclusive_start_key(last_key)
                .send()
                .await;
            let page = Self::from_query_result(result)?;
            items.extend(page.items);
            last_key = page.last_key;
            if last_key.is_none() {
                break;
            }
        }
        Ok(items)
    }

    fn add_index_key_attributes(_entity: &T, _item: &mut HashMap<String, AttributeValue>) {}
}

struct RunsTable();

impl Table<ExecutionRun> for RunsTable {
    fn table_name() -> String {
        "execution_runs".to_string()
    }

    fn add_index_key_attributes(
        _entity: &ExecutionRun,
        item: &mut HashMap<String, AttributeValue>,
    ) {
        item.insert(
            "recordType".to_string(),
            AttributeValue::S(RUN_RECORD_TYPE.to_string()),
        );
    }
}

struct TestCasesTable();

impl Table<TestCase> for TestCasesTable {
    fn table_name() -> String {
        "test_cases".to_string()
    }
}

struct StepsTable();

impl Table<Step> for StepsTable {
    fn table_name() -> String {
        "steps".to_string()
    }
}

pub struct DynamoStore {
    client: Arc<Client>,
}

impl DynamoStore {
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        DynamoStore {
            client: Arc::new(client),
        }
    }

    fn status_value<S: Serialize>(status: S) -> Result<AttributeValue, AppError> {
        to_attribute_value(status).map_err(|err| AppError::Internal(err.to_string()))
    }
}

#[async_trait]
impl ExecutionStore for DynamoStore {
    async fn put_run(&self, run: ExecutionRun) -> Result<ExecutionRun, AppError> {
        RunsTable::put_item(self.client.clone(), run).await
    }

    async fn get_run(&self, id: &str) -> Result<Option<ExecutionRun>, AppError> {
        RunsTable::get_item(self.client.clone(), id).await
    }

    async fn find_run_by_code(&self, run_code: &str) -> Result<Option<ExecutionRun>, AppError> {
        let result = RunsTable::query_builder(self.client.clone())
            .index_name(RUN_CODE_INDEX)
            .expression_attribute_names("#rc", "runId")
            .expression_attribute_values(":rc", AttributeValue::S(run_code.to_string()))
            .key_condition_expression("#rc = :rc")
            .limit(1)
            .send()
            .await;
        let page = RunsTable::from_query_result(result)?;
        Ok(page.items.into_iter().next())
    }

    async fn list_runs(&self, limit: i32) -> Result<Vec<ExecutionRun>, AppError> {
        let result = RunsTable::query_builder(self.client.clone())
            .index_name(RUN_STARTED_INDEX)
            .scan_index_forward(false)
            .expression_attribute_names("#rt", "recordType")
            .expression_attribute_values(":rt", AttributeValue::S(RUN_RECORD_TYPE.to_string()))
            .key_condition_expression("#rt = :rt")
            .limit(limit)
            .send()
            .await;
        Ok(RunsTable::from_query_result(result)?.items)
    }

    async fn apply_run_stats(&self, run_id: &str, delta: StatsDelta) -> Result<(), AppError> {
        let mut adds: Vec<&str> = vec![];
        let mut builder = RunsTable::update_builder(self.client.clone())
            .set_key(Some(RunsTable::key(run_id)));
        if delta.total_tests > 0 {
            adds.push("#tt :tt");
            builder = builder
                .expression_attribute_names("#tt", "totalTests")
                .expression_attribute_values(":tt", AttributeValue::N(delta.total_tests.to_string()));
        }
        if delta.passed_tests > 0 {
            adds.push("#pt :pt");
            builder = builder
                .expression_attribute_names("#pt", "passedTests")
                .expression_attribute_values(":pt", AttributeValue::N(delta.passed_tests.to_string()));
        }
        if delta.failed_tests > 0 {
            adds.push("#ft :ft");
            builder = builder
                .expression_attribute_names("#ft", "failedTests")
                .expression_attribute_values(":ft", AttributeValue::N(delta.failed_tests.to_string()));
        }
        if !delta.tags.is_empty() {
            adds.push("#tg :tg");
            builder = builder
                .expression_attribute_names("#tg", "tags")
                .expression_attribute_values(":tg", AttributeValue::Ss(delta.tags));
        }
        let result = builder
            .update_expression(format!("ADD {}", adds.join(", ")))
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    async fn seal_run(
        &self,
        run_id: &str,
        status: RunStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = RunsTable::update_builder(self.client.clone())
            .set_key(Some(RunsTable::key(run_id)))
            .expression_attribute_names("#fa", "finishedAt")
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(":s", Self::status_value(status)?)
            .expression_attribute_values(":fa", AttributeValue::S(timefmt::format(&finished_at)))
            .update_expression("SET #fa = :fa, #s = :s")
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    async fn put_test_case(&self, test_case: TestCase) -> Result<TestCase, AppError> {
        TestCasesTable::put_item(self.client.clone(), test_case).await
    }

    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>, AppError> {
        TestCasesTable::get_item(self.client.clone(), id).await
    }

    async fn list_test_cases(&self, run_id: &str) -> Result<Vec<TestCase>, AppError> {
        TestCasesTable::query_index_all(self.client.clone(), CASE_RUN_INDEX, "runId", run_id).await
    }

    async fn fail_test_case(&self, id: &str, error: Option<String>) -> Result<(), AppError> {
        let mut expression = "SET #s = :s".to_string();
        let mut builder = TestCasesTable::update_builder(self.client.clone())
            .set_key(Some(TestCasesTable::key(id)))
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(":s", Self::status_value(TestStatus::Fail)?);
        if let Some(message) = error {
            expression.push_str(", #er = :er");
            builder = builder
                .expression_attribute_names("#er", "error")
                .expression_attribute_values(":er", AttributeValue::S(message));
        }
        let result = builder.update_expression(expression).send().await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    async fn seal_test_case(
        &self,
        id: &str,
        status: TestStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = TestCasesTable::update_builder(self.client.clone())
            .set_key(Some(TestCasesTable::key(id)))
            .expression_attribute_names("#fa", "finishedAt")
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(":s", Self::status_value(status)?)
            .expression_attribute_values(":fa", AttributeValue::S(timefmt::format(&finished_at)))
            .update_expression("SET #fa = :fa, #s = :s")
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }

    async fn put_step(&self, step: Step) -> Result<Step, AppError> {
        StepsTable::put_item(self.client.clone(), step).await
    }

    async fn list_steps(&self, test_case_id: &str) -> Result<Vec<Step>, AppError> {
        StepsTable::query_index_all(self.client.clone(), STEP_CASE_INDEX, "testCaseId", test_case_id)
            .await
    }
}
