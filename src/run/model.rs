use std::collections::HashSet;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident;
use crate::timefmt;

#[derive(Serialize, Deserialize, Clone, Debug, Builder)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRun {
    #[builder(default = uuid::Uuid::new_v4().to_string())]
    pub id: String,
    /// Public short code shown in dashboards and accepted as a path alias.
    #[serde(rename = "runId")]
    #[builder(default = ident::run_code())]
    pub run_code: String,
    #[builder(default = "default".to_string())]
    pub suite_name: String,
    pub browser: String,
    #[builder(default = "local".to_string())]
    pub environment: String,
    #[serde(
        with = "serde_dynamo::string_set",
        skip_serializing_if = "HashSet::is_empty",
        default
    )]
    #[builder(default)]
    pub tags: HashSet<String>,
    #[builder(default = RunStatus::Running)]
    pub status: RunStatus,
    #[builder(default)]
    pub total_tests: u32,
    #[builder(default)]
    pub passed_tests: u32,
    #[builder(default)]
    pub failed_tests: u32,
    #[serde(with = "timefmt")]
    #[builder(default = Utc::now())]
    pub started_at: DateTime<Utc>,
    #[serde(with = "timefmt::option", default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(with = "timefmt")]
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Pass,
    Fail,
}

impl ExecutionRun {
    pub fn is_finished(&self) -> bool {
        self.status != RunStatus::Running
    }
}
