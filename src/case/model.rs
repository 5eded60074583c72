use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident;
use crate::timefmt;

pub const DEFAULT_TAG: &str = "default";

#[derive(Serialize, Deserialize, Clone, Debug, Builder)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[builder(default = ident::short_id(ident::TEST_CASE_PREFIX))]
    pub id: String,
    /// Internal id of the owning run, never its public code.
    pub run_id: String,
    pub name: String,
    #[builder(default = vec![DEFAULT_TAG.to_string()])]
    pub tags: Vec<String>,
    #[builder(default = TestStatus::Running)]
    pub status: TestStatus,
    pub error: Option<String>,
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
pub enum TestStatus {
    Running,
    Pass,
    Fail,
    Skipped,
}

impl TestCase {
    pub fn has_failed(&self) -> bool {
        self.status == TestStatus::Fail
    }
}
